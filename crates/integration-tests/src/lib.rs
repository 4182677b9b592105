//! Integration tests for Costeo.
//!
//! # Running Tests
//!
//! ```bash
//! # Engine and in-memory store scenarios
//! cargo test -p costeo-integration-tests
//!
//! # Also run against a live realtime database (writes under a throwaway root)
//! COSTEO_TEST_DATABASE_URL=https://my-test-db.firebaseio.com \
//!     cargo test -p costeo-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `costing_scenarios` - Full derivations over the bakery fixture
//! - `store_memory` - Store operations and change propagation, in process
//! - `store_realtime` - The same operations against a live database

use costeo_store::{MemoryBackend, Store};
use serde_json::{Value, json};

/// A small bakery.
///
/// Collections deliberately mix both stored shapes (arrays and ID-keyed
/// objects). Overhead is 120 per month over three costed products, so each
/// carries 40:
///
/// | product | batch | direct | unit total | price | margin | status |
/// |---|---|---|---|---|---|---|
/// | Pan de campo | 20 | 26.00 | 3.30 | 4 | 17.5% | low margin (target 30) |
/// | Medialuna | 40 | 60.40 | 2.51 | 1 | -151% | loss |
/// | Torta | 8 | 36.20 | 9.525 | 30 | 68.25% | profitable (target 35) |
/// | Alfajor | - | - | - | 2 | - | no recipe |
/// | Dulce de leche | - | - | - | 5 | - | no recipe (input product) |
#[must_use]
pub fn bakery_document() -> Value {
    json!({
        "products": {
            "p-pan": {"name": "Pan de campo", "price": 4, "targetMargin": 30},
            "p-medialuna": {"name": "Medialuna", "price": 1, "targetMargin": 40},
            "p-torta": {"name": "Torta", "price": 30, "targetMargin": 35},
            "p-alfajor": {"name": "Alfajor", "price": 2},
            "p-dulce": {
                "name": "Dulce de leche", "price": 5, "cost": 3,
                "esInsumo": true, "unidadProduccion": "kg"
            },
            "p-viejo": {"name": "Pan viejo", "price": 1, "active": false}
        },
        "inputs": [
            {"id": "i-harina", "name": "Harina", "unit": "kg", "unitPrice": 1.2},
            {"id": "i-manteca", "name": "Manteca", "unit": "kg", "unitPrice": 8}
        ],
        "laborRoles": [
            {"id": "l-panadero", "name": "Panadero", "hourlyCost": 20},
            {"id": "l-pastelero", "name": "Pastelero", "hourlyCost": 25}
        ],
        "indirectCosts": {
            "c-alquiler": {"name": "Alquiler", "monthlyAmount": 90},
            "c-luz": {"name": "Luz", "monthlyAmount": 30, "prorationMethod": "hours"}
        },
        "recipes": {
            "r-pan": {
                "productId": "p-pan", "batchYield": 20,
                "inputs": [{"inputId": "i-harina", "quantity": 5}],
                "labor": [{"roleId": "l-panadero", "hours": 1}]
            },
            "r-medialuna": {
                "productId": "p-medialuna", "batchYield": 40,
                "inputs": [
                    {"inputId": "i-harina", "quantity": 2},
                    {"inputId": "i-manteca", "quantity": 1}
                ],
                "labor": [{"roleId": "l-pastelero", "hours": 2}]
            },
            "r-torta": {
                "productId": "p-torta", "batchYield": 8,
                "inputs": [
                    {"productId": "p-dulce", "quantity": 2, "inputType": "product"},
                    {"inputId": "i-harina", "quantity": 1},
                    {"inputId": "i-manteca", "quantity": 0.5}
                ],
                "labor": [{"roleId": "l-pastelero", "hours": 1}]
            },
            "r-torta-v0": {
                "productId": "p-torta", "batchYield": 1, "active": false,
                "inputs": [{"inputId": "i-manteca", "quantity": 10}]
            }
        }
    })
}

/// In-memory store seeded with [`bakery_document`].
///
/// # Panics
///
/// Panics if the fixture is not a valid document.
#[must_use]
pub fn bakery_store() -> Store<MemoryBackend> {
    let backend =
        MemoryBackend::from_document(bakery_document()).expect("bakery fixture is a valid document");
    Store::new(backend)
}

/// Live database URL for the ignored realtime tests.
#[must_use]
pub fn realtime_test_url() -> Option<String> {
    std::env::var("COSTEO_TEST_DATABASE_URL").ok()
}
