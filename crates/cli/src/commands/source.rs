//! Where the data comes from: an exported file or the realtime database.

use std::ffi::OsStr;
use std::path::Path;

use costeo_store::{MemoryBackend, RealtimeDb, StoreConfig};
use serde_json::Value;
use tracing::info;

use super::CommandError;

/// Parse an export file. `.yaml`/`.yml` files are read as YAML, anything
/// else as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn read_document(path: &Path) -> Result<Value, CommandError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let document = match path.extension().and_then(OsStr::to_str) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(document)
}

/// In-memory backend seeded from an export file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a document of
/// collections.
pub async fn file_backend(path: &Path) -> Result<MemoryBackend, CommandError> {
    let document = read_document(path).await?;
    let backend = MemoryBackend::from_document(document)?;
    info!(path = %path.display(), "Loaded data from file");
    Ok(backend)
}

/// Realtime database client configured from the environment.
///
/// # Errors
///
/// Returns an error if the configuration is missing or invalid, or the HTTP
/// client cannot be built.
pub fn realtime_backend() -> Result<RealtimeDb, CommandError> {
    let config = StoreConfig::from_env()?;
    info!(url = %config.database_url, root = %config.root_path, "Using realtime database");
    Ok(RealtimeDb::new(&config)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use costeo_store::{Backend, Store};

    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("costeo-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_yaml_export_loads() {
        let path = temp_file(
            "export.yaml",
            "products:\n  p1:\n    name: Pan\n    price: 4\nlaborRoles:\n  - id: l1\n    name: Panadero\n    hourlyCost: 20\n",
        );
        let store = Store::new(file_backend(&path).await.unwrap());
        let snapshot = store.load_snapshot().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.labor_roles.len(), 1);
    }

    #[tokio::test]
    async fn test_json_export_loads() {
        let path = temp_file("export.json", r#"{"recipes": {"r1": {"productId": "p1", "batchYield": 2}}}"#);
        let backend = file_backend(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(backend.fetch("recipes").await.unwrap().get("r1").is_some());
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let result = read_document(Path::new("/nonexistent/costeo.json")).await;
        let err = result.unwrap_err();
        assert!(matches!(err, CommandError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/costeo.json"));
    }
}
