//! Realtime database REST client.
//!
//! Speaks the Firebase Realtime Database REST dialect:
//!
//! | operation | request |
//! |---|---|
//! | fetch | `GET {base}/{root}/{path}.json` |
//! | fetch one | `GET {base}/{root}/{path}/{id}.json` |
//! | push | `POST {base}/{root}/{path}.json` → `{"name": "<id>"}` |
//! | patch | `PATCH {base}/{root}/{path}/{id}.json` |
//! | remove | `DELETE {base}/{root}/{path}/{id}.json` |
//!
//! The auth token, when configured, is sent as the `auth` query parameter.
//! Subscriptions are served by one polling task per watched path that
//! publishes only when the collection actually changed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::StoreError;
use crate::backend::Backend;
use crate::config::StoreConfig;

/// Realtime database client.
#[derive(Clone)]
pub struct RealtimeDb {
    inner: Arc<RealtimeDbInner>,
}

struct RealtimeDbInner {
    client: Client,
    base_url: Url,
    root: Vec<String>,
    auth_token: Option<SecretString>,
    poll_interval: Duration,
    ready_timeout: Duration,
    /// One publisher per watched path, shared with its polling task.
    watchers: Mutex<HashMap<String, Arc<watch::Sender<Value>>>>,
}

impl std::fmt::Debug for RealtimeDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeDb")
            .field("base_url", &self.inner.base_url.as_str())
            .field("root", &self.inner.root)
            .field("auth_token", &self.inner.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("poll_interval", &self.inner.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Response to a push.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: Option<String>,
}

impl RealtimeDb {
    /// Create a client for the configured database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            inner: Arc::new(RealtimeDbInner {
                client,
                base_url: config.database_url.clone(),
                root: config.root_segments().map(str::to_owned).collect(),
                auth_token: config.auth_token.clone(),
                poll_interval: config.poll_interval,
                ready_timeout: config.ready_timeout,
                watchers: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Build the `.json` URL for a path below the root.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.inner.base_url.clone();
        let mut all: Vec<&str> = self.inner.root.iter().map(String::as_str).collect();
        all.extend(segments.iter().copied().filter(|s| !s.is_empty()));
        let last = all.pop().map_or_else(|| ".json".to_string(), |s| format!("{s}.json"));

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| StoreError::InvalidUrl(self.inner.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(all);
            path.push(&last);
        }

        if let Some(token) = &self.inner.auth_token {
            url.query_pairs_mut().append_pair("auth", token.expose_secret());
        }
        Ok(url)
    }

    async fn get(&self, segments: &[&str]) -> Result<Value, StoreError> {
        let response = self.inner.client.get(self.url(segments)?).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Spawn the task that keeps `sender` current until every receiver is gone.
    fn spawn_poller(&self, path: String, sender: Arc<watch::Sender<Value>>) {
        let db = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(db.inner.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial value is already published.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = sender.closed() => break,
                    _ = ticker.tick() => {}
                }

                match db.fetch(&path).await {
                    Ok(value) => {
                        let changed = sender.send_if_modified(|current| {
                            if *current == value {
                                false
                            } else {
                                *current = value;
                                true
                            }
                        });
                        if changed {
                            debug!(path = %path, "Collection changed");
                        }
                    }
                    Err(e) => warn!(path = %path, error = %e, "Failed to poll collection"),
                }
            }

            let mut watchers = db.inner.watchers.lock().await;
            if watchers.get(&path).is_some_and(|current| current.is_closed()) {
                watchers.remove(&path);
            }
            debug!(path = %path, "Stopped watching collection");
        });
    }
}

/// Turn non-success statuses into errors.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl Backend for RealtimeDb {
    #[instrument(skip(self))]
    async fn ready(&self) -> Result<(), StoreError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut().append_pair("shallow", "true");
        let probe = async {
            let response = self.inner.client.get(url).send().await?;
            check(response).await.map(|_| ())
        };

        match tokio::time::timeout(self.inner.ready_timeout, probe).await {
            Ok(Ok(())) => {
                info!("Realtime database is reachable");
                Ok(())
            }
            Ok(Err(e)) => Err(StoreError::NotReady(e.to_string())),
            Err(_) => Err(StoreError::NotReady(format!(
                "no answer within {}s",
                self.inner.ready_timeout.as_secs()
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn fetch(&self, path: &str) -> Result<Value, StoreError> {
        let value = self.get(&[path]).await?;
        debug!("Fetched collection");
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn fetch_one(&self, path: &str, id: &str) -> Result<Value, StoreError> {
        self.get(&[path, id]).await
    }

    #[instrument(skip(self, value))]
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let response = self
            .inner
            .client
            .post(self.url(&[path])?)
            .json(&value)
            .send()
            .await?;
        let pushed: PushResponse = check(response).await?.json().await?;
        let id = pushed
            .name
            .ok_or_else(|| StoreError::MissingKey(path.to_owned()))?;
        debug!(id = %id, "Entity created");
        Ok(id)
    }

    #[instrument(skip(self, value))]
    async fn patch(&self, path: &str, id: &str, value: Value) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .patch(self.url(&[path, id])?)
            .json(&value)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .delete(self.url(&[path, id])?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn watch(&self, path: &str) -> Result<watch::Receiver<Value>, StoreError> {
        let mut watchers = self.inner.watchers.lock().await;
        if let Some(sender) = watchers.get(path)
            && !sender.is_closed()
        {
            return Ok(sender.subscribe());
        }

        let initial = self.fetch(path).await?;
        let (sender, receiver) = watch::channel(initial);
        let sender = Arc::new(sender);
        watchers.insert(path.to_owned(), Arc::clone(&sender));
        self.spawn_poller(path.to_owned(), sender);
        debug!(interval_secs = self.inner.poll_interval.as_secs(), "Watching collection");
        Ok(receiver)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(root: &str, token: Option<&str>) -> StoreConfig {
        StoreConfig {
            database_url: Url::parse("https://shop-rtdb.firebaseio.com").unwrap(),
            auth_token: token.map(SecretString::from),
            root_path: root.to_string(),
            poll_interval: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    fn db(root: &str, token: Option<&str>) -> RealtimeDb {
        RealtimeDb::new(&config(root, token)).unwrap()
    }

    #[test]
    fn test_collection_url() {
        let url = db("", None).url(&["products"]).unwrap();
        assert_eq!(url.as_str(), "https://shop-rtdb.firebaseio.com/products.json");
    }

    #[test]
    fn test_entity_url_under_root_with_auth() {
        let url = db("tenants/panaderia", Some("tok")).url(&["recipes", "-Nabc"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop-rtdb.firebaseio.com/tenants/panaderia/recipes/-Nabc.json?auth=tok"
        );
    }

    #[test]
    fn test_root_url() {
        let url = db("", None).url(&[]).unwrap();
        assert_eq!(url.as_str(), "https://shop-rtdb.firebaseio.com/.json");
    }

    #[test]
    fn test_ids_are_percent_encoded() {
        let url = db("", None).url(&["products", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://shop-rtdb.firebaseio.com/products/a%20b%2Fc.json");
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug_output = format!("{:?}", db("", Some("very-secret-token")));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-secret-token"));
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        // Accepts a connection and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let mut config = config("", None);
        config.database_url = Url::parse(&format!("http://{addr}")).unwrap();
        config.request_timeout = Duration::from_secs(1);
        let db = RealtimeDb::new(&config).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), db.fetch("products"))
            .await
            .expect("request outlived its timeout");
        assert!(result.is_err());
        server.abort();
    }
}
