use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use crate::{
    config::models::{DomainResponse, Service},
    ports::directory::{
        DirectoryError, DirectoryResult, DirectoryWatch, DomainDirectory, ServiceDirectory,
    },
};

/// Directory fetched from the gateway console's HTTP endpoints.
pub struct HttpDirectory {
    client: Client,
    services_url: Option<String>,
    domains_url: Option<String>,
    update_rx: std::sync::Mutex<Option<mpsc::Receiver<()>>>,
}

impl HttpDirectory {
    pub fn new(services_url: Option<String>, domains_url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            services_url,
            domains_url,
            update_rx: std::sync::Mutex::new(None),
        }
    }

    /// Start a background task that polls both endpoints and signals through
    /// [`DirectoryWatch`] when either payload changes. Must run inside a tokio runtime.
    pub fn with_polling(self, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let client = self.client.clone();
        let urls: Vec<String> = [&self.services_url, &self.domains_url]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        tokio::spawn(async move {
            let mut last_hash: Option<u64> = None;
            let mut interval = tokio::time::interval(poll_interval);

            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }

                // Naive change detection: hash the raw bodies
                let mut hasher = DefaultHasher::new();
                let mut complete = true;
                for url in &urls {
                    match Self::fetch_text(&client, url).await {
                        Ok(body) => body.hash(&mut hasher),
                        Err(e) => {
                            tracing::warn!("Failed to poll directory {}: {}", url, e);
                            complete = false;
                        }
                    }
                }
                if !complete {
                    continue;
                }

                let new_hash = hasher.finish();
                if let Some(last) = last_hash {
                    if last != new_hash {
                        tracing::info!("Remote directory changed");
                        let _ = tx.try_send(());
                    }
                }
                last_hash = Some(new_hash);
            }
        });

        Self {
            update_rx: std::sync::Mutex::new(Some(rx)),
            ..self
        }
    }

    async fn fetch_text(client: &Client, url: &str) -> DirectoryResult<String> {
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("{url}: {e}")))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Option<&str>,
        directory: &'static str,
    ) -> DirectoryResult<T> {
        let url = url.ok_or(DirectoryError::NotConfigured(directory))?;
        let body = Self::fetch_text(&self.client, url).await?;
        serde_json::from_str(&body).map_err(|e| DirectoryError::Decode(format!("{url}: {e}")))
    }
}

#[async_trait]
impl ServiceDirectory for HttpDirectory {
    async fn fetch_services(&self) -> DirectoryResult<Vec<Service>> {
        self.fetch_json(self.services_url.as_deref(), "services")
            .await
    }
}

#[async_trait]
impl DomainDirectory for HttpDirectory {
    async fn fetch_domains(&self) -> DirectoryResult<DomainResponse> {
        self.fetch_json(self.domains_url.as_deref(), "domains").await
    }
}

impl DirectoryWatch for HttpDirectory {
    fn watch(&self) -> Option<mpsc::Receiver<()>> {
        self.update_rx.lock().ok().and_then(|mut rx| rx.take())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    async fn serve(app: Router) -> std::io::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Ok(format!("http://{addr}"))
    }

    #[tokio::test]
    async fn test_fetches_services_and_domains() -> eyre::Result<()> {
        let app = Router::new()
            .route(
                "/services",
                get(|| async { Json(json!([{ "name": "svc-a", "port": 80 }])) }),
            )
            .route(
                "/domains",
                get(|| async { Json(json!({ "list": [{ "name": "example.com" }] })) }),
            );
        let base = serve(app).await?;

        let directory = HttpDirectory::new(
            Some(format!("{base}/services")),
            Some(format!("{base}/domains")),
            Duration::from_secs(2),
        );

        let services = directory.fetch_services().await?;
        assert_eq!(services[0].name, "svc-a");
        assert_eq!(services[0].metadata["port"], 80);
        assert_eq!(directory.fetch_domains().await?.list.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_reported() -> eyre::Result<()> {
        let app = Router::new().route(
            "/services",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(app).await?;

        let directory = HttpDirectory::new(Some(format!("{base}/services")), None, Duration::from_secs(2));
        assert!(matches!(
            directory.fetch_services().await,
            Err(DirectoryError::Status { status: 503, .. })
        ));
        assert!(matches!(
            directory.fetch_domains().await,
            Err(DirectoryError::NotConfigured("domains"))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_polling_signals_change() -> eyre::Result<()> {
        let state = Arc::new(Mutex::new(json!([{ "name": "svc-a" }])));
        let shared = state.clone();
        let app = Router::new().route(
            "/services",
            get(move || {
                let body: Value = shared.lock().unwrap().clone();
                async move { Json(body) }
            }),
        );
        let base = serve(app).await?;

        let directory = HttpDirectory::new(Some(format!("{base}/services")), None, Duration::from_secs(2))
            .with_polling(Duration::from_millis(100));
        let mut rx = directory.watch().expect("polling directory yields a receiver");

        // Wait for the background task to perform its initial fetch
        tokio::time::sleep(Duration::from_millis(250)).await;
        *state.lock().unwrap() = json!([{ "name": "svc-a" }, { "name": "svc-b" }]);

        let notification = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(notification.is_ok(), "Timed out waiting for directory update");
        assert_eq!(directory.fetch_services().await?.len(), 2);
        Ok(())
    }
}
