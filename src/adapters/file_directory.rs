use std::{
    collections::HashSet,
    ffi::OsString,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use eyre::{Context, Result};
use notify::{RecursiveMode, Watcher};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    config::models::{Domain, DomainResponse, Service},
    ports::directory::{
        DirectoryError, DirectoryResult, DirectoryWatch, DomainDirectory, ServiceDirectory,
    },
};

/// Domain files may hold the directory envelope or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum DomainPayload {
    List(Vec<Domain>),
    Envelope(DomainResponse),
}

/// Directory backed by local JSON files, optionally watched for changes.
pub struct FileDirectory {
    services_path: Option<PathBuf>,
    domains_path: Option<PathBuf>,
    // Kept alive for as long as the directory is; dropped watchers stop delivering events
    _watcher: Option<notify::RecommendedWatcher>,
    update_rx: std::sync::Mutex<Option<mpsc::Receiver<()>>>,
}

impl FileDirectory {
    /// Directory that reads the given files on every fetch, without watching them.
    pub fn new(services_path: Option<PathBuf>, domains_path: Option<PathBuf>) -> Self {
        Self {
            services_path,
            domains_path,
            _watcher: None,
            update_rx: std::sync::Mutex::new(None),
        }
    }

    /// Same as [`FileDirectory::new`], plus change notifications through [`DirectoryWatch`].
    pub fn watched(services_path: Option<PathBuf>, domains_path: Option<PathBuf>) -> Result<Self> {
        let mut directory = Self::new(services_path, domains_path);
        directory.init_watcher()?;
        Ok(directory)
    }

    fn init_watcher(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::channel(1);
        let paths: Vec<&PathBuf> = [&self.services_path, &self.domains_path]
            .into_iter()
            .flatten()
            .collect();

        let file_names: HashSet<OsString> = paths
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_owned()))
            .collect();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        if (event.kind.is_modify()
                            || event.kind.is_create()
                            || event.kind.is_remove())
                            && event.paths.iter().any(|p| {
                                p.file_name().is_some_and(|name| file_names.contains(name))
                            })
                        {
                            tracing::debug!("Directory file changed: {:?}", event.kind);
                            // Try to send update signal, ignore if channel full or closed
                            let _ = tx.try_send(());
                        }
                    }
                    Err(e) => tracing::error!("File watch error: {:?}", e),
                }
            })?;

        let mut watched_dirs = HashSet::new();
        for path in paths {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            if watched_dirs.insert(dir.to_path_buf()) {
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .wrap_err_with(|| format!("Failed to watch directory {}", dir.display()))?;
            }
        }

        self._watcher = Some(watcher);
        self.update_rx = std::sync::Mutex::new(Some(rx));
        Ok(())
    }

    async fn read(path: &Path) -> DirectoryResult<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

#[async_trait]
impl ServiceDirectory for FileDirectory {
    async fn fetch_services(&self) -> DirectoryResult<Vec<Service>> {
        let path = self
            .services_path
            .as_deref()
            .ok_or(DirectoryError::NotConfigured("services"))?;
        let raw = Self::read(path).await?;
        serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::Decode(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl DomainDirectory for FileDirectory {
    async fn fetch_domains(&self) -> DirectoryResult<DomainResponse> {
        let path = self
            .domains_path
            .as_deref()
            .ok_or(DirectoryError::NotConfigured("domains"))?;
        let raw = Self::read(path).await?;
        let payload: DomainPayload = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::Decode(format!("{}: {e}", path.display())))?;
        Ok(match payload {
            DomainPayload::List(list) => DomainResponse { list },
            DomainPayload::Envelope(response) => response,
        })
    }
}

impl DirectoryWatch for FileDirectory {
    fn watch(&self) -> Option<mpsc::Receiver<()>> {
        self.update_rx.lock().ok().and_then(|mut rx| rx.take())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write};

    use tempfile::tempdir;
    use tokio::time::{Duration, sleep};

    use super::*;

    fn write(path: &Path, content: &str) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())
    }

    #[tokio::test]
    async fn test_reads_both_domain_shapes() -> Result<()> {
        let dir = tempdir()?;
        let services = dir.path().join("services.json");
        let envelope = dir.path().join("domains.json");
        let bare = dir.path().join("domains-list.json");
        write(&services, r#"[{"name":"svc-a","namespace":"default"},{"name":"svc-b"}]"#)?;
        write(&envelope, r#"{"list":[{"name":"example.com"}]}"#)?;
        write(&bare, r#"[{"name":"example.org"}]"#)?;

        let directory = FileDirectory::new(Some(services), Some(envelope));
        let fetched = directory.fetch_services().await?;
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].metadata["namespace"], "default");
        assert_eq!(directory.fetch_domains().await?.list[0].name, "example.com");

        let directory = FileDirectory::new(None, Some(bare));
        assert_eq!(directory.fetch_domains().await?.list[0].name, "example.org");
        assert!(matches!(
            directory.fetch_services().await,
            Err(DirectoryError::NotConfigured("services"))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_decode_error() -> Result<()> {
        let dir = tempdir()?;
        let services = dir.path().join("services.json");
        write(&services, "{ not json")?;

        let directory = FileDirectory::new(Some(services), None);
        assert!(matches!(
            directory.fetch_services().await,
            Err(DirectoryError::Decode(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_signals_on_change() -> Result<()> {
        let dir = tempdir()?;
        let services = dir.path().join("services.json");
        write(&services, r#"[{"name":"svc-a"}]"#)?;

        let directory = FileDirectory::watched(Some(services.clone()), None)?;
        let mut rx = directory.watch().expect("first watch call yields a receiver");
        assert!(directory.watch().is_none());

        // Sleep briefly to ensure file system timestamp difference if needed
        sleep(Duration::from_millis(100)).await;
        write(&services, r#"[{"name":"svc-a"},{"name":"svc-b"}]"#)?;

        let notification = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(notification.is_ok(), "Timed out waiting for directory update");
        assert_eq!(directory.fetch_services().await?.len(), 2);
        Ok(())
    }
}
