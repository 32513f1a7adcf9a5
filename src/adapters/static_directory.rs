use async_trait::async_trait;

use crate::{
    config::models::{Domain, DomainResponse, Service},
    ports::directory::{DirectoryError, DirectoryResult, DomainDirectory, ServiceDirectory},
};

/// In-memory directory, for embedding hosts that already hold the lists.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    services: Vec<Service>,
    domains: Vec<Domain>,
    unavailable: bool,
}

impl StaticDirectory {
    pub fn new(services: Vec<Service>, domains: Vec<Domain>) -> Self {
        Self {
            services,
            domains,
            unavailable: false,
        }
    }

    /// A directory whose every lookup fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn check(&self) -> DirectoryResult<()> {
        if self.unavailable {
            return Err(DirectoryError::Unavailable(
                "static directory is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceDirectory for StaticDirectory {
    async fn fetch_services(&self) -> DirectoryResult<Vec<Service>> {
        self.check()?;
        Ok(self.services.clone())
    }
}

#[async_trait]
impl DomainDirectory for StaticDirectory {
    async fn fetch_domains(&self) -> DirectoryResult<DomainResponse> {
        self.check()?;
        Ok(DomainResponse {
            list: self.domains.clone(),
        })
    }
}
