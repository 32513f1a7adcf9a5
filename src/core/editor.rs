//! Edit session wiring: directories in, hydrated form out.
//!
//! [`RouteEditor`] fetches both option lists concurrently, absorbs directory
//! failures into empty collections and re-runs hydration whenever the target
//! or a directory result changes. It performs no persistence; [`RouteEditor::submit`]
//! only produces the route payload.
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::{
    config::models::{DomainResponse, Route, Service},
    core::{
        identity::UidGenerator,
        submission::FormValues,
        transformer::{FormHandle, RouteForm},
        validation::ValidationResult,
    },
    ports::directory::{DomainDirectory, ServiceDirectory},
    tracing_setup::create_directory_span,
};

pub struct RouteEditor {
    services: Arc<dyn ServiceDirectory>,
    domains: Arc<dyn DomainDirectory>,
    form: RouteForm,
}

impl RouteEditor {
    pub fn new(
        services: Arc<dyn ServiceDirectory>,
        domains: Arc<dyn DomainDirectory>,
        uids: Arc<dyn UidGenerator>,
    ) -> Self {
        Self {
            services,
            domains,
            form: RouteForm::new(uids),
        }
    }

    /// Start editing `target`, or a new route when `None`.
    pub async fn open(&mut self, target: Option<Route>) {
        let (services, domains) = self.fetch_directories().await;
        self.form.hydrate(target, services, domains);
    }

    /// Re-fetch both directories and re-hydrate.
    pub async fn refresh_directories(&mut self) {
        let (services, domains) = self.fetch_directories().await;
        self.form.set_directories(services, domains);
    }

    /// Switch the edit target without re-fetching the directories.
    pub fn set_target(&mut self, target: Option<Route>) {
        self.form.set_target(target);
    }

    pub fn form(&self) -> &RouteForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RouteForm {
        &mut self.form
    }

    /// Validate and convert to the payload the persistence layer expects.
    pub fn submit(&mut self) -> ValidationResult<Route> {
        let values = self.form.validate_and_extract()?;
        Ok(values.into_route(self.form.target()))
    }

    /// Re-hydrate on every change signal until the channel closes.
    pub async fn follow<F>(&mut self, mut changes: mpsc::Receiver<()>, mut on_hydrate: F)
    where
        F: FnMut(&mut RouteForm),
    {
        while changes.recv().await.is_some() {
            tracing::info!("Directory change detected, re-hydrating route form");
            self.refresh_directories().await;
            on_hydrate(&mut self.form);
        }
    }

    async fn fetch_directories(&self) -> (Vec<Service>, DomainResponse) {
        tokio::join!(
            load_services(self.services.as_ref()),
            load_domains(self.domains.as_ref())
        )
    }
}

impl FormHandle for RouteEditor {
    fn reset(&mut self) {
        self.form.reset();
    }

    fn validate_and_extract(&mut self) -> ValidationResult<FormValues> {
        self.form.validate_and_extract()
    }
}

async fn load_services(directory: &dyn ServiceDirectory) -> Vec<Service> {
    match directory
        .fetch_services()
        .instrument(create_directory_span("services"))
        .await
    {
        Ok(services) => services,
        Err(e) => {
            tracing::warn!("Service directory unavailable, no service options: {}", e);
            Vec::new()
        }
    }
}

async fn load_domains(directory: &dyn DomainDirectory) -> DomainResponse {
    match directory
        .fetch_domains()
        .instrument(create_directory_span("domains"))
        .await
    {
        Ok(domains) => domains,
        Err(e) => {
            tracing::warn!("Domain directory unavailable, no domain options: {}", e);
            DomainResponse::default()
        }
    }
}
