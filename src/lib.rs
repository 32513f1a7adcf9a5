//! Route editor - the authoring model behind a gateway route form.
//!
//! A gateway route binds one or more domains to a target service behind a
//! conjunction of predicates (path, HTTP method, header values, query values).
//! This crate implements the editing side of such a route:
//!
//! - **Hydration**: turning a persisted [`Route`](config::Route) into an
//!   editable [`RouteFormState`](core::RouteFormState), with option lists
//!   built from the service and domain directories.
//! - **Row identity**: every header/query predicate row carries a
//!   [`RowUid`](core::RowUid) minted by an injectable
//!   [`UidGenerator`](core::UidGenerator), so add/remove/reorder never mixes up rows.
//! - **Validation**: a submit pass that reports every failing field at once,
//!   and the conversion of the validated values back to a route payload.
//!
//! Evaluating predicates against live traffic and persisting routes are out of
//! scope; the crate only produces a validated, submission-ready record.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use route_editor::{
//!     adapters::StaticDirectory,
//!     config::{Domain, Service},
//!     core::{RouteEditor, SequentialUidGenerator},
//! };
//!
//! # #[tokio::main] async fn main() {
//! let directory = Arc::new(StaticDirectory::new(
//!     vec![Service::named("user-svc")],
//!     vec![Domain::named("example.com")],
//! ));
//! let mut editor = RouteEditor::new(
//!     directory.clone(),
//!     directory,
//!     Arc::new(SequentialUidGenerator::new()),
//! );
//! editor.open(None).await;
//! editor
//!     .form_mut()
//!     .edit(|state| state.name = "user-default".to_string())
//!     .unwrap();
//! // Missing domain, path and service are all reported together.
//! assert!(editor.submit().is_err());
//! # }
//! ```
//!
//! # Architecture
//! Directory lookups are **ports** (traits in [`ports`]) with file, HTTP and
//! in-memory **adapters**. The transform and validation logic lives in
//! [`core`] and performs no I/O.
//!
//! # Error Handling
//! Domain errors are `thiserror` enums ([`core::ValidationError`],
//! [`core::SessionError`], [`ports::DirectoryError`]); loaders and the binary
//! use `eyre::Result` with context attached.
pub mod config;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{FileDirectory, HttpDirectory, StaticDirectory},
    core::{FormHandle, RouteEditor, RouteForm},
    ports::{DomainDirectory, ServiceDirectory},
};
