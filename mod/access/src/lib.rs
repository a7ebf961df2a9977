//! Access module — users, roles, permissions, JWT credentials.
//!
//! # Resources
//!
//! - **Permission** — atomic capability, identified by an
//!   `(action, subject)` pair
//! - **Role** — named, reusable bundle of permission references
//! - **User** — account with credentials and a set of role references
//!
//! Deleting a permission strips it from every role; deleting a role
//! strips it from every user. References are never validated lazily at
//! read time, so these cascades are the only thing keeping the graph
//! free of dangling ids.
//!
//! # Usage
//!
//! ```ignore
//! use access::{AccessModule, service::AccessConfig};
//!
//! let module = AccessModule::new(sql, AccessConfig::default())?;
//! let router = module.routes(); // serves /api/v1/...
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use warden_core::Module;

use crate::service::{AccessConfig, AccessService};

/// Access module implementing the Module trait.
///
/// Holds the AccessService and provides HTTP routes for all endpoints.
pub struct AccessModule {
    service: Arc<AccessService>,
}

impl AccessModule {
    /// Create a new AccessModule.
    pub fn new(
        sql: Arc<dyn warden_sql::SqlStore>,
        config: AccessConfig,
    ) -> Result<Self, warden_core::ServiceError> {
        let service = AccessService::new(sql, config)
            .map_err(warden_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AccessService.
    pub fn service(&self) -> &Arc<AccessService> {
        &self.service
    }
}

impl Module for AccessModule {
    fn name(&self) -> &str {
        "access"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
