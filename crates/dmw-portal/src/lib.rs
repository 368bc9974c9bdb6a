//! Direct Hire application workflow for the migrant-worker services portal.
//!
//! The crate carries the status checklist state machine, the document
//! requirement tracker that gates the `evaluated` milestone, the coordinator
//! gluing both to the portal collaborators, and the axum endpoints backing
//! those collaborators.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
