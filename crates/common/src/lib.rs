//! Shared types for the deployment check service.

mod types;

pub use types::{Deployment, ParseDeploymentError, StatusMessage};
