use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The environment a service instance has been deployed to.
///
/// Each variant fixes the acknowledgement message, the default listen port,
/// and whether the `PORT` environment variable is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Deployment {
    /// Started by hand on a developer machine. Always listens on port 4000.
    #[default]
    Local,

    /// Running inside a container image.
    Docker,

    /// Deployed by a Cloud Build trigger.
    CloudBuild,

    /// Running on Cloud Run, which injects `PORT`.
    CloudRun,
}

impl Deployment {
    /// All known deployment variants.
    pub const ALL: [Deployment; 4] = [
        Deployment::Local,
        Deployment::Docker,
        Deployment::CloudBuild,
        Deployment::CloudRun,
    ];

    /// Returns the variant name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::Local => "local",
            Deployment::Docker => "docker",
            Deployment::CloudBuild => "cloud-build",
            Deployment::CloudRun => "cloud-run",
        }
    }

    /// Port used when `PORT` is unset, invalid, or not honoured.
    pub fn default_port(&self) -> u16 {
        match self {
            Deployment::Local => 4000,
            Deployment::Docker | Deployment::CloudBuild | Deployment::CloudRun => 5000,
        }
    }

    /// Returns true if this variant takes its port from the `PORT` variable.
    pub fn reads_port_env(&self) -> bool {
        !matches!(self, Deployment::Local)
    }

    /// The fixed acknowledgement returned from `GET /`.
    pub fn message(&self) -> &'static str {
        match self {
            Deployment::Local => "API di test funzionante!",
            Deployment::Docker => "API di test funzionante su Docker!",
            Deployment::CloudBuild => "API di test deployata da Cloud Build!",
            Deployment::CloudRun => "API di test funzionante su Cloud Run!",
        }
    }
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a deployment name does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown deployment '{0}', expected one of: local, docker, cloud-build, cloud-run")]
pub struct ParseDeploymentError(pub String);

impl FromStr for Deployment {
    type Err = ParseDeploymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Deployment::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseDeploymentError(s.to_string()))
    }
}

/// JSON payload acknowledging that a deployment is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds the payload for the given deployment.
    pub fn for_deployment(deployment: Deployment) -> Self {
        Self::new(deployment.message())
    }
}
