//! Error taxonomy for the planner.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::post::PostOptimizationRule;
use crate::result::RuleId;

/// Raised by the data resolver when an office/date cannot be optimized.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no routes found for office {office_id} on {date}")]
    NoRoutes { office_id: i64, date: NaiveDate },

    #[error("no service pro found for office {office_id} on {date}")]
    NoServicePro { office_id: i64, date: NaiveDate },

    #[error("no appointments found for office {office_id} on {date}")]
    NoAppointments { office_id: i64, date: NaiveDate },

    #[error("routes of office {office_id} on {date} have no capacity")]
    NoCapacity { office_id: i64, date: NaiveDate },

    #[error("crm request failed: {0}")]
    Crm(String),
}

impl ResolveError {
    /// Data-availability faults end the run without an operational alert.
    pub fn is_data_availability(&self) -> bool {
        !matches!(self, ResolveError::Crm(_))
    }
}

#[derive(Debug, Error)]
pub enum FeatureFlagError {
    #[error("feature flag request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feature flag service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    FeatureFlag(#[from] FeatureFlagError),

    #[error("invalid rule setting: {0}")]
    InvalidSetting(String),

    #[error("{service} failed: {message}")]
    Collaborator {
        service: &'static str,
        message: String,
    },
}

impl RuleError {
    pub fn collaborator(service: &'static str, message: impl Into<String>) -> Self {
        RuleError::Collaborator {
            service,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("solver failed: {0}")]
pub struct SolverError(pub String);

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("crm record {0} not found")]
    NotFound(i64),

    #[error("crm request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum CasterError {
    #[error(transparent)]
    Crm(#[from] CrmError),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("optimization state {0} not found")]
    NotFound(Uuid),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced by the orchestrator and the job boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("rule {rule} failed: {source}")]
    Rule {
        rule: RuleId,
        #[source]
        source: RuleError,
    },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("post rule {rule:?} failed: {source}")]
    Caster {
        rule: PostOptimizationRule,
        #[source]
        source: CasterError,
    },

    #[error(transparent)]
    FeatureFlag(#[from] FeatureFlagError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("invalid optimization state: {0}")]
    InvalidState(String),
}

impl PipelineError {
    pub fn is_data_availability(&self) -> bool {
        matches!(self, PipelineError::Resolve(err) if err.is_data_availability())
    }
}
