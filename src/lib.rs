//! route-planner
//!
//! Daily route planning for field-service technicians: a two-phase business
//! rule pipeline around an external routing solver, over a mutable
//! optimization snapshot.

pub mod config;
pub mod error;
pub mod feature_flags;
pub mod flag_client;
pub mod job;
pub mod labor;
pub mod logging;
pub mod params;
pub mod pipeline;
pub mod post;
pub mod repository;
pub mod result;
pub mod route;
pub mod rules;
pub mod solver;
pub mod state;
pub mod time;
pub mod traits;
pub mod work_event;

pub use config::{PipelineConfig, RuleSettings};
pub use error::PipelineError;
pub use job::{JobOutcome, OptimizationJob};
pub use pipeline::{OptimizationPipeline, PipelineOutput};
pub use result::{RuleExecutionResult, RuleId};
pub use state::OptimizationState;
