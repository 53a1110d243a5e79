//! Core types shared across the decision pipeline

pub mod decision;
pub mod error;
pub mod request;

pub use decision::{Decision, DecisionResult, DecisionSource, FastVerdict, Verdict};
pub use error::{WardenError, WardenResult};
pub use request::ToolRequest;
