//! toolwarden - fail-closed permission decisions for coding-agent tools
//!
//! Three-tier arbitration of tool-execution requests: static pattern
//! rules, a project-scoped persistent cache, and LLM arbitration as the
//! last resort. Every failure mode degrades toward deny, never toward a
//! silent allow.

pub mod core;

pub mod arbiter;
pub mod cache;
pub mod config;
pub mod policy;
pub mod project;
pub mod resolver;
pub mod rules;

// Process surface
pub mod cli;
pub mod hook;
pub mod logging;
