//! Fast rule tier
//!
//! Static pattern classification of tool requests. This tier is pure and
//! synchronous: no filesystem, no network, constant time. It handles the
//! majority of requests so the cache and LLM tiers only see the ambiguous
//! remainder.

mod builtin;
mod matcher;

pub use builtin::{ALWAYS_ALLOW_TOOLS, BUILTIN_DENY_PATTERNS};
pub use matcher::{Classification, CustomRule, RuleMatcher};
