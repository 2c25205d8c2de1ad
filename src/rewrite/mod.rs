//! Asset URL rewriting for pullcdn.
//!
//! This module handles:
//! - Rewrite policy: which origin references qualify (all assets or uploads only)
//! - Pattern compilation for quoted attribute-value asset URLs
//! - Single-pass substitution of CDN references over a response body

pub mod pattern;
pub mod policy;
pub mod rewriter;

pub use pattern::{AssetPattern, DEFAULT_EXTENSIONS, MatchedReference};
pub use policy::{Configuration, Mode, OriginScope};
pub use rewriter::{Rewriter, RewriterFactory, SharedRewriter};
