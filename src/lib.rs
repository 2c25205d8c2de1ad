//! pullcdn - rewrite asset URLs in HTML so they are served by an origin-pull CDN.
//!
//! This library provides the core functionality for pullcdn, including:
//! - Settings file parsing, cascade discovery and environment overrides
//! - Site and upload-storage URL resolution
//! - Compiling the asset-reference pattern for a rewrite policy
//! - Single-pass rewriting of response bodies
//!
//! # Example
//!
//! ```
//! use pullcdn::rewrite::{Configuration, Mode, RewriterFactory, DEFAULT_EXTENSIONS};
//! use pullcdn::site::ConfiguredSite;
//!
//! let config = Configuration {
//!     cdn_host: "cdn.example.net".to_string(),
//!     mode: Mode::AllAssets,
//!     extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
//!     disabled: false,
//! };
//! let site = ConfiguredSite::new(Some("https://example.com".to_string()), None);
//!
//! let rewriter = RewriterFactory::build(&config, &site).unwrap().unwrap();
//! assert_eq!(
//!     rewriter.rewrite(r#"<img src="/logo.png">"#),
//!     r#"<img src="//cdn.example.net/logo.png">"#
//! );
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod rewrite;
pub mod site;

pub use error::{CdnError, Result};
