use crate::error::Result;
use crate::rewrite::pattern::{AssetPattern, MatchedReference};
use crate::rewrite::policy::{Configuration, OriginScope};
use crate::site::Site;
use regex::Captures;
use std::borrow::Cow;
use std::sync::{Arc, RwLock};

/// An immutable, compiled rewriter for one configuration.
#[derive(Debug, Clone)]
pub struct Rewriter {
	pattern: AssetPattern,
	cdn_host: String,
	scope: OriginScope,
}

impl Rewriter {
	/// Compile a rewriter for an already-resolved scope.
	pub fn new(cdn_host: &str, extensions: &[String], scope: OriginScope) -> Result<Self> {
		let pattern = AssetPattern::compile(extensions, &scope)?;
		Ok(Rewriter {
			pattern,
			cdn_host: cdn_host.trim().to_string(),
			scope,
		})
	}

	pub fn cdn_host(&self) -> &str {
		&self.cdn_host
	}

	pub fn scope(&self) -> &OriginScope {
		&self.scope
	}

	pub fn pattern(&self) -> &AssetPattern {
		&self.pattern
	}

	/// Rewrite every qualifying asset reference in `body` in one pass.
	///
	/// Returns the input unchanged (borrowed) when nothing matched.
	pub fn rewrite<'h>(&self, body: &'h str) -> Cow<'h, str> {
		let mut count = 0usize;
		let rewritten = self.pattern.regex().replace_all(body, |caps: &Captures| {
			match self.pattern.reference(caps) {
				Some(reference) => {
					count += 1;
					self.cdn_reference(&reference)
				}
				None => caps[0].to_string(),
			}
		});
		log::debug!("rewrote {} asset reference(s) to {}", count, self.cdn_host);
		rewritten
	}

	/// `=<q>//<cdn-host><base-path>/<path>.<ext><query><q>`
	fn cdn_reference(&self, reference: &MatchedReference) -> String {
		let query = reference.query.unwrap_or("");
		format!(
			"={q}//{host}{base}/{path}.{ext}{query}{q}",
			q = reference.quote,
			host = self.cdn_host,
			base = self.scope.base_path(),
			path = reference.path,
			ext = reference.extension,
		)
	}
}

/// Builds rewriters from configuration plus site lookups.
#[derive(Debug, Default, Clone, Copy)]
pub struct RewriterFactory;

impl RewriterFactory {
	/// Build the rewriter for `config`.
	///
	/// `Ok(None)` means rewriting is switched off by configuration (no CDN
	/// host, no extensions, kill switch). Errors mean the configuration is
	/// broken and should be reported at load time.
	pub fn build(config: &Configuration, site: &dyn Site) -> Result<Option<Rewriter>> {
		if let Some(reason) = config.disabled_reason() {
			log::debug!("rewriting disabled: {}", reason);
			return Ok(None);
		}

		let scope = OriginScope::resolve(config.mode, site)?;
		let rewriter = Rewriter::new(&config.cdn_host, &config.extensions, scope)?;
		log::debug!(
			"rewriting {} references from {}{} to {}",
			config.mode.as_str(),
			rewriter.scope().host(),
			rewriter.scope().base_path(),
			rewriter.cdn_host()
		);
		Ok(Some(rewriter))
	}
}

/// A swappable handle to the active rewriter, shared between request handlers.
///
/// Callers take an `Arc` of the current rewriter for the duration of a pass,
/// so `reload` never affects a pass already in progress.
#[derive(Debug, Default)]
pub struct SharedRewriter {
	current: RwLock<Option<Arc<Rewriter>>>,
}

impl SharedRewriter {
	pub fn new(rewriter: Option<Rewriter>) -> Self {
		SharedRewriter {
			current: RwLock::new(rewriter.map(Arc::new)),
		}
	}

	/// The active rewriter, if rewriting is enabled.
	pub fn current(&self) -> Option<Arc<Rewriter>> {
		let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
		guard.clone()
	}

	/// Replace the active rewriter, returning the previous one.
	pub fn replace(&self, rewriter: Option<Rewriter>) -> Option<Arc<Rewriter>> {
		let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
		std::mem::replace(&mut *guard, rewriter.map(Arc::new))
	}

	/// Rebuild from `config` and swap it in.
	///
	/// On error the previous rewriter stays active.
	pub fn reload(&self, config: &Configuration, site: &dyn Site) -> Result<()> {
		let rewriter = RewriterFactory::build(config, site)?;
		self.replace(rewriter);
		Ok(())
	}

	/// Rewrite `body` with whichever rewriter is active; identity when disabled.
	pub fn rewrite(&self, body: &str) -> String {
		match self.current() {
			Some(rewriter) => rewriter.rewrite(body).into_owned(),
			None => body.to_string(),
		}
	}
}
