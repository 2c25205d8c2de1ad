//! Capturing response bodies and emitting the rewritten result.
//!
//! The rewriter itself only transforms text. This module is the boundary
//! around it: read a complete body, pass it through, write it out verbatim.

use crate::error::{CdnError, Result};
use crate::rewrite::Rewriter;
use std::borrow::Cow;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where a body is captured from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
	Stdin,
	File(PathBuf),
}

/// Where a rewritten body is emitted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyTarget {
	Stdout,
	File(PathBuf),
}

impl BodySource {
	pub fn name(&self) -> String {
		match self {
			BodySource::Stdin => "<stdin>".to_string(),
			BodySource::File(path) => path.display().to_string(),
		}
	}
}

impl BodyTarget {
	pub fn name(&self) -> String {
		match self {
			BodyTarget::Stdout => "<stdout>".to_string(),
			BodyTarget::File(path) => path.display().to_string(),
		}
	}
}

/// Read a complete body.
pub fn capture_body(source: &BodySource) -> Result<Vec<u8>> {
	let read_error = |source_err| CdnError::BodyReadError {
		source_name: source.name(),
		source: source_err,
	};

	match source {
		BodySource::Stdin => {
			let mut body = Vec::new();
			std::io::stdin()
				.lock()
				.read_to_end(&mut body)
				.map_err(read_error)?;
			Ok(body)
		}
		BodySource::File(path) => std::fs::read(path).map_err(read_error),
	}
}

/// Write a body out unchanged.
///
/// Files are replaced atomically: the body goes to a temporary file in the
/// same directory which is then renamed over the target.
pub fn emit_body(target: &BodyTarget, body: &[u8]) -> Result<()> {
	let write_error = |source| CdnError::BodyWriteError {
		target_name: target.name(),
		source,
	};

	match target {
		BodyTarget::Stdout => {
			let mut stdout = std::io::stdout().lock();
			stdout.write_all(body).map_err(write_error)?;
			stdout.flush().map_err(write_error)
		}
		BodyTarget::File(path) => {
			let dir = path
				.parent()
				.filter(|p| !p.as_os_str().is_empty())
				.unwrap_or(Path::new("."));
			let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
			tmp.write_all(body).map_err(write_error)?;
			tmp.as_file().sync_all().map_err(write_error)?;
			tmp.persist(path).map_err(|e| write_error(e.error))?;
			Ok(())
		}
	}
}

/// Run a captured body through the rewriter.
///
/// With no rewriter, or a body that is not UTF-8, the original bytes are
/// returned untouched.
pub fn filter_body(rewriter: Option<&Rewriter>, body: Vec<u8>, name: &str) -> Vec<u8> {
	let Some(rewriter) = rewriter else {
		return body;
	};

	match String::from_utf8(body) {
		Ok(text) => {
			let rewritten = match rewriter.rewrite(&text) {
				Cow::Owned(rewritten) => Some(rewritten),
				Cow::Borrowed(_) => None,
			};
			rewritten.unwrap_or(text).into_bytes()
		}
		Err(err) => {
			log::warn!("{} is not valid UTF-8, passing it through unchanged", name);
			err.into_bytes()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rewrite::{DEFAULT_EXTENSIONS, OriginScope};

	fn rewriter() -> Rewriter {
		let exts: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
		let scope = OriginScope::AllAssets {
			host: "example.com".to_string(),
		};
		Rewriter::new("cdn.example.net", &exts, scope).unwrap()
	}

	#[test]
	fn test_filter_body_rewrites() {
		let out = filter_body(Some(&rewriter()), br#"<img src="/a.png">"#.to_vec(), "test");
		assert_eq!(out, br#"<img src="//cdn.example.net/a.png">"#.to_vec());
	}

	#[test]
	fn test_filter_body_without_rewriter() {
		let body = br#"<img src="/a.png">"#.to_vec();
		assert_eq!(filter_body(None, body.clone(), "test"), body);
	}

	#[test]
	fn test_filter_body_invalid_utf8_passthrough() {
		let mut body = br#"<img src="/a.png">"#.to_vec();
		body.push(0xff);
		assert_eq!(filter_body(Some(&rewriter()), body.clone(), "test"), body);
	}

	#[test]
	fn test_capture_and_emit_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("page.html");
		let target = BodyTarget::File(path.clone());

		emit_body(&target, b"<p>hi</p>").unwrap();
		let body = capture_body(&BodySource::File(path)).unwrap();
		assert_eq!(body, b"<p>hi</p>");
	}

	#[test]
	fn test_emit_replaces_existing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("page.html");
		std::fs::write(&path, "<p>a much longer original body</p>").unwrap();

		emit_body(&BodyTarget::File(path.clone()), b"<p>new</p>").unwrap();
		assert_eq!(std::fs::read(&path).unwrap(), b"<p>new</p>");
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
	}

	#[test]
	fn test_emit_failure_leaves_no_partial_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing").join("page.html");

		match emit_body(&BodyTarget::File(path.clone()), b"<p>hi</p>") {
			Err(CdnError::BodyWriteError { target_name, .. }) => {
				assert_eq!(target_name, path.display().to_string());
			}
			other => panic!("Expected BodyWriteError, got {:?}", other),
		}
		assert!(!path.exists());
	}

	#[test]
	fn test_emit_over_directory_keeps_it() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join("page.html");
		std::fs::create_dir(&target).unwrap();
		std::fs::write(target.join("keep.txt"), "kept").unwrap();

		assert!(emit_body(&BodyTarget::File(target.clone()), b"<p>hi</p>").is_err());
		assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "kept");
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
	}

	#[test]
	fn test_capture_missing_file() {
		let source = BodySource::File(PathBuf::from("/nonexistent/page.html"));
		match capture_body(&source) {
			Err(CdnError::BodyReadError { source_name, .. }) => {
				assert_eq!(source_name, "/nonexistent/page.html");
			}
			other => panic!("Expected BodyReadError, got {:?}", other),
		}
	}
}
