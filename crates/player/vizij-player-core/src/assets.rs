//! Asynchronous collaborators used while loading: document fetch and asset prefetch.

use std::path::{Path, PathBuf};

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value as JsonValue;

use crate::error::LoadError;

/// Prefetches everything a scene root needs before it can play.
///
/// The returned future resolves exactly once. It is polled on the player's
/// thread from `Player::poll_loads`, so it must not rely on being woken.
pub trait AssetLoader {
    fn load_assets_for(&self, root: &JsonValue) -> LocalBoxFuture<'static, Result<(), LoadError>>;
}

/// Loader for scenes with nothing to prefetch. Resolves immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetLoader for NoAssets {
    fn load_assets_for(&self, _root: &JsonValue) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        future::ready(Ok(())).boxed_local()
    }
}

/// Retrieves the text of a scene document by URL.
pub trait SceneFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<String, LoadError>>;
}

/// Resolves URLs as paths relative to a base directory.
///
/// A `file://` prefix is stripped; absolute paths ignore the base.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    base: PathBuf,
}

impl FileFetcher {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let rel = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(rel);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

impl SceneFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<String, LoadError>> {
        let path = self.resolve(url);
        let result = std::fs::read_to_string(&path).map_err(|e| LoadError::Fetch {
            url: url.to_string(),
            reason: format!("{}: {}", path.display(), e),
        });
        future::ready(result).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_assets_resolves_immediately() {
        let out = NoAssets
            .load_assets_for(&serde_json::json!({ "nodes": [] }))
            .now_or_never();
        assert_eq!(out, Some(Ok(())));
    }

    #[test]
    fn file_fetcher_resolves_relative_and_file_urls() {
        let fetcher = FileFetcher::new("/srv/scenes");
        assert_eq!(fetcher.resolve("a.json"), PathBuf::from("/srv/scenes/a.json"));
        assert_eq!(
            fetcher.resolve("file://nested/b.json"),
            PathBuf::from("/srv/scenes/nested/b.json")
        );
        assert_eq!(fetcher.resolve("/tmp/c.json"), PathBuf::from("/tmp/c.json"));
    }

    #[test]
    fn file_fetcher_reports_missing_files() {
        let fetcher = FileFetcher::new(env!("CARGO_MANIFEST_DIR"));
        let result = fetcher
            .fetch("does/not/exist.json")
            .now_or_never()
            .expect("file reads resolve immediately");
        match result {
            Err(LoadError::Fetch { url, .. }) => assert_eq!(url, "does/not/exist.json"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
