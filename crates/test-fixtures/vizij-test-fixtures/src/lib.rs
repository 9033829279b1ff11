use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    scenes: HashMap<String, SceneEntry>,
}

/// Flags controlling which fixtures a test run picks up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    /// When any fixture is isolated, only isolated (or `only`) fixtures run.
    pub isolate: bool,
    pub only: bool,
    /// Work in progress; never selected.
    pub pending: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SceneEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(flatten)]
        annotations: Annotations,
    },
}

impl SceneEntry {
    fn as_path(&self) -> &str {
        match self {
            SceneEntry::Path(path) => path,
            SceneEntry::Detailed { path, .. } => path,
        }
    }

    fn annotations(&self) -> Annotations {
        match self {
            SceneEntry::Path(_) => Annotations::default(),
            SceneEntry::Detailed { annotations, .. } => *annotations,
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Pick the fixtures a run should use, sorted by name.
///
/// Pending fixtures are dropped. If any remaining fixture is isolated, only
/// isolated and `only` fixtures are kept.
pub fn select<'a>(entries: impl IntoIterator<Item = (&'a str, Annotations)>) -> Vec<String> {
    let live: Vec<(&str, Annotations)> = entries.into_iter().filter(|(_, a)| !a.pending).collect();
    let isolating = live.iter().any(|(_, a)| a.isolate);
    let mut names: Vec<String> = live
        .into_iter()
        .filter(|(_, a)| !isolating || a.isolate || a.only)
        .map(|(name, _)| name.to_string())
        .collect();
    names.sort();
    names
}

pub mod scenes {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.scenes.keys().cloned().collect()
    }

    /// Fixtures selected for this run; see [`select`](super::select).
    pub fn runnable() -> Vec<String> {
        super::select(
            MANIFEST
                .scenes
                .iter()
                .map(|(name, entry)| (name.as_str(), entry.annotations())),
        )
    }

    pub fn annotations(name: &str) -> Result<Annotations> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        Ok(entry.annotations())
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        Ok(resolve_path(entry.as_path()))
    }

    /// Directory holding the scene fixtures, for fetchers that resolve relative URLs.
    pub fn dir() -> PathBuf {
        fixtures_root()
    }
}
