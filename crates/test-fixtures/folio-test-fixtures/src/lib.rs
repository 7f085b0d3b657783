//! Shared trigger and scroll-scenario fixtures.
//!
//! Everything is listed in `fixtures/manifest.json` at the workspace root.
//! Names are manifest keys (`"about-me-reveal"`), never file paths.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../../../fixtures/manifest.json"))
        .expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    triggers: BTreeMap<String, PathBuf>,
    #[serde(default)]
    scenarios: BTreeMap<String, ScenarioEntry>,
}

/// A scenario drives one trigger fixture through a list of scroll positions.
#[derive(Debug, Deserialize)]
struct ScenarioEntry {
    path: PathBuf,
    trigger: String,
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Trigger,
    Scenario,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Trigger => "trigger",
            Kind::Scenario => "scenario",
        })
    }
}

fn locate(kind: Kind, name: &str) -> Result<PathBuf> {
    let rel = match kind {
        Kind::Trigger => MANIFEST.triggers.get(name),
        Kind::Scenario => MANIFEST.scenarios.get(name).map(|entry| &entry.path),
    }
    .ok_or_else(|| anyhow!("no {kind} fixture named '{name}'"))?;
    Ok(Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(rel))
}

fn read(kind: Kind, name: &str) -> Result<String> {
    let path = locate(kind, name)?;
    std::fs::read_to_string(&path)
        .with_context(|| format!("reading {kind} fixture '{name}' at {}", path.display()))
}

fn parse<T: DeserializeOwned>(kind: Kind, name: &str) -> Result<T> {
    let text = read(kind, name)?;
    serde_json::from_str(&text).with_context(|| format!("parsing {kind} fixture '{name}'"))
}

/// Serialized `AnimationTrigger` descriptions.
pub mod triggers {
    use super::*;

    /// Manifest keys in sorted order.
    pub fn keys() -> Vec<String> {
        MANIFEST.triggers.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read(Kind::Trigger, name)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        parse(Kind::Trigger, name)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        locate(Kind::Trigger, name)
    }
}

/// Scroll scenarios: host geometry plus the values expected at each scroll position.
pub mod scenarios {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.scenarios.keys().cloned().collect()
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        parse(Kind::Scenario, name)
    }

    /// Key of the trigger fixture the scenario drives.
    pub fn trigger(name: &str) -> Result<&'static str> {
        let entry = MANIFEST
            .scenarios
            .get(name)
            .ok_or_else(|| anyhow!("no {} fixture named '{name}'", Kind::Scenario))?;
        if !MANIFEST.triggers.contains_key(&entry.trigger) {
            bail!(
                "scenario '{name}' drives unknown trigger '{}'",
                entry.trigger
            );
        }
        Ok(entry.trigger.as_str())
    }
}
