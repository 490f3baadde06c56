use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bizrag::{AdapterKind, DocumentSource, Settings, SqliteCatalog};

pub mod index;
pub mod search;

/// A collection to operate on, named directly or through its adapter
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Adapter(AdapterKind),
    Collection(String),
}

impl Target {
    pub fn collection(&self) -> &str {
        match self {
            Self::Adapter(kind) => kind.collection(),
            Self::Collection(name) => name,
        }
    }
}

/// Collections selected by the index command flags; the general adapter when none given
pub fn index_targets(adapter: Option<AdapterKind>, collection: Option<String>, all: bool) -> Vec<Target> {
    if all {
        return AdapterKind::ALL.iter().copied().map(Target::Adapter).collect();
    }
    match (adapter, collection) {
        (Some(kind), _) => vec![Target::Adapter(kind)],
        (None, Some(name)) => vec![Target::Collection(name)],
        (None, None) => vec![Target::Adapter(AdapterKind::General)],
    }
}

pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Settings::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Settings::load().context("Failed to load settings"),
    }
}

/// Business database catalogue configured in `settings`
pub fn open_catalog(settings: &Settings) -> Arc<dyn DocumentSource> {
    Arc::new(SqliteCatalog::new(&settings.catalog_path))
}
