//! Runtime settings.
//!
//! Uses Figment to merge built-in defaults, an optional `bizrag.toml`,
//! `ERP_DB_PATH` and `BIZRAG_*` environment variables (later sources win).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bizrag.toml";

/// Which retrieval path the engine is allowed to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Vector search when the index opens, keyword matching otherwise
    Auto,
    /// Vector search only; failing to open the index is an error
    Vector,
    /// Keyword matching only; the index is never opened
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file holding every collection of the similarity index
    pub index_path: PathBuf,
    /// Business database with the `documents` catalogue table
    pub catalog_path: PathBuf,
    pub backend: BackendMode,
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Chunks written per index transaction
    pub batch_size: usize,
    pub excerpt_chars: usize,
    pub default_k: usize,
    /// Ceiling on neighbours requested from the index per query
    pub max_overfetch: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("vector_db/index.db"),
            catalog_path: PathBuf::from("project_data/erp.db"),
            backend: BackendMode::Auto,
            chunk_size: 500,
            batch_size: 100,
            excerpt_chars: 200,
            default_k: 3,
            max_overfetch: 20,
        }
    }
}

impl Settings {
    /// Load settings from `bizrag.toml` in the working directory (if present)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load settings using an explicit config file path
    pub fn load_from(config_file: &Path) -> Result<Self> {
        let settings = Self::figment(config_file).extract()?;
        Ok(settings)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_file))
            .merge(
                Env::raw()
                    .only(&["ERP_DB_PATH"])
                    .map(|_| "catalog_path".into()),
            )
            .merge(Env::prefixed("BIZRAG_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(settings.chunk_size, 500);
        assert_eq!(settings.batch_size, 100);
        assert_eq!(settings.default_k, 3);
        assert_eq!(settings.max_overfetch, 20);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bizrag.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "backend = \"keyword\"").unwrap();
        writeln!(file, "chunk_size = 320").unwrap();
        writeln!(file, "index_path = \"/var/lib/bizrag/index.db\"").unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.backend, BackendMode::Keyword);
        assert_eq!(settings.chunk_size, 320);
        assert_eq!(settings.index_path, PathBuf::from("/var/lib/bizrag/index.db"));
        assert_eq!(settings.excerpt_chars, 200);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bizrag.toml");
        std::fs::write(&path, "backend = \"elastic\"\n").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }
}
