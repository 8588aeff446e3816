use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::CACHE_DB_FILENAME;

/// Overrides the directory holding downloaded embedding models.
pub const MODEL_DIR_ENV: &str = "REMARX_MODEL_DIR";

/// Overrides the directory holding the embedding cache database.
pub const CACHE_DIR_ENV: &str = "REMARX_CACHE_DIR";

const APP_DIR: &str = ".remarx";

/// Filesystem locations used by a remarx run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarxContext {
    model_cache_dir: PathBuf,
    cache_db_path: PathBuf,
    default_original_dir: PathBuf,
}

impl RemarxContext {
    /// Lay out every location under `home`, ignoring the environment.
    pub fn new(home: &Path) -> Self {
        let app_dir = home.join(APP_DIR);
        Self {
            model_cache_dir: app_dir.join("models"),
            cache_db_path: app_dir.join("cache").join(CACHE_DB_FILENAME),
            default_original_dir: home
                .join("remarx-data")
                .join("corpora")
                .join("original"),
        }
    }

    /// Resolve locations from the user's home directory, applying the
    /// `REMARX_MODEL_DIR` and `REMARX_CACHE_DIR` overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        let mut context = Self::new(&home);
        if let Some(dir) = std::env::var_os(MODEL_DIR_ENV) {
            context.model_cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
            context.cache_db_path = PathBuf::from(dir).join(CACHE_DB_FILENAME);
        }
        Ok(context)
    }

    #[must_use]
    pub fn with_model_cache_dir(mut self, dir: PathBuf) -> Self {
        self.model_cache_dir = dir;
        self
    }

    pub fn model_cache_dir(&self) -> &Path {
        &self.model_cache_dir
    }

    pub fn cache_db_path(&self) -> &Path {
        &self.cache_db_path
    }

    /// Original corpora searched when none are given on the command line.
    pub fn default_original_dir(&self) -> &Path {
        &self.default_original_dir
    }
}
