use std::path::PathBuf;

use importer_core::FailurePolicy;

use crate::fetch::FetchSettings;

pub const TOKEN_VAR: &str = "NOTION_TOKEN";
pub const DATABASE_ID_VAR: &str = "DATABASE_ID";
pub const OUTPUT_DIR_VAR: &str = "OUTPUT_DIR";
pub const API_BASE_VAR: &str = "NOTION_API_BASE";
pub const NOTION_VERSION_VAR: &str = "NOTION_VERSION";

pub const DEFAULT_OUTPUT_DIR: &str = "./content/posts";
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required setting {0} is missing or empty")]
    Missing(&'static str),
}

/// Everything one import run needs. Built once at startup and passed down explicitly.
#[derive(Clone)]
pub struct ImportConfig {
    pub token: String,
    pub database_id: String,
    pub output_dir: PathBuf,
    pub api_base: String,
    pub notion_version: String,
    pub fetch: FetchSettings,
    pub failure_policy: FailurePolicy,
}

impl ImportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a key lookup. Required keys are checked before
    /// anything else is touched.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = non_empty(TOKEN_VAR).ok_or(ConfigError::Missing(TOKEN_VAR))?;
        let database_id = non_empty(DATABASE_ID_VAR).ok_or(ConfigError::Missing(DATABASE_ID_VAR))?;

        Ok(Self {
            token,
            database_id,
            output_dir: non_empty(OUTPUT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            api_base: non_empty(API_BASE_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            notion_version: non_empty(NOTION_VERSION_VAR)
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            fetch: FetchSettings::default(),
            failure_policy: FailurePolicy::default(),
        })
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportConfig")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("output_dir", &self.output_dir)
            .field("api_base", &self.api_base)
            .field("notion_version", &self.notion_version)
            .field("fetch", &self.fetch)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}
