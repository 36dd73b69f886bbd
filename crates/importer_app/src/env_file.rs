use std::collections::HashMap;
use std::path::Path;

use importer_engine::{ConfigError, ImportConfig};

/// Variables from a `.env` file. Without an explicit path the file is looked
/// up from the working directory upwards. A missing file yields no variables.
pub fn load(path: Option<&Path>) -> Result<HashMap<String, String>, dotenvy::Error> {
    let found = match path {
        Some(path) => dotenvy::from_path_iter(path),
        None => dotenvy::dotenv_iter(),
    };
    match found {
        Ok(iter) => iter.collect(),
        Err(err) if err.not_found() => Ok(HashMap::new()),
        Err(err) => Err(err),
    }
}

/// Process environment wins over the file.
pub fn import_config(file_vars: &HashMap<String, String>) -> Result<ImportConfig, ConfigError> {
    ImportConfig::from_lookup(|key| {
        std::env::var(key)
            .ok()
            .or_else(|| file_vars.get(key).cloned())
    })
}
