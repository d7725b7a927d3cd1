//! Optional depvis.toml configuration file
//!
//! Every field is optional; command-line flags always win over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DepvisConfig {
    pub root: Option<String>,
    pub database: Option<String>,
    pub ignored_dirs: Option<Vec<String>>,
    pub file_size_limit: Option<u64>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("depvis.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("depvis.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<DepvisConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: DepvisConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &DepvisConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
