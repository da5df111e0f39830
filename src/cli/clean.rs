//! `clean` command: drop persisted bundles.

use anyhow::{Context, Result};
use std::fs;

use crate::{config::BundleConfig, log};

/// Remove the bundle store directory.
pub fn clean_bundles(config: &BundleConfig) -> Result<()> {
    let dir = &config.paths.cache;
    if !dir.exists() {
        log!("clean"; "nothing to clean");
        return Ok(());
    }

    let count = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(Result::ok)
        .count();
    fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    log!("clean"; "removed {} bundles from {}", count, dir.display());
    Ok(())
}
