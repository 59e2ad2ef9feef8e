use std::{fs, io, path::Path};

use anyhow::Context;
use shared::domain::Deal;

/// Reads the deal list from `path`. A missing file is an empty board.
pub fn load_deals(path: &Path) -> anyhow::Result<Vec<Deal>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read data file '{}'", path.display()))
        }
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse data file '{}'", path.display()))
}

pub fn save_deals(path: &Path, deals: &[Deal]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create directory '{}'", parent.display())
        })?;
    }
    let raw = serde_json::to_string_pretty(deals)?;
    fs::write(path, raw)
        .with_context(|| format!("failed to write data file '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/data_file_tests.rs"]
mod tests;
