use failure::{format_err, ResultExt};
use std::fs::create_dir_all;
use std::path::PathBuf;

/// `~/.argform`, created if missing.
pub fn argform_dir() -> Result<PathBuf, failure::Error> {
    let dir = ::dirs::home_dir()
        .ok_or_else(|| format_err!("failed to locate the home directory"))?
        .join(".argform");

    create_dir_all(&dir).with_context(|_| format!("failed to create {}", dir.display()))?;
    Ok(dir)
}

pub fn log_file_path(name: &str) -> Result<PathBuf, failure::Error> {
    let log_dir = argform_dir()?.join("log");
    create_dir_all(&log_dir).with_context(|_| format!("failed to create {}", log_dir.display()))?;
    Ok(log_dir.join(&format!("{}.log", name)))
}
