//! Size-based file rotation

use crate::logger::config::RotationConfig;
use crate::logger::error::LoggerError;
use std::fs;
use std::path::{Path, PathBuf};

/// Shifts `app.log` to `app.log.1`, `app.log.1` to `app.log.2` and so on,
/// dropping whatever would land past `max_files`.
pub struct RotationManager {
    config: RotationConfig,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.config.max_size
    }

    pub fn rotate(&self, current_path: &Path) -> Result<(), LoggerError> {
        let oldest = rotated_path(current_path, self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for index in (1..self.config.max_files).rev() {
            let from = rotated_path(current_path, index);
            if from.exists() {
                fs::rename(&from, rotated_path(current_path, index + 1))?;
            }
        }

        if current_path.exists() {
            fs::rename(current_path, rotated_path(current_path, 1)).map_err(|e| {
                LoggerError::rotation(format!(
                    "failed to rotate {}: {}",
                    current_path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}

/// Path of the `index`-th rotated file, e.g. `logs/app.log.2`.
pub fn rotated_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}
