//! Host list loading and rewriting.
//!
//! The host list is a YAML sequence of bare hostnames:
//!
//! ```yaml
//! - example.com
//! - example.org
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BatchIOError;

/// Source of the hostnames to scan. The orchestrator writes the deduplicated
/// list back through `save` before scanning.
pub trait HostListStore {
    fn load(&self) -> Result<Vec<String>, BatchIOError>;
    fn save(&mut self, hosts: &[String]) -> Result<(), BatchIOError>;
}

/// Host list kept in a YAML file.
#[derive(Debug, Clone)]
pub struct YamlHostList {
    path: PathBuf,
}

impl YamlHostList {
    pub fn new<P: AsRef<Path>>(path: P) -> YamlHostList {
        YamlHostList {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn error(&self, reason: impl ToString) -> BatchIOError {
        BatchIOError::HostList {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl HostListStore for YamlHostList {
    fn load(&self) -> Result<Vec<String>, BatchIOError> {
        let content = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_yaml::from_str(&content).map_err(|e| self.error(e))
    }

    fn save(&mut self, hosts: &[String]) -> Result<(), BatchIOError> {
        let content = serde_yaml::to_string(hosts).map_err(|e| self.error(e))?;
        fs::write(&self.path, content).map_err(|e| self.error(e))
    }
}

/// In-memory host list.
impl HostListStore for Vec<String> {
    fn load(&self) -> Result<Vec<String>, BatchIOError> {
        Ok(self.clone())
    }

    fn save(&mut self, hosts: &[String]) -> Result<(), BatchIOError> {
        *self = hosts.to_vec();
        Ok(())
    }
}
