use discv5::enr::NodeId;
use std::path::PathBuf;

use super::radius::RadiusConfig;

/// The only recoverable error this crate returns: a value supplied at
/// configuration time was out of range. Everything past construction is
/// either a normal negative result (`Absent`) or a fatal backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    LogRadiusOutOfRange(u16),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LogRadiusOutOfRange(n) => {
                write!(f, "log_radius {} is out of range [0, 256]", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct PortalStorageConfig {
    /// Empty or `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// Forces an in-memory database regardless of `path`; useful for tests.
    pub in_memory: bool,
    pub storage_capacity_bytes: u64,
    pub radius_config: RadiusConfig,
    pub local_id: NodeId,
    pub manual_checkpoint: bool,
    /// Labels metrics so a node running several sub-protocols can tell
    /// their ContentDBs apart.
    pub protocol_id: String,
}

impl PortalStorageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let RadiusConfig::Static { log_radius } = self.radius_config {
            if log_radius > 256 {
                return Err(ConfigError::LogRadiusOutOfRange(log_radius));
            }
        }
        Ok(())
    }
}
