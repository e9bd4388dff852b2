//! The local content database: a persistent, content-id-addressed store
//! that a Portal Network node uses to hold the slice of historical chain
//! data its advertised radius obligates it to serve.
//!
//! Opening is expensive (one custom-function registration, a handful of
//! cached statements, and potentially a full distance scan to seed the
//! initial radius); callers should open once, eagerly, at node boot, and
//! hold the instance for the node's lifetime.

pub mod backend;
pub mod config;
pub mod distance;
pub mod eviction;
pub mod handlers;
pub mod metrics;
pub mod radius;
pub mod stats;

use backend::KVBackend;
use config::{ConfigError, PortalStorageConfig};
use distance::U256;
use handlers::ContentHandlers;
use radius::RadiusController;

/// Outcome of a single `put`, from PutAndPrune's perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PutOutcome {
    Stored,
    Pruned {
        furthest_remaining_distance: U256,
        deleted_fraction: f64,
        deleted_count: u64,
    },
}

/// Fraction of content bytes a single overflow-triggered eviction pass
/// targets. Fixed rather than one-row-at-a-time: it amortizes the cost of
/// radius updates (each one may cause re-bucketing of offers in the wire
/// layer) at the cost of a latency spike during the bulk delete.
const PRUNE_FRACTION: f64 = 0.05;

pub struct PortalStorage {
    backend: KVBackend,
    local_id: [u8; 32],
    capacity: u64,
    radius_controller: RadiusController,
    protocol_id: String,
}

impl PortalStorage {
    /// Opens (or creates) the database, registers the distance scalar
    /// functions, and seeds the initial radius from configuration and
    /// current database state.
    pub fn new(config: PortalStorageConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let backend = match (&config.path, config.in_memory) {
            (_, true) => KVBackend::open_in_memory(),
            (None, false) => KVBackend::open_in_memory(),
            (Some(path), false) => KVBackend::open_on_disk(path, config.manual_checkpoint),
        };

        let local_id = config.local_id.raw();

        let mut radius_controller = RadiusController::new(config.radius_config);
        let used = stats::used_size(backend.connection());
        let largest = stats::get_largest_distance(backend.connection(), &local_id);
        radius_controller.set_initial_radius(used, config.storage_capacity_bytes, largest);

        Ok(PortalStorage {
            backend,
            local_id,
            capacity: config.storage_capacity_bytes,
            radius_controller,
            protocol_id: config.protocol_id,
        })
    }

    pub fn get(&self, id: &[u8; 32]) -> Option<Vec<u8>> {
        self.backend.get(id)
    }

    pub fn contains(&self, id: &[u8; 32]) -> bool {
        self.backend.contains(id)
    }

    pub fn del(&self, id: &[u8; 32]) {
        self.backend.del(id)
    }

    pub fn radius(&self) -> U256 {
        self.radius_controller.radius()
    }

    pub fn size(&self) -> u64 {
        stats::size(self.backend.connection())
    }

    pub fn unused_size(&self) -> u64 {
        stats::unused_size(self.backend.connection())
    }

    pub fn used_size(&self) -> u64 {
        stats::used_size(self.backend.connection())
    }

    pub fn content_size(&self) -> u64 {
        stats::content_size(self.backend.connection())
    }

    pub fn content_count(&self) -> u64 {
        stats::content_count(self.backend.connection())
    }

    pub fn vacuum(&self) {
        self.backend.vacuum()
    }

    pub fn checkpoint(&self, truncate: bool) {
        self.backend.checkpoint(truncate)
    }

    /// Inserts `value` and, if the store is now over capacity, runs a
    /// fixed 5% fractional eviction and reports the deleted slice so the
    /// radius controller can recompute. Unconditional: mode-gating (only
    /// called in Dynamic mode) lives in `store_handler`.
    pub fn put_and_prune(&mut self, id: [u8; 32], value: &[u8]) -> PutOutcome {
        self.backend.put(&id, value);

        if self.used_size() < self.capacity {
            return PutOutcome::Stored;
        }

        log::debug!("capacity reached storing {}, pruning {:.0}%", hex::encode(id), PRUNE_FRACTION * 100.0);
        let outcome = eviction::delete_content_fraction(self.backend.connection(), &self.local_id, PRUNE_FRACTION);
        let deleted_fraction = if outcome.total_content_size == 0 {
            0.0
        } else {
            outcome.deleted_bytes as f64 / outcome.total_content_size as f64
        };

        PutOutcome::Pruned {
            furthest_remaining_distance: outcome.furthest_remaining_distance,
            deleted_fraction,
            deleted_count: outcome.deleted_count,
        }
    }

    /// Deletes everything outside the current radius, then reclaims the
    /// freed space immediately. Used on startup after a capacity
    /// reduction, and available to operators directly.
    pub fn force_prune(&self, truncate_wal: bool) -> u64 {
        let radius_bytes = distance::u256_to_bytes(&self.radius_controller.radius());
        let deleted = eviction::delete_content_out_of_radius(self.backend.connection(), &self.local_id, &radius_bytes);
        eviction::reclaim_and_truncate(&self.backend, truncate_wal);
        deleted
    }

    /// Cooperative close: consuming `self` finalizes the connection's
    /// cached prepared statements before the underlying file handle is
    /// released.
    pub fn close(self) {
        drop(self.backend);
    }
}

impl ContentHandlers for PortalStorage {
    fn get_handler(&self, _content_key: &[u8], content_id: &[u8; 32]) -> Option<Vec<u8>> {
        self.get(content_id)
    }

    fn store_handler(&mut self, _content_key: &[u8], content_id: &[u8; 32], value: &[u8]) -> bool {
        if !self.radius_controller.is_dynamic() {
            self.backend.put(content_id, value);
            return false;
        }

        match self.put_and_prune(*content_id, value) {
            PutOutcome::Stored => false,
            PutOutcome::Pruned {
                furthest_remaining_distance,
                deleted_fraction,
                deleted_count,
            } => {
                metrics::record_pruning_event(&self.protocol_id, deleted_count);
                if deleted_fraction > 0.0 {
                    self.radius_controller
                        .adjust_after_eviction(deleted_fraction, furthest_remaining_distance);
                }
                true
            }
        }
    }

    fn contains_handler(&self, _content_key: &[u8], content_id: &[u8; 32]) -> bool {
        self.contains(content_id)
    }

    fn radius_handler(&self) -> U256 {
        self.radius()
    }
}
