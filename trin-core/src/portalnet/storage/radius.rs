//! Owns the current radius and its adjustment policy. In `Dynamic` mode the
//! radius only ever shrinks, in response to eviction; in `Static` mode it is
//! fixed at construction and this controller never touches it again.

use log::info;

use super::distance::{self, U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusConfig {
    /// Radius fixed at `2^log_radius - 1`. No eviction, no radius updates.
    Static { log_radius: u16 },
    /// Radius starts from database state at open time and shrinks as the
    /// store fills.
    Dynamic,
}

pub struct RadiusController {
    config: RadiusConfig,
    radius: U256,
}

impl RadiusController {
    pub fn new(config: RadiusConfig) -> Self {
        let radius = match config {
            RadiusConfig::Static { log_radius } => distance::from_log_radius(log_radius),
            RadiusConfig::Dynamic => U256::max_value(),
        };
        RadiusController { config, radius }
    }

    pub fn radius(&self) -> U256 {
        self.radius
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.config, RadiusConfig::Dynamic)
    }

    /// Chooses the initial radius for `Dynamic` mode from database state:
    /// near-full (>95% of capacity used) starts at the current largest
    /// stored distance, otherwise starts at the maximum radius. A capacity
    /// of zero is always treated as near-full, so a fresh, empty,
    /// zero-capacity database starts at radius zero rather than all-ones.
    /// No-op in `Static` mode.
    pub fn set_initial_radius(&mut self, used_size: u64, capacity: u64, largest_distance: U256) {
        if let RadiusConfig::Dynamic = self.config {
            let near_full = capacity == 0 || used_size as f64 > 0.95 * capacity as f64;
            self.radius = if near_full { largest_distance } else { U256::max_value() };
            info!("initial radius set to {:#x} (near_full={})", self.radius, near_full);
        }
    }

    /// `new_radius = max(radius / floor(1/deleted_fraction), furthest_remaining_distance)`.
    /// The `max` guard keeps radius from shrinking below what the node still
    /// holds, which would otherwise reject content it already has. A
    /// `deleted_fraction` of zero (nothing was freed) leaves radius
    /// unchanged. No-op in `Static` mode.
    pub fn adjust_after_eviction(&mut self, deleted_fraction: f64, furthest_remaining_distance: U256) {
        if let RadiusConfig::Dynamic = self.config {
            if deleted_fraction <= 0.0 {
                info!("eviction freed no bytes; radius left at {:#x}", self.radius);
                return;
            }
            let divisor = (1.0 / deleted_fraction).floor().max(1.0) as u64;
            let scaled = self.radius / U256::from(divisor);
            let new_radius = std::cmp::max(scaled, furthest_remaining_distance);
            info!("radius adjusted from {:#x} to {:#x}", self.radius, new_radius);
            self.radius = new_radius;
        }
    }
}
