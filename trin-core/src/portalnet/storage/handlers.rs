//! The stable contract between the ContentDB and the Portal wire layer.
//! The wire layer (out of scope here) should depend only on this trait,
//! never on `PortalStorage`'s internals.

use super::distance::U256;

pub trait ContentHandlers {
    /// `content_key` is accepted but currently unused; future content
    /// schemas may key by the raw key rather than solely by content-id.
    fn get_handler(&self, content_key: &[u8], content_id: &[u8; 32]) -> Option<Vec<u8>>;

    /// Returns whether this store triggered a pruning pass.
    fn store_handler(&mut self, content_key: &[u8], content_id: &[u8; 32], value: &[u8]) -> bool;

    fn contains_handler(&self, content_key: &[u8], content_id: &[u8; 32]) -> bool;

    fn radius_handler(&self) -> U256;
}
