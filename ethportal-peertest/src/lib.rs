//! Black-box harness for exercising a `PortalStorage` purely through the
//! `ContentHandlers` seam, standing in for the Portal wire layer this
//! repository treats as an external collaborator.

use std::path::Path;

use discv5::enr::NodeId;
use trin_core::portalnet::storage::config::PortalStorageConfig;
use trin_core::portalnet::storage::radius::RadiusConfig;
use trin_core::portalnet::storage::PortalStorage;

pub fn open_on_disk(path: &Path, capacity_bytes: u64, radius_config: RadiusConfig, local_id: NodeId) -> PortalStorage {
    let config = PortalStorageConfig {
        path: Some(path.to_path_buf()),
        in_memory: false,
        storage_capacity_bytes: capacity_bytes,
        radius_config,
        local_id,
        manual_checkpoint: false,
        protocol_id: "history".to_string(),
    };
    PortalStorage::new(config).expect("peertest fixture config should be valid")
}
