//! End-to-end scenarios exercised purely through `ContentHandlers`, as a
//! stand-in for the Portal wire layer consuming the ContentDB.

use discv5::enr::NodeId;
use rand::RngCore;
use tempfile::tempdir;

use trin_core::portalnet::storage::handlers::ContentHandlers;
use trin_core::portalnet::storage::radius::RadiusConfig;

fn random_id() -> [u8; 32] {
    let mut id = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut id);
    id
}

#[test]
fn force_prune_then_vacuum_shrinks_the_file_and_respects_radius() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("content.sqlite3");
    let local_id = NodeId::new(&[0u8; 32]);

    let mut storage = ethportal_peertest::open_on_disk(&db_path, 2048, RadiusConfig::Dynamic, local_id);

    for _ in 0..1000 {
        let id = random_id();
        storage.store_handler(b"key", &id, b"some historical content");
    }

    let radius = storage.radius();
    assert!(radius < trin_core::portalnet::storage::distance::U256::max_value());

    let size_before = storage.size();
    let deleted = storage.force_prune(true);
    assert!(deleted <= 1000);

    let size_after = storage.size();
    assert!(size_after <= size_before);
}

#[test]
fn restart_with_same_config_seeds_radius_from_largest_distance_not_all_ones() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("content.sqlite3");
    let local_id = NodeId::new(&[0u8; 32]);
    let capacity = 256 * 1024;

    {
        let mut storage = ethportal_peertest::open_on_disk(&db_path, capacity, RadiusConfig::Dynamic, local_id.clone());
        // Fill to ~96% of capacity.
        let target_used = (capacity as f64 * 0.96) as usize;
        let mut written = 0usize;
        while written < target_used {
            let id = random_id();
            let value = vec![0u8; 4096];
            written += value.len();
            storage.store_handler(b"key", &id, &value);
        }
        storage.close();
    }

    let storage = ethportal_peertest::open_on_disk(&db_path, capacity, RadiusConfig::Dynamic, local_id);
    assert!(storage.radius() < trin_core::portalnet::storage::distance::U256::max_value());
}

#[test]
fn static_radius_256_never_evicts_across_many_inserts() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("content.sqlite3");
    let local_id = NodeId::new(&[0u8; 32]);

    let mut storage = ethportal_peertest::open_on_disk(&db_path, 1024, RadiusConfig::Static { log_radius: 256 }, local_id);

    for _ in 0..20 {
        let id = random_id();
        let pruned = storage.store_handler(b"key", &id, &vec![0u8; 64 * 1024]);
        assert!(!pruned);
    }

    assert_eq!(storage.content_count(), 20);
    assert_eq!(storage.radius(), trin_core::portalnet::storage::distance::U256::max_value());
}
