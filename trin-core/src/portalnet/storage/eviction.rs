//! Bulk, distance-ordered deletion. `delete_content_fraction` is the
//! fractional eviction PutAndPrune triggers on overflow;
//! `delete_content_out_of_radius` is the coarser sweep used by
//! `force_prune` after a capacity reduction or at operator request.

use log::info;
use rusqlite::{params, Connection};

use super::backend::fatal;
use super::distance::{self, U256};
use super::stats;

pub struct EvictionOutcome {
    /// Distance, from `target`, of the nearest row that was *not* deleted.
    /// This is the new radius floor: the controller must never shrink the
    /// radius below it, or it would immediately reject content already held.
    pub furthest_remaining_distance: U256,
    pub deleted_bytes: u64,
    pub total_content_size: u64,
    pub deleted_count: u64,
}

/// Deletes rows ordered by descending distance from `target` until the
/// running total would exceed `fraction * total_content_size`, then stops.
///
/// If even the single furthest row would exceed the budget, nothing is
/// deleted and `furthest_remaining_distance` is that row's distance (the
/// current largest stored distance), not left uninitialized.
pub fn delete_content_fraction(conn: &Connection, target: &[u8; 32], fraction: f64) -> EvictionOutcome {
    assert!(fraction > 0.0 && fraction < 1.0, "fraction must be in (0, 1)");

    let total_content_size = stats::content_size(conn);
    let budget = fraction * total_content_size as f64;

    let rows: Vec<(Vec<u8>, u64)> = {
        let mut stmt = conn
            .prepare_cached("SELECT key, LENGTH(value) FROM kvstore ORDER BY xor_distance(?1, key) DESC")
            .unwrap_or_else(|e| fatal("prepare delete_content_fraction", e));
        stmt.query_map(params![target.as_ref()], |row| {
            let key: Vec<u8> = row.get(0)?;
            let len: i64 = row.get(1)?;
            Ok((key, len as u64))
        })
        .unwrap_or_else(|e| fatal("query delete_content_fraction", e))
        .collect::<rusqlite::Result<_>>()
        .unwrap_or_else(|e| fatal("collect delete_content_fraction", e))
    };

    let mut to_delete: Vec<Vec<u8>> = Vec::new();
    let mut deleted_bytes = 0u64;
    let mut deleted_count = 0u64;
    let mut furthest_remaining_distance = U256::zero();

    for (key, len) in rows {
        if (deleted_bytes + len) as f64 > budget {
            let distance_bytes = distance::xor_distance_bytes(target, &key);
            furthest_remaining_distance = distance::bytes_to_u256(&distance_bytes);
            break;
        }
        deleted_bytes += len;
        deleted_count += 1;
        to_delete.push(key);
    }

    for key in &to_delete {
        conn.execute("DELETE FROM kvstore WHERE key = ?1", params![key])
            .unwrap_or_else(|e| fatal("delete_content_fraction delete", e));
    }

    info!(
        "evicted {} rows ({} bytes) of {} total content bytes",
        deleted_count, deleted_bytes, total_content_size
    );

    EvictionOutcome {
        furthest_remaining_distance,
        deleted_bytes,
        total_content_size,
        deleted_count,
    }
}

/// Deletes every row outside `radius` of `local_id` in a single statement.
/// Does not vacuum; callers that want the space back immediately should
/// follow with `reclaim_and_truncate`.
pub fn delete_content_out_of_radius(conn: &Connection, local_id: &[u8; 32], radius: &[u8; 32]) -> u64 {
    let deleted = conn
        .execute(
            "DELETE FROM kvstore WHERE is_in_radius(?1, key, ?2) = 0",
            params![local_id.as_ref(), radius.as_ref()],
        )
        .unwrap_or_else(|e| fatal("delete_content_out_of_radius", e));
    info!("force-pruned {} rows outside radius", deleted);
    deleted as u64
}

/// Vacuums the file and, if `truncate_wal`, truncates the write-ahead log,
/// so disk savings from a bulk deletion are realized immediately instead of
/// lazily.
pub fn reclaim_and_truncate(backend: &super::backend::KVBackend, truncate_wal: bool) {
    backend.vacuum();
    backend.checkpoint(truncate_wal);
    log::info!("reclaimed free space via vacuum (truncate_wal={})", truncate_wal);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::portalnet::storage::backend::KVBackend;

    fn id_with_first_byte(b: u8) -> [u8; 32] {
        let mut id = [0u8; 32];
        id[0] = b;
        id
    }

    #[test]
    fn delete_content_fraction_removes_exactly_the_furthest_half() {
        let backend = KVBackend::open_in_memory();
        let conn = backend.connection();
        let target = [0u8; 32];

        // 100 entries at increasing distances, each 10 bytes.
        for i in 0..100u8 {
            backend.put(&id_with_first_byte(i.wrapping_add(1)), &[0u8; 10]);
        }

        let outcome = delete_content_fraction(conn, &target, 0.5);
        assert_eq!(outcome.deleted_count, 50);
        assert_eq!(outcome.deleted_bytes, 500);
        assert_eq!(stats::content_count(conn), 50);

        // Every surviving id is nearer than every deleted one.
        let furthest_surviving = stats::get_largest_distance(conn, &target);
        assert!(furthest_surviving <= outcome.furthest_remaining_distance);
    }

    #[test]
    fn delete_content_fraction_returns_current_largest_when_nothing_fits_budget() {
        let backend = KVBackend::open_in_memory();
        let conn = backend.connection();
        let target = [0u8; 32];

        backend.put(&id_with_first_byte(1), &[0u8; 1]);
        backend.put(&id_with_first_byte(2), &[0u8; 1000]);

        // 5% of total content (1001 bytes) is ~50 bytes: the furthest row
        // (first byte 2, 1000 bytes) is visited first and alone exceeds
        // the budget, so nothing gets deleted at all.
        let outcome = delete_content_fraction(conn, &target, 0.05);
        assert_eq!(outcome.deleted_count, 0);
        assert_eq!(outcome.deleted_bytes, 0);
        assert_eq!(outcome.total_content_size, 1001);

        let largest = stats::get_largest_distance(conn, &target);
        assert_eq!(outcome.furthest_remaining_distance, largest);
    }

    #[test]
    fn delete_content_out_of_radius_leaves_only_in_range_entries() {
        let backend = KVBackend::open_in_memory();
        let conn = backend.connection();
        let local_id = [0u8; 32];

        let near = id_with_first_byte(0x01);
        let far = id_with_first_byte(0xff);
        backend.put(&near, b"near");
        backend.put(&far, b"far");

        let mut radius = [0u8; 32];
        radius[0] = 0x10;

        let deleted = delete_content_out_of_radius(conn, &local_id, &radius);
        assert_eq!(deleted, 1);
        assert!(backend.contains(&near));
        assert!(!backend.contains(&far));
    }
}
