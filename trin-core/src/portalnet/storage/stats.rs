//! Read-only statistics used to drive eviction decisions. `size`,
//! `unused_size`, `content_count` and `content_size` are O(1) pragma and
//! running-total reads (the running total lives in the `stats` table kept
//! current by `KVBackend`'s triggers). `get_largest_distance` is a full
//! table scan, O(n), and is only ever called on startup or after a bulk
//! deletion.

use rusqlite::{params, Connection};

use super::backend::fatal;
use super::distance::U256;

/// Total on-disk size in bytes: `page_count * page_size`. This reflects
/// peak usage, not live content (deletions don't shrink it until `vacuum`).
pub fn size(conn: &Connection) -> u64 {
    let page_count: i64 = conn
        .pragma_query_value(None, "page_count", |row| row.get(0))
        .unwrap_or_else(|e| fatal("page_count", e));
    let page_size: i64 = conn
        .pragma_query_value(None, "page_size", |row| row.get(0))
        .unwrap_or_else(|e| fatal("page_size", e));
    (page_count * page_size) as u64
}

/// Free-list size in bytes: `freelist_count * page_size`.
pub fn unused_size(conn: &Connection) -> u64 {
    let freelist_count: i64 = conn
        .pragma_query_value(None, "freelist_count", |row| row.get(0))
        .unwrap_or_else(|e| fatal("freelist_count", e));
    let page_size: i64 = conn
        .pragma_query_value(None, "page_size", |row| row.get(0))
        .unwrap_or_else(|e| fatal("page_size", e));
    (freelist_count * page_size) as u64
}

/// Physical footprint the OS sees: total size minus the free list.
pub fn used_size(conn: &Connection) -> u64 {
    size(conn) - unused_size(conn)
}

/// Sum of stored value lengths; the denominator eviction expresses its
/// fractional target against. Read from the running total the `stats`
/// table maintains, not a scan of `kvstore`.
pub fn content_size(conn: &Connection) -> u64 {
    let mut stmt = conn
        .prepare_cached("SELECT total_bytes FROM stats WHERE id = 0")
        .unwrap_or_else(|e| fatal("prepare content_size", e));
    stmt.query_row([], |row| row.get::<_, i64>(0))
        .map(|v| v as u64)
        .unwrap_or_else(|e| fatal("content_size", e))
}

/// Number of stored rows, read from the same running total as `content_size`.
pub fn content_count(conn: &Connection) -> u64 {
    let mut stmt = conn
        .prepare_cached("SELECT total_count FROM stats WHERE id = 0")
        .unwrap_or_else(|e| fatal("prepare content_count", e));
    stmt.query_row([], |row| row.get::<_, i64>(0))
        .map(|v| v as u64)
        .unwrap_or_else(|e| fatal("content_count", e))
}

/// `MAX(xor_distance(origin, key))` over every stored row, or zero on an
/// empty table. SQLite compares BLOBs byte-wise, which is exactly the
/// unsigned big-endian ordering `xor_distance` relies on.
pub fn get_largest_distance(conn: &Connection, origin: &[u8; 32]) -> U256 {
    let mut stmt = conn
        .prepare_cached("SELECT MAX(xor_distance(?1, key)) FROM kvstore")
        .unwrap_or_else(|e| fatal("prepare get_largest_distance", e));
    let bytes: Option<Vec<u8>> = stmt
        .query_row(params![origin.as_ref()], |row| row.get(0))
        .unwrap_or_else(|e| fatal("get_largest_distance", e));
    match bytes {
        Some(bytes) => U256::from_big_endian(&bytes),
        None => U256::zero(),
    }
}
