//! Thin wrapper over an embedded SQLite connection: single `kvstore` table,
//! byte-keyed get/put/contains/delete, and the checkpoint/vacuum primitives
//! the rest of the storage engine needs. All I/O failures here are treated
//! as unrecoverable, per the fatal-error model in the component design.

use log::error;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::distance;

pub struct KVBackend {
    conn: Connection,
}

/// Logs at ERROR and aborts the process. There is no meaningful local
/// recovery from a corrupt store or a disk-full condition: letting the
/// error propagate into the network layer would mean silently serving
/// truncated content, which the Portal protocol cannot tolerate.
pub(crate) fn fatal(context: &str, err: impl std::fmt::Display) -> ! {
    error!("content database broken or disk full ({}): {}", context, err);
    panic!("content database broken or disk full: {}", context);
}

impl KVBackend {
    pub fn open_on_disk(path: &Path, manual_checkpoint: bool) -> Self {
        let conn = Connection::open(path).unwrap_or_else(|e| fatal("open", e));
        Self::init(conn, manual_checkpoint)
    }

    pub fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().unwrap_or_else(|e| fatal("open in-memory", e));
        Self::init(conn, false)
    }

    fn init(conn: Connection, manual_checkpoint: bool) -> Self {
        distance::register_functions(&conn).unwrap_or_else(|e| fatal("register functions", e));

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kvstore (key BLOB PRIMARY KEY, value BLOB)",
            [],
        )
        .unwrap_or_else(|e| fatal("create table", e));

        // content_size/content_count read this instead of scanning kvstore.
        // INSERT OR REPLACE resolves its primary key conflict as a delete
        // followed by an insert, so the two triggers below are enough to
        // keep both counters right through put, del and the bulk deletes
        // eviction runs directly against kvstore.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS stats (id INTEGER PRIMARY KEY CHECK (id = 0), total_bytes INTEGER NOT NULL, total_count INTEGER NOT NULL)",
            [],
        )
        .unwrap_or_else(|e| fatal("create stats table", e));
        conn.execute(
            "INSERT OR IGNORE INTO stats (id, total_bytes, total_count) VALUES (0, 0, 0)",
            [],
        )
        .unwrap_or_else(|e| fatal("seed stats row", e));
        conn.execute(
            "CREATE TRIGGER IF NOT EXISTS kvstore_after_insert AFTER INSERT ON kvstore BEGIN \
                UPDATE stats SET total_bytes = total_bytes + LENGTH(NEW.value), total_count = total_count + 1 WHERE id = 0; \
             END",
            [],
        )
        .unwrap_or_else(|e| fatal("create insert trigger", e));
        conn.execute(
            "CREATE TRIGGER IF NOT EXISTS kvstore_after_delete AFTER DELETE ON kvstore BEGIN \
                UPDATE stats SET total_bytes = total_bytes - LENGTH(OLD.value), total_count = total_count - 1 WHERE id = 0; \
             END",
            [],
        )
        .unwrap_or_else(|e| fatal("create delete trigger", e));

        conn.pragma_update(None, "journal_mode", "WAL")
            .unwrap_or_else(|e| fatal("set journal_mode", e));

        if manual_checkpoint {
            conn.pragma_update(None, "wal_autocheckpoint", 0)
                .unwrap_or_else(|e| fatal("disable auto checkpoint", e));
        }

        KVBackend { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn get(&self, id: &[u8; 32]) -> Option<Vec<u8>> {
        self.conn
            .query_row(
                "SELECT value FROM kvstore WHERE key = ?1",
                params![id.as_ref()],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or_else(|e| fatal("get", e))
    }

    pub fn put(&self, id: &[u8; 32], value: &[u8]) {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kvstore (key, value) VALUES (?1, ?2)",
                params![id.as_ref(), value],
            )
            .unwrap_or_else(|e| fatal("put", e));
    }

    pub fn contains(&self, id: &[u8; 32]) -> bool {
        self.conn
            .query_row(
                "SELECT 1 FROM kvstore WHERE key = ?1",
                params![id.as_ref()],
                |_| Ok(()),
            )
            .optional()
            .unwrap_or_else(|e| fatal("contains", e))
            .is_some()
    }

    pub fn del(&self, id: &[u8; 32]) {
        self.conn
            .execute("DELETE FROM kvstore WHERE key = ?1", params![id.as_ref()])
            .unwrap_or_else(|e| fatal("delete", e));
    }

    pub fn vacuum(&self) {
        self.conn.execute("VACUUM", []).unwrap_or_else(|e| fatal("vacuum", e));
    }

    /// Truncates the write-ahead log when manual checkpointing is enabled.
    /// A no-op (besides a regular passive checkpoint) otherwise.
    pub fn checkpoint(&self, truncate: bool) {
        let mode = if truncate { "TRUNCATE" } else { "PASSIVE" };
        self.conn
            .pragma(None, "wal_checkpoint", mode, |_row| Ok(()))
            .unwrap_or_else(|e| fatal("checkpoint", e));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let backend = KVBackend::open_in_memory();
        let id = [1u8; 32];
        backend.put(&id, b"hello");
        assert_eq!(backend.get(&id), Some(b"hello".to_vec()));
        assert!(backend.contains(&id));
    }

    #[test]
    fn put_overwrites_existing_value_atomically() {
        let backend = KVBackend::open_in_memory();
        let id = [2u8; 32];
        backend.put(&id, b"first");
        backend.put(&id, b"second");
        assert_eq!(backend.get(&id), Some(b"second".to_vec()));
    }

    #[test]
    fn del_is_idempotent() {
        let backend = KVBackend::open_in_memory();
        let id = [3u8; 32];
        backend.put(&id, b"value");
        backend.del(&id);
        assert!(!backend.contains(&id));
        assert_eq!(backend.get(&id), None);
        backend.del(&id);
        assert!(!backend.contains(&id));
    }

    #[test]
    fn get_on_unknown_id_is_none_not_error() {
        let backend = KVBackend::open_in_memory();
        assert_eq!(backend.get(&[9u8; 32]), None);
        assert!(!backend.contains(&[9u8; 32]));
    }

    #[test]
    fn stats_table_tracks_put_overwrite_and_delete() {
        use super::super::stats;

        let backend = KVBackend::open_in_memory();
        let conn = backend.connection();
        let id = [4u8; 32];

        backend.put(&id, b"first");
        assert_eq!(stats::content_count(conn), 1);
        assert_eq!(stats::content_size(conn), 5);

        // Overwriting a key must not double-count it, but the byte total
        // must track the new value's length, not the old one's.
        backend.put(&id, b"secondlonger");
        assert_eq!(stats::content_count(conn), 1);
        assert_eq!(stats::content_size(conn), 12);

        backend.put(&[5u8; 32], b"xy");
        assert_eq!(stats::content_count(conn), 2);
        assert_eq!(stats::content_size(conn), 14);

        backend.del(&id);
        assert_eq!(stats::content_count(conn), 1);
        assert_eq!(stats::content_size(conn), 2);
    }
}
