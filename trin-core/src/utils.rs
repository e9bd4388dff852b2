use directories::ProjectDirs;
use std::path::PathBuf;

/// Byte-wise XOR of two 32-byte values. `portalnet::storage::distance`
/// builds on this for both its pure-Rust and SQL-registered distance
/// functions.
pub fn xor_two_values(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for i in 0..32 {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// Default on-disk location for node data, used when a caller doesn't supply
/// an explicit path.
pub fn get_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "trin")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".trin"))
}
