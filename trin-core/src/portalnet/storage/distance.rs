//! 256-bit XOR distance arithmetic, both as a pure-Rust `U256` type for
//! application code and as deterministic SQLite scalar functions so the
//! storage engine itself can order and filter rows by distance.

use std::convert::TryInto;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Result as SqlResult};
use uint::construct_uint;

use crate::utils::xor_two_values;

construct_uint! {
    /// A 256-bit unsigned integer, big-endian at every byte boundary that
    /// touches storage.
    pub struct U256(4);
}

/// `(1 << log_radius) - 1`, saturating to all-ones at `log_radius == 256`.
pub fn from_log_radius(log_radius: u16) -> U256 {
    assert!(log_radius <= 256, "log_radius must be in [0, 256]");
    if log_radius == 256 {
        U256::max_value()
    } else {
        (U256::one() << log_radius as usize) - U256::one()
    }
}

pub fn xor_distance(a: &U256, b: &U256) -> U256 {
    *a ^ *b
}

pub fn is_in_radius(origin: &U256, key: &U256, radius: &U256) -> bool {
    xor_distance(origin, key) <= *radius
}

pub fn bytes_to_u256(bytes: &[u8; 32]) -> U256 {
    U256::from_big_endian(bytes)
}

pub fn u256_to_bytes(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

fn xor_bytes(a: &[u8], b: &[u8]) -> [u8; 32] {
    let a: [u8; 32] = a.try_into().expect("xor operand must be 32 bytes");
    let b: [u8; 32] = b.try_into().expect("xor operand must be 32 bytes");
    xor_two_values(&a, &b)
}

/// Same XOR as the registered SQL function, for call sites that already
/// have the raw key bytes in hand (e.g. eviction's cursor loop) and would
/// rather not round-trip through SQLite for a single comparison.
pub(crate) fn xor_distance_bytes(a: &[u8; 32], b: &[u8]) -> [u8; 32] {
    xor_bytes(a.as_ref(), b)
}

/// Registers `xor_distance(a, b)` and `is_in_radius(origin, key, radius)` as
/// deterministic scalar functions on `conn`. Functions are per-connection and
/// are not persisted to the database file, so this must be called every time
/// a connection is opened.
pub fn register_functions(conn: &Connection) -> SqlResult<()> {
    conn.create_scalar_function(
        "xor_distance",
        2,
        FunctionFlags::SQLITE_DETERMINISTIC | FunctionFlags::SQLITE_UTF8,
        |ctx| {
            let a = ctx.get_raw(0).as_blob()?;
            let b = ctx.get_raw(1).as_blob()?;
            Ok(xor_bytes(a, b).to_vec())
        },
    )?;

    conn.create_scalar_function(
        "is_in_radius",
        3,
        FunctionFlags::SQLITE_DETERMINISTIC | FunctionFlags::SQLITE_UTF8,
        |ctx| {
            let origin = ctx.get_raw(0).as_blob()?;
            let key = ctx.get_raw(1).as_blob()?;
            let radius = ctx.get_raw(2).as_blob()?;
            let distance = xor_bytes(origin, key);
            Ok(if distance.as_slice() <= radius { 1i64 } else { 0i64 })
        },
    )?;

    Ok(())
}
