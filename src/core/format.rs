//! Pure helpers shared by the samplers.

use crate::core::types::{NetCounters, NetDelta};

const UNIT_PREFIXES: [&str; 5] = ["", "Ki", "Mi", "Gi", "Ti"];

/// Render a byte count with binary unit prefixes, e.g. `1.50 KiB`.
///
/// Divides by 1024 while the value is at least 1024, up to `Ti`.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut divisions = 0;
    while value >= 1024.0 && divisions < UNIT_PREFIXES.len() - 1 {
        value /= 1024.0;
        divisions += 1;
    }
    format!("{:.2} {}B", value, UNIT_PREFIXES[divisions])
}

/// Bytes moved between two cumulative readings.
///
/// A counter that went backwards (interface reset, wraparound) yields zero
/// for that direction and marks the delta as regressed.
pub fn counter_delta(old: NetCounters, new: NetCounters) -> NetDelta {
    NetDelta {
        sent: new.sent.saturating_sub(old.sent),
        received: new.received.saturating_sub(old.received),
        regressed: new.sent < old.sent || new.received < old.received,
    }
}
