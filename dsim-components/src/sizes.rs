// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Byte size helpers.
//!
//! Sizes are binary multiples and are returned as `f64` so they can be used
//! directly as property values.

use std::sync::LazyLock;

use dsim_engine::sim_error;
use dsim_engine::types::SimError;
use regex::Regex;

pub const BYTES_PER_KB: f64 = 1024.0;
pub const BYTES_PER_MB: f64 = BYTES_PER_KB * 1024.0;
pub const BYTES_PER_GB: f64 = BYTES_PER_MB * 1024.0;
pub const BYTES_PER_TB: f64 = BYTES_PER_GB * 1024.0;
pub const BYTES_PER_PB: f64 = BYTES_PER_TB * 1024.0;
pub const BYTES_PER_XB: f64 = BYTES_PER_PB * 1024.0;

#[must_use]
pub fn kilo_bytes(n: f64) -> f64 {
    n * BYTES_PER_KB
}

#[must_use]
pub fn mega_bytes(n: f64) -> f64 {
    n * BYTES_PER_MB
}

#[must_use]
pub fn giga_bytes(n: f64) -> f64 {
    n * BYTES_PER_GB
}

#[must_use]
pub fn tera_bytes(n: f64) -> f64 {
    n * BYTES_PER_TB
}

#[must_use]
pub fn peta_bytes(n: f64) -> f64 {
    n * BYTES_PER_PB
}

#[must_use]
pub fn exa_bytes(n: f64) -> f64 {
    n * BYTES_PER_XB
}

/// Parse a size such as `10GB` or `512kb`. A bare number is in bytes.
pub fn str_to_size(value: &str) -> Result<f64, SimError> {
    static SIZE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*([kmgtpx]b)?\s*$").unwrap());

    let lower = value.to_lowercase();
    let Some(captures) = SIZE_RE.captures(&lower) else {
        return sim_error!(format!("Invalid size: {value}"));
    };
    let n: f64 = captures[1]
        .parse()
        .map_err(|e| SimError(format!("Invalid size: {value}: {e}")))?;
    let bytes = match captures.get(2).map(|m| m.as_str()) {
        Some("kb") => kilo_bytes(n),
        Some("mb") => mega_bytes(n),
        Some("gb") => giga_bytes(n),
        Some("tb") => tera_bytes(n),
        Some("pb") => peta_bytes(n),
        Some("xb") => exa_bytes(n),
        _ => n,
    };
    Ok(bytes)
}
