//! Hex parsing for command-line addresses and offsets.

use anyhow::{Result, anyhow};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let digits = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid hex address '{}': {}", s, e))
}

/// Parse one signed hex offset such as `0x70` or `-0x8`.
pub fn parse_hex_offset(s: &str) -> Result<i64> {
    let s = s.trim();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = parse_hex_address(rest)?;
    let value = i64::try_from(magnitude).map_err(|_| anyhow!("Offset out of range: {}", s))?;
    Ok(if negative { -value } else { value })
}

/// Parse a comma-separated offset list such as `0x70, 0x0, -0x8`.
pub fn parse_offset_list(s: &str) -> Result<Vec<i64>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_hex_offset)
        .collect()
}
