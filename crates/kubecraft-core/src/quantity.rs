//! Resource quantity parsing (CPU and memory)

use crate::error::{CoreError, Result};

const KI: u64 = 1024;

/// Binary suffixes, largest first
const BINARY_SUFFIXES: [(&str, u64); 6] = [
    ("Ei", KI.pow(6)),
    ("Pi", KI.pow(5)),
    ("Ti", KI.pow(4)),
    ("Gi", KI.pow(3)),
    ("Mi", KI.pow(2)),
    ("Ki", KI),
];

const DECIMAL_SUFFIXES: [(&str, u64); 6] = [
    ("E", 1_000_000_000_000_000_000),
    ("P", 1_000_000_000_000_000),
    ("T", 1_000_000_000_000),
    ("G", 1_000_000_000),
    ("M", 1_000_000),
    ("k", 1_000),
];

/// Parse a CPU quantity into millicores
///
/// `"500m"` is 500, `"2"` is 2000 and `"0.5"` is 500.
pub fn parse_cpu(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    match trimmed.strip_suffix('m') {
        Some(millis) => parse_amount(input, millis, 1.0),
        None => parse_amount(input, trimmed, 1000.0),
    }
}

/// Parse a memory quantity into bytes
///
/// Accepts binary (`Ki`, `Mi`, ...) and decimal (`k`, `M`, ...) suffixes,
/// with optional fractional amounts such as `"1.5Gi"`.
pub fn parse_memory(input: &str) -> Result<u64> {
    let trimmed = input.trim();

    for (suffix, multiplier) in BINARY_SUFFIXES.iter().chain(DECIMAL_SUFFIXES.iter()) {
        if let Some(amount) = trimmed.strip_suffix(suffix) {
            return parse_amount(input, amount, *multiplier as f64);
        }
    }

    parse_amount(input, trimmed, 1.0)
}

/// Format millicores, using whole cores when exact
pub fn format_cpu(millicores: u64) -> String {
    if millicores % 1000 == 0 {
        (millicores / 1000).to_string()
    } else {
        format!("{}m", millicores)
    }
}

/// Format bytes with the largest binary suffix that divides them exactly
pub fn format_memory(bytes: u64) -> String {
    BINARY_SUFFIXES
        .iter()
        .find(|(_, multiplier)| bytes >= *multiplier && bytes % multiplier == 0)
        .map(|(suffix, multiplier)| format!("{}{}", bytes / multiplier, suffix))
        .unwrap_or_else(|| bytes.to_string())
}

fn parse_amount(input: &str, amount: &str, multiplier: f64) -> Result<u64> {
    if amount.is_empty() {
        return Err(invalid(input, "missing numeric amount"));
    }

    let value: f64 = amount
        .parse()
        .map_err(|_| invalid(input, "amount is not a number"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(invalid(input, "amount must be a non-negative number"));
    }

    let scaled = (value * multiplier).round();
    if scaled > u64::MAX as f64 {
        return Err(invalid(input, "quantity is too large"));
    }

    Ok(scaled as u64)
}

fn invalid(input: &str, reason: &str) -> CoreError {
    CoreError::InvalidQuantity {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
