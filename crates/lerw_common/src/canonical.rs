//! Canonical textual encoding of numeric parameter values.
//!
//! Cache keys and engine arguments are both built from these strings, so the
//! same logical value must always produce the same text. The rule is:
//!
//! - integers are written in plain decimal;
//! - `-0.0` is written as `0`;
//! - any other finite float is written as the shortest plain decimal string
//!   that parses back to the same `f64`, never in exponent notation, and
//!   integral values carry no fractional part (`5000.0` is `5000`).
//!
//! Non-finite floats never reach this module through a validated
//! [`ParameterSet`](crate::ParameterSet).

/// Formats a finite `f64` using the canonical rule.
pub fn canonical_f64(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // `Display` for f64 emits the shortest round-trip digits without an
    // exponent and drops the fraction of integral values.
    format!("{value}")
}

/// Formats an integer using the canonical rule.
pub fn canonical_int<T: Into<u64>>(value: T) -> String {
    value.into().to_string()
}
