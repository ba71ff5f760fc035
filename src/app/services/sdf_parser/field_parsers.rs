//! Field parsing utilities for SD-file records
//!
//! This module provides helper functions for the fixed-width counts line and
//! for classifying data item values into typed property values.

use crate::app::models::{PropertyValue, TypedValue};
use crate::constants::{COUNTS_FIELD_WIDTH, V3000_COUNTS_PREFIX, V3000_MARKER};

/// Molfile version declared on the counts line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtabVersion {
    V2000,
    V3000,
}

/// Atom and bond counts read from a counts line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub atoms: usize,
    pub bonds: usize,
    pub version: CtabVersion,
}

/// Parse a V2000/V3000 counts line
///
/// V2000 counts occupy the first two 3-character fields. Lines that do not
/// follow the fixed layout fall back to the first two whitespace-separated
/// tokens. For V3000 the returned counts are zero; the real values live on
/// the `M  V30 COUNTS` line and are read with [`parse_v3000_counts`].
pub fn parse_counts_line(line: &str) -> Result<Counts, String> {
    if line.contains(V3000_MARKER) {
        return Ok(Counts {
            atoms: 0,
            bonds: 0,
            version: CtabVersion::V3000,
        });
    }

    if let Some((atoms, bonds)) = parse_fixed_width_counts(line) {
        return Ok(Counts {
            atoms,
            bonds,
            version: CtabVersion::V2000,
        });
    }

    let mut tokens = line.split_whitespace();
    match (
        tokens.next().and_then(|t| t.parse::<usize>().ok()),
        tokens.next().and_then(|t| t.parse::<usize>().ok()),
    ) {
        (Some(atoms), Some(bonds)) => Ok(Counts {
            atoms,
            bonds,
            version: CtabVersion::V2000,
        }),
        _ => Err(format!(
            "Invalid counts line '{}': expected atom and bond counts",
            line.trim_end()
        )),
    }
}

fn parse_fixed_width_counts(line: &str) -> Option<(usize, usize)> {
    let atoms = line.get(0..COUNTS_FIELD_WIDTH)?.trim().parse::<usize>().ok()?;
    let bonds = line
        .get(COUNTS_FIELD_WIDTH..2 * COUNTS_FIELD_WIDTH)?
        .trim()
        .parse::<usize>()
        .ok()?;
    Some((atoms, bonds))
}

/// Parse the atom and bond counts from an `M  V30 COUNTS na nb ...` line
pub fn parse_v3000_counts(line: &str) -> Result<(usize, usize), String> {
    let rest = line
        .strip_prefix(V3000_COUNTS_PREFIX)
        .ok_or_else(|| format!("Not a V3000 counts line: '{}'", line.trim_end()))?;

    let mut tokens = rest.split_whitespace();
    match (
        tokens.next().and_then(|t| t.parse::<usize>().ok()),
        tokens.next().and_then(|t| t.parse::<usize>().ok()),
    ) {
        (Some(atoms), Some(bonds)) => Ok((atoms, bonds)),
        _ => Err(format!(
            "Invalid V3000 counts line '{}': expected atom and bond counts",
            line.trim_end()
        )),
    }
}

/// Classify a data item value, most specific kind first
///
/// The text is trimmed; empty text yields a value without a concrete type.
/// Floating-point literals must contain a digit, so words like `nan` or
/// `infinity` stay text.
pub fn classify_value(raw: &str) -> PropertyValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return PropertyValue::new(None, trimmed);
    }

    let value = if let Ok(v) = trimmed.parse::<i64>() {
        TypedValue::Integer(v)
    } else if let Some(v) = parse_float_literal(trimmed) {
        TypedValue::Float(v)
    } else {
        TypedValue::Text(trimmed.to_string())
    };

    PropertyValue::new(Some(value), trimmed)
}

fn parse_float_literal(text: &str) -> Option<f64> {
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Element symbol of a V2000 atom line (columns 32-34)
pub fn atom_symbol_v2000(line: &str) -> Option<&str> {
    line.get(31..34)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| line.split_whitespace().nth(3))
}

/// Element symbol of a V3000 atom line (`M  V30 index type x y z aamap`)
pub fn atom_symbol_v3000(line: &str) -> Option<&str> {
    line.strip_prefix("M  V30 ")?.split_whitespace().nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::PropertyKind;

    #[test]
    fn test_fixed_width_counts() {
        let counts = parse_counts_line("  3  2  0  0  0  0  0  0  0  0999 V2000").unwrap();
        assert_eq!((counts.atoms, counts.bonds), (3, 2));
        assert_eq!(counts.version, CtabVersion::V2000);

        // Three-digit fields run together
        let counts = parse_counts_line("123456  0  0  0  0  0  0  0  0999 V2000").unwrap();
        assert_eq!((counts.atoms, counts.bonds), (123, 456));
    }

    #[test]
    fn test_whitespace_counts_fallback() {
        let counts = parse_counts_line("3 2").unwrap();
        assert_eq!((counts.atoms, counts.bonds), (3, 2));
    }

    #[test]
    fn test_invalid_counts_line() {
        let err = parse_counts_line("broken").unwrap_err();
        assert!(err.contains("counts line"));
        assert!(err.contains("broken"));

        assert!(parse_counts_line("").is_err());
        assert!(parse_counts_line("  3").is_err());
    }

    #[test]
    fn test_v3000_counts() {
        let counts = parse_counts_line("  0  0  0     0  0            999 V3000").unwrap();
        assert_eq!(counts.version, CtabVersion::V3000);

        assert_eq!(parse_v3000_counts("M  V30 COUNTS 6 5 0 0 0").unwrap(), (6, 5));
        assert!(parse_v3000_counts("M  V30 COUNTS x").is_err());
        assert!(parse_v3000_counts("M  V30 BEGIN ATOM").is_err());
    }

    #[test]
    fn test_classification_order() {
        assert_eq!(classify_value("123").kind(), Some(PropertyKind::Integer));
        assert_eq!(classify_value(" -7 ").kind(), Some(PropertyKind::Integer));
        assert_eq!(classify_value("1.5").kind(), Some(PropertyKind::Float));
        assert_eq!(classify_value("1e-3").kind(), Some(PropertyKind::Float));
        assert_eq!(classify_value("text").kind(), Some(PropertyKind::Text));
        assert_eq!(classify_value("12 mg").kind(), Some(PropertyKind::Text));
        assert_eq!(classify_value("NaN").kind(), Some(PropertyKind::Text));
        assert_eq!(classify_value("inf").kind(), Some(PropertyKind::Text));
    }

    #[test]
    fn test_classification_keeps_raw_text() {
        let value = classify_value("  1.50  ");
        assert_eq!(value.raw(), "1.50");
        assert_eq!(value.value(), Some(&TypedValue::Float(1.5)));

        // Integer overflow falls through to float
        let big = classify_value("99999999999999999999");
        assert_eq!(big.kind(), Some(PropertyKind::Float));
    }

    #[test]
    fn test_empty_value_has_no_kind() {
        let value = classify_value("   ");
        assert!(value.value().is_none());
        assert_eq!(value.raw(), "");
    }

    #[test]
    fn test_atom_symbols() {
        let line = "    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0";
        assert_eq!(atom_symbol_v2000(line), Some("C"));
        assert_eq!(atom_symbol_v2000("0.0 0.0 0.0 Cl"), Some("Cl"));
        assert_eq!(atom_symbol_v3000("M  V30 1 N 0.0 0.0 0.0 0"), Some("N"));
    }
}
