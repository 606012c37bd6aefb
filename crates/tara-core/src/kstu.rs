//! Likelihood values (K, S, T, U)
//!
//! Values are kept as the strings the analyst entered so that "no data"
//! (empty) stays distinguishable from zero. Arithmetic parses on demand and
//! treats anything unparsable as unset.

use serde::{Deserialize, Deserializer, Serialize};

use tara_config::{Dimension, NO_VALUE};

/// Parse a likelihood or impact value
///
/// Accepts `.` or `,` as decimal separator. Empty, non-numeric and
/// non-finite input is unset.
#[must_use]
pub fn parse_level(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Shortest decimal form of a value (`0.5`, `1`)
#[inline]
#[must_use]
pub fn format_level(value: f64) -> String {
    format!("{value}")
}

/// The four likelihood values of a node or leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kstu {
    /// Knowledge / complexity
    #[serde(default, deserialize_with = "lenient_string")]
    pub k: String,
    /// Scaling
    #[serde(default, deserialize_with = "lenient_string")]
    pub s: String,
    /// Time / effort
    #[serde(default, deserialize_with = "lenient_string")]
    pub t: String,
    /// Utility
    #[serde(default, deserialize_with = "lenient_string")]
    pub u: String,
}

impl Kstu {
    /// Build from four raw strings
    pub fn new(
        k: impl Into<String>,
        s: impl Into<String>,
        t: impl Into<String>,
        u: impl Into<String>,
    ) -> Self {
        Self {
            k: k.into(),
            s: s.into(),
            t: t.into(),
            u: u.into(),
        }
    }

    /// Build from four numbers
    #[must_use]
    pub fn from_values(k: f64, s: f64, t: f64, u: f64) -> Self {
        Self::new(format_level(k), format_level(s), format_level(t), format_level(u))
    }

    /// All dimensions unset
    #[inline]
    #[must_use]
    pub fn unset() -> Self {
        Self::default()
    }

    /// Raw value of a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::K => &self.k,
            Dimension::S => &self.s,
            Dimension::T => &self.t,
            Dimension::U => &self.u,
        }
    }

    /// Mutable raw value of a dimension
    #[inline]
    pub fn get_mut(&mut self, dimension: Dimension) -> &mut String {
        match dimension {
            Dimension::K => &mut self.k,
            Dimension::S => &mut self.s,
            Dimension::T => &mut self.t,
            Dimension::U => &mut self.u,
        }
    }

    /// Parsed value of a dimension
    #[inline]
    #[must_use]
    pub fn value(&self, dimension: Dimension) -> Option<f64> {
        parse_level(self.get(dimension))
    }

    /// Sum of all dimensions, unset counting as 0
    #[must_use]
    pub fn sum(&self) -> f64 {
        Dimension::ALL
            .iter()
            .filter_map(|d| self.value(*d))
            .sum()
    }

    /// Check if no dimension has a numeric value
    #[must_use]
    pub fn is_unset(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.value(*d).is_none())
    }

    /// `k / s / t / u` with `-` for unset dimensions
    #[must_use]
    pub fn display(&self, decimal_separator: char) -> String {
        Dimension::ALL
            .iter()
            .map(|d| display_raw(self.get(*d), decimal_separator))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Raw value with `.` replaced by the separator, `-` when empty
#[must_use]
pub fn display_raw(raw: &str, decimal_separator: char) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NO_VALUE.to_string()
    } else {
        trimmed.replace('.', decimal_separator.encode_utf8(&mut [0; 4]))
    }
}

/// Per-dimension maximum accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorstCase {
    max: [Option<f64>; 4],
}

impl WorstCase {
    /// Observe one set of values; unparsable dimensions are ignored
    pub fn observe(&mut self, kstu: &Kstu) {
        for (slot, dimension) in self.max.iter_mut().zip(Dimension::ALL) {
            if let Some(v) = kstu.value(dimension) {
                *slot = Some(slot.map_or(v, |m| m.max(v)));
            }
        }
    }

    /// Finish into a [`Kstu`]; dimensions never observed stay empty
    #[must_use]
    pub fn finish(self) -> Kstu {
        let [k, s, t, u] = self.max.map(|m| m.map(format_level).unwrap_or_default());
        Kstu { k, s, t, u }
    }
}

/// Accept strings, numbers and null for a value field
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
