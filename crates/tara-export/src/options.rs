//! Rendering options

use indexmap::IndexMap;

/// Fill colours keyed by risk classification (`labelEn`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    fills: IndexMap<String, String>,
    unknown: String,
}

impl Default for Palette {
    fn default() -> Self {
        let fills = [
            ("critical", "#ffcccc"),
            ("high", "#ffe0b3"),
            ("medium", "#ffffcc"),
            ("low", "#ccffcc"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            fills,
            unknown: "#d6dbdf".to_string(),
        }
    }
}

impl Palette {
    /// Override or add the fill for a classification
    #[must_use]
    pub fn with_fill(mut self, level: impl Into<String>, color: impl Into<String>) -> Self {
        self.fills.insert(level.into(), color.into());
        self
    }

    /// Set the fill used when no score can be computed
    #[must_use]
    pub fn with_unknown(mut self, color: impl Into<String>) -> Self {
        self.unknown = color.into();
        self
    }

    /// Fill for a classification; unknown when `None` or not in the palette
    #[must_use]
    pub fn fill(&self, level: Option<&str>) -> &str {
        level
            .and_then(|l| self.fills.get(l))
            .map_or(self.unknown.as_str(), String::as_str)
    }
}

/// DOT rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotOptions {
    /// Only render the tree with this uid or display id
    pub tree: Option<String>,
    /// Decimal separator for numbers in labels
    pub decimal_separator: char,
    /// Node fill colours
    pub palette: Palette,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            tree: None,
            decimal_separator: ',',
            palette: Palette::default(),
        }
    }
}

impl DotOptions {
    /// Restrict output to one tree
    #[must_use]
    pub fn tree(mut self, key: impl Into<String>) -> Self {
        self.tree = Some(key.into());
        self
    }

    /// Set the decimal separator
    #[must_use]
    pub fn decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }
}
