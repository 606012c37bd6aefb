//! Treatment decisions and their aggregation

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Node;

/// Disposition applied to a leaf risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Treatment {
    /// No decision recorded
    #[default]
    None,
    /// Reduced by a control; residual values replace the original ones
    Mitigated,
    /// Accepted as is
    Accepted,
    /// Transferred to another party
    Delegated,
}

impl Treatment {
    /// Document label
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::Mitigated => "Mitigiert",
            Self::Accepted => "Akzeptiert",
            Self::Delegated => "Delegiert",
        }
    }

    /// Parse a document value
    ///
    /// German and English spellings are accepted in any case. Empty input and
    /// `-` mean no treatment; unrecognised values are logged and treated the same.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "-" => Self::None,
            "mitigiert" | "mitigated" => Self::Mitigated,
            "akzeptiert" | "accepted" => Self::Accepted,
            "delegiert" | "delegated" => Self::Delegated,
            other => {
                tracing::warn!("Unknown treatment '{}' treated as untreated", other);
                Self::None
            }
        }
    }

    /// Check if the residual values of the leaf take effect
    #[inline]
    #[must_use]
    pub const fn reduces_exposure(self) -> bool {
        matches!(self, Self::Mitigated)
    }
}

impl Display for Treatment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Treatment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Treatment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// One label summarising all leaf treatments below a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreatmentSummary {
    /// Every treated leaf shares this treatment (or none is treated)
    Uniform(Treatment),
    /// At least two distinct treatments are present
    Mixed,
}

impl TreatmentSummary {
    /// Label shown in reports
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uniform(t) => t.label(),
            Self::Mixed => "Gemischt",
        }
    }

    /// Summarise a set of treatments
    ///
    /// Untreated leaves are dropped when any other treatment is present.
    #[must_use]
    pub fn from_treatments(treatments: impl IntoIterator<Item = Treatment>) -> Self {
        let mut set: BTreeSet<Treatment> = treatments.into_iter().collect();
        if set.len() > 1 {
            set.remove(&Treatment::None);
        }
        let mut iter = set.into_iter();
        match (iter.next(), iter.next()) {
            (None, _) => Self::Uniform(Treatment::None),
            (Some(only), None) => Self::Uniform(only),
            (Some(_), Some(_)) => Self::Mixed,
        }
    }

    /// Summarise every leaf reachable from a node
    #[must_use]
    pub fn of_node(node: &Node) -> Self {
        let mut treatments = Vec::new();
        node.for_each_leaf(&mut |leaf| treatments.push(leaf.rr.treatment));
        Self::from_treatments(treatments)
    }
}

impl Display for TreatmentSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TreatmentSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_both_languages() {
        assert_eq!(Treatment::parse("Mitigiert"), Treatment::Mitigated);
        assert_eq!(Treatment::parse(" mitigated "), Treatment::Mitigated);
        assert_eq!(Treatment::parse("AKZEPTIERT"), Treatment::Accepted);
        assert_eq!(Treatment::parse("delegated"), Treatment::Delegated);
        assert_eq!(Treatment::parse(""), Treatment::None);
        assert_eq!(Treatment::parse("-"), Treatment::None);
        assert_eq!(Treatment::parse("whatever"), Treatment::None);
    }

    #[test]
    fn serde_uses_document_labels() {
        assert_eq!(serde_json::to_string(&Treatment::Accepted).unwrap(), "\"Akzeptiert\"");
        let t: Treatment = serde_json::from_str("null").unwrap();
        assert_eq!(t, Treatment::None);
        let t: Treatment = serde_json::from_str("\"Delegiert\"").unwrap();
        assert_eq!(t, Treatment::Delegated);
    }

    #[test]
    fn only_mitigation_reduces_exposure() {
        assert!(Treatment::Mitigated.reduces_exposure());
        assert!(!Treatment::Accepted.reduces_exposure());
        assert!(!Treatment::Delegated.reduces_exposure());
        assert!(!Treatment::None.reduces_exposure());
    }

    #[test]
    fn summary_rules() {
        use Treatment::*;
        assert_eq!(TreatmentSummary::from_treatments([]), TreatmentSummary::Uniform(None));
        assert_eq!(TreatmentSummary::from_treatments([None, None]), TreatmentSummary::Uniform(None));
        assert_eq!(
            TreatmentSummary::from_treatments([Mitigated, Mitigated]),
            TreatmentSummary::Uniform(Mitigated)
        );
        assert_eq!(
            TreatmentSummary::from_treatments([None, Accepted]),
            TreatmentSummary::Uniform(Accepted)
        );
        assert_eq!(
            TreatmentSummary::from_treatments([Mitigated, None, Accepted]),
            TreatmentSummary::Mixed
        );
        assert_eq!(TreatmentSummary::Mixed.label(), "Gemischt");
        assert_eq!(TreatmentSummary::Uniform(None).label(), "-");
    }
}
