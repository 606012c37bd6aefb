//! Risk score `R = I(N) * (K + S + T + U)`

use serde::Serialize;

use tara_config::AssessmentConfig;

use crate::kstu::Kstu;

/// Round half away from zero to 2 decimals
#[inline]
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Risk score of a likelihood set under an impact; unset values count as 0
#[must_use]
pub fn risk_score(i_norm: Option<f64>, kstu: &Kstu) -> f64 {
    round2(i_norm.unwrap_or(0.0) * kstu.sum())
}

/// Score with a decimal separator, 2 decimals
#[must_use]
pub fn format_score(score: f64, decimal_separator: char) -> String {
    let formatted = format!("{score:.2}");
    if decimal_separator == '.' {
        formatted
    } else {
        formatted.replace('.', &decimal_separator.to_string())
    }
}

/// Scored view of a node or tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// Likelihood values the score is based on
    pub kstu: Kstu,
    /// Impact
    pub i_norm: Option<f64>,
    /// Rounded score
    pub value: f64,
    /// Classification key of the threshold tier
    pub level: String,
}

impl Score {
    /// Score and classify
    #[must_use]
    pub fn compute(config: &AssessmentConfig, i_norm: Option<f64>, kstu: &Kstu) -> Self {
        let value = risk_score(i_norm, kstu);
        Self {
            kstu: kstu.clone(),
            i_norm,
            value,
            level: config.classify(value).label_en.clone(),
        }
    }

    /// Score formatted with 2 decimals
    #[inline]
    #[must_use]
    pub fn display(&self) -> String {
        format_score(self.value, '.')
    }
}
