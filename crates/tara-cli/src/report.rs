//! Plain-text and JSON reports

use std::fmt::{self, Write};

use tara_config::AssessmentConfig;
use tara_core::TreeAssessment;

/// Assessment table, one row per tree
pub(crate) fn assessment_table(out: &mut String, rows: &[TreeAssessment]) -> fmt::Result {
    writeln!(
        out,
        "{:<6} {:<32} {:>6} {:>6} {:<9} {:>6} {:<9} {}",
        "ID", "Tree", "Leaves", "R", "Level", "RR", "Level", "Treatment"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<6} {:<32} {:>6} {:>6} {:<9} {:>6} {:<9} {}",
            row.id,
            truncate(&row.root_name, 32),
            row.leaf_count,
            row.risk.display(),
            row.risk.level,
            row.residual.display(),
            row.residual.level,
            row.treatment,
        )?;
    }
    let reduced = rows.iter().filter(|r| r.is_reduced()).count();
    writeln!(out)?;
    writeln!(out, "{} trees, {} with reduced residual risk", rows.len(), reduced)
}

/// Assessment as pretty JSON
pub(crate) fn assessment_json(rows: &[TreeAssessment]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

/// Short description of the active configuration
pub(crate) fn config_summary(out: &mut String, config: &AssessmentConfig) -> fmt::Result {
    writeln!(out, "Version:     {}", config.version().unwrap_or("-"))?;
    writeln!(out, "Fingerprint: {}", config.fingerprint().short())?;
    writeln!(out, "Thresholds:")?;
    for tier in config.thresholds() {
        writeln!(out, "  >= {:<5.2} {:<9} {} ({})", tier.min, tier.label_en, tier.label, tier.color)?;
    }
    writeln!(out, "Protection weights:")?;
    for (level, weight) in &config.protection_levels().weights {
        writeln!(out, "  {level:<4} {weight}")?;
    }
    writeln!(out, "Damage scenarios:")?;
    for ds in config.default_damage_scenarios() {
        writeln!(out, "  {:<4} {}", ds.id, ds.name)?;
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
