//! Rule-based explanation generator.
//!
//! A fixed, clinically reviewable table of marker conditions layered on top
//! of the black-box prediction. Each triggered rule contributes one phrase;
//! output order is table order, not confidence order. Pure function.

use crate::models::{MarkerRow, MarkerStatus};

/// Condition a rule checks against one marker column.
#[derive(Debug, Clone, Copy)]
pub enum RuleCondition {
    /// Quantitative marker strictly above a threshold. NaN never triggers.
    Exceeds(f64),
    /// Categorical marker equal to "Positive".
    IsPositive,
}

/// One row of the explanation rule table.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationRule {
    pub marker: &'static str,
    pub condition: RuleCondition,
    pub phrase: &'static str,
}

/// Rheumatic-disease marker rules, in evaluation order. Thresholds and
/// phrases are domain constants from the training dataset's clinical notes;
/// review with a clinician before extending.
pub const EXPLANATION_RULES: [ExplanationRule; 5] = [
    ExplanationRule {
        marker: "Anti-CCP",
        condition: RuleCondition::Exceeds(20.0),
        phrase: "High Anti-CCP levels (specific to Rheumatoid Arthritis)",
    },
    ExplanationRule {
        marker: "RF",
        condition: RuleCondition::Exceeds(20.0),
        phrase: "Elevated Rheumatoid Factor",
    },
    ExplanationRule {
        marker: "HLA-B27",
        condition: RuleCondition::IsPositive,
        phrase: "Positive HLA-B27 marker",
    },
    ExplanationRule {
        marker: "ANA",
        condition: RuleCondition::IsPositive,
        phrase: "Positive Antinuclear Antibody (ANA)",
    },
    ExplanationRule {
        marker: "Anti-dsDNA",
        condition: RuleCondition::IsPositive,
        phrase: "Positive Anti-dsDNA (suggestive of Lupus)",
    },
];

fn rule_triggers(rule: &ExplanationRule, row: &MarkerRow) -> bool {
    match rule.condition {
        RuleCondition::Exceeds(threshold) => {
            row.number(rule.marker).is_some_and(|v| v > threshold)
        }
        RuleCondition::IsPositive => {
            row.category(rule.marker) == Some(MarkerStatus::Positive.as_str())
        }
    }
}

/// Build the natural-language rationale for a prediction.
pub fn generate_explanation(row: &MarkerRow, prediction: &str, confidence: f64) -> String {
    let reasons: Vec<&'static str> = EXPLANATION_RULES
        .iter()
        .filter(|rule| rule_triggers(rule, row))
        .map(|rule| rule.phrase)
        .collect();

    if reasons.is_empty() {
        format!(
            "The model predicts {prediction} with {:.1}% confidence based on the overall symptom pattern.",
            confidence * 100.0
        )
    } else {
        format!(
            "The model predicts {prediction} ({:.1}% confidence).\n\nKey contributing factors:\n- {}",
            confidence * 100.0,
            reasons.join("\n- ")
        )
    }
}
