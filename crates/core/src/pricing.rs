//! Validated shape of a vision-model pricing analysis.
//!
//! Model replies are free text that should contain one JSON object. The
//! parser extracts the first balanced object, deserializes it, and
//! rejects anything that fails the range checks below. A reply that does
//! not validate is an error, never a silently defaulted estimate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingAnalysis {
    pub total_price: f64,
    pub breakdown: PriceBreakdown,
    pub complexity: u8,
    #[serde(default)]
    pub surface_area: Option<f64>,
    #[serde(default)]
    pub condition_assessment: Option<ConditionAssessment>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub complexity_multiplier: f64,
    #[serde(default)]
    pub additional_fees: f64,
    #[serde(default)]
    pub labor_hours: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionAssessment {
    #[serde(default)]
    pub damage: Vec<String>,
    #[serde(default)]
    pub cleanability: Option<String>,
    #[serde(default)]
    pub existing_finish: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("model reply contained no JSON object")]
    MissingJson,
    #[error("model reply JSON did not deserialize: {0}")]
    Malformed(String),
    #[error("model reply failed validation: {0}")]
    Invalid(String),
}

impl PricingAnalysis {
    /// Parses a raw model reply into a validated analysis.
    pub fn parse_reply(reply: &str) -> Result<Self, AnalysisError> {
        let block = extract_json_block(reply).ok_or(AnalysisError::MissingJson)?;
        let analysis: Self = serde_json::from_str(block)
            .map_err(|error| AnalysisError::Malformed(error.to_string()))?;
        analysis.validate()?;
        Ok(analysis)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        ensure_money("totalPrice", self.total_price)?;
        if self.total_price <= 0.0 {
            return Err(AnalysisError::Invalid("totalPrice must be greater than zero".to_owned()));
        }

        ensure_money("breakdown.basePrice", self.breakdown.base_price)?;
        ensure_money("breakdown.additionalFees", self.breakdown.additional_fees)?;

        let multiplier = self.breakdown.complexity_multiplier;
        if !multiplier.is_finite() || !(1.0..=3.0).contains(&multiplier) {
            return Err(AnalysisError::Invalid(format!(
                "breakdown.complexityMultiplier must be in range 1.0..=3.0, got {multiplier}"
            )));
        }

        if !(1..=10).contains(&self.complexity) {
            return Err(AnalysisError::Invalid(format!(
                "complexity must be in range 1..=10, got {}",
                self.complexity
            )));
        }

        if let Some(hours) = self.breakdown.labor_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(AnalysisError::Invalid(format!(
                    "breakdown.laborHours must be non-negative, got {hours}"
                )));
            }
        }

        if let Some(area) = self.surface_area {
            if !area.is_finite() || area <= 0.0 {
                return Err(AnalysisError::Invalid(format!(
                    "surfaceArea must be positive, got {area}"
                )));
            }
        }

        Ok(())
    }

    /// Quoted total rounded to whole dollars for persistence.
    pub fn total_price_dollars(&self) -> i64 {
        self.total_price.round() as i64
    }
}

fn ensure_money(field: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::Invalid(format!("{field} must be non-negative, got {value}")));
    }
    Ok(())
}

/// Returns the first balanced `{...}` block in `input`, if any.
///
/// Brace depth is tracked outside of string literals so prose like
/// "costs {varies}" inside a JSON string does not truncate the block.
pub fn extract_json_block(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
