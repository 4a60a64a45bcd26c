//! Maps the reconciliation service's response bodies onto [`ReconciliationResult`].
//!
//! Deployed services disagree on the envelope: some return the canonical body flat, some
//! wrap it under `data`, and older builds send `data.summary` + `data.lineItems`. Each
//! envelope is a [`ShapeMatcher`]; the normalizer tries them in registration order and the
//! first one that claims the payload decides the outcome.

use serde_json::{Map, Value};
use shared::domain::{LineItem, ReconciliationResult, ReconciliationTotals};

use crate::error::NormalizationError;

pub trait ShapeMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means the payload is not this shape. `Some(Err(_))` means it is, but a
    /// required field is missing or unusable.
    fn try_match(&self, payload: &Value)
        -> Option<Result<ReconciliationResult, NormalizationError>>;
}

/// `{ "executiveSummary": ..., "reconciliation": { "lineItems": [...] } }`
pub struct FlatEnvelope;

/// `{ "status": "success", "data": { "executiveSummary": ..., "reconciliation": {...} } }`
pub struct DataWrappedEnvelope;

/// `{ "data": { "summary": ..., "lineItems": [...] } }`
pub struct DataSummaryEnvelope;

impl ShapeMatcher for FlatEnvelope {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn try_match(
        &self,
        payload: &Value,
    ) -> Option<Result<ReconciliationResult, NormalizationError>> {
        let body = payload.as_object()?;
        present(body, "reconciliation")?;
        Some(parse_canonical(body, self.name()))
    }
}

impl ShapeMatcher for DataWrappedEnvelope {
    fn name(&self) -> &'static str {
        "data-wrapped"
    }

    fn try_match(
        &self,
        payload: &Value,
    ) -> Option<Result<ReconciliationResult, NormalizationError>> {
        let data = payload.get("data")?.as_object()?;
        present(data, "reconciliation")?;
        Some(parse_canonical(data, self.name()))
    }
}

impl ShapeMatcher for DataSummaryEnvelope {
    fn name(&self) -> &'static str {
        "data-summary"
    }

    fn try_match(
        &self,
        payload: &Value,
    ) -> Option<Result<ReconciliationResult, NormalizationError>> {
        let data = payload.get("data")?.as_object()?;
        Some(parse_data_summary(data, self.name()))
    }
}

pub struct ResponseNormalizer {
    matchers: Vec<Box<dyn ShapeMatcher>>,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(FlatEnvelope),
            Box::new(DataWrappedEnvelope),
            Box::new(DataSummaryEnvelope),
        ])
    }
}

impl ResponseNormalizer {
    pub fn new(matchers: Vec<Box<dyn ShapeMatcher>>) -> Self {
        Self { matchers }
    }

    /// Registers `matcher` behind every matcher already present.
    pub fn with_matcher(mut self, matcher: Box<dyn ShapeMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn shape_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|matcher| matcher.name()).collect()
    }

    pub fn normalize(&self, payload: &Value) -> Result<ReconciliationResult, NormalizationError> {
        for matcher in &self.matchers {
            if let Some(outcome) = matcher.try_match(payload) {
                tracing::debug!(
                    shape = matcher.name(),
                    ok = outcome.is_ok(),
                    "response shape matched"
                );
                return outcome;
            }
        }
        Err(NormalizationError::UnrecognizedShape)
    }
}

fn parse_canonical(
    body: &Map<String, Value>,
    shape: &'static str,
) -> Result<ReconciliationResult, NormalizationError> {
    let summary = summary_text(required(body, "executiveSummary", shape)?);
    let reconciliation = required(body, "reconciliation", shape)?
        .as_object()
        .ok_or_else(|| invalid(shape, "reconciliation", "expected an object"))?;
    let line_items = line_items(
        required(reconciliation, "lineItems", shape)
            .map_err(|_| missing(shape, "reconciliation.lineItems"))?,
        shape,
    )?;
    Ok(ReconciliationResult {
        executive_summary: summary,
        line_items,
        reported_totals: reported_totals(reconciliation, shape)?,
    })
}

fn parse_data_summary(
    data: &Map<String, Value>,
    shape: &'static str,
) -> Result<ReconciliationResult, NormalizationError> {
    let summary = summary_text(required(data, "summary", shape)?);
    let line_items = line_items(required(data, "lineItems", shape)?, shape)?;
    Ok(ReconciliationResult {
        executive_summary: summary,
        line_items,
        reported_totals: reported_totals(data, shape)?,
    })
}

fn present<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    body.get(field).filter(|value| !value.is_null())
}

fn required<'a>(
    body: &'a Map<String, Value>,
    field: &str,
    shape: &'static str,
) -> Result<&'a Value, NormalizationError> {
    present(body, field).ok_or_else(|| missing(shape, field))
}

fn missing(shape: &'static str, field: &str) -> NormalizationError {
    NormalizationError::MissingField {
        shape,
        field: field.to_string(),
    }
}

fn invalid(shape: &'static str, field: &str, reason: impl Into<String>) -> NormalizationError {
    NormalizationError::InvalidField {
        shape,
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Non-string summaries are kept as pretty-printed JSON rather than dropped.
fn summary_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn line_items(value: &Value, shape: &'static str) -> Result<Vec<LineItem>, NormalizationError> {
    let entries = value
        .as_array()
        .ok_or_else(|| invalid(shape, "lineItems", "expected an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<LineItem, NormalizationError> {
            let field = |name: &str| format!("lineItems[{index}].{name}");
            let item = entry.as_object().ok_or_else(|| {
                invalid(shape, &format!("lineItems[{index}]"), "expected an object")
            })?;
            let text = |name: &str| -> Result<String, NormalizationError> {
                match present(item, name) {
                    Some(Value::String(text)) => Ok(text.clone()),
                    Some(other) => Ok(other.to_string()),
                    None => Err(missing(shape, &field(name))),
                }
            };
            let amount = |name: &str| -> Result<f64, NormalizationError> {
                let raw = present(item, name).ok_or_else(|| missing(shape, &field(name)))?;
                coerce_amount(raw).map_err(|reason| invalid(shape, &field(name), reason))
            };

            Ok(LineItem {
                description: text("description")?,
                billed: amount("billed")?,
                paid: amount("paid")?,
                status: text("status")?,
            })
        })
        .collect()
}

fn reported_totals(
    body: &Map<String, Value>,
    shape: &'static str,
) -> Result<Option<ReconciliationTotals>, NormalizationError> {
    let (Some(billed), Some(paid)) = (present(body, "totalBilled"), present(body, "totalPaid"))
    else {
        return Ok(None);
    };
    let total_billed =
        coerce_amount(billed).map_err(|reason| invalid(shape, "totalBilled", reason))?;
    let total_paid = coerce_amount(paid).map_err(|reason| invalid(shape, "totalPaid", reason))?;
    let discrepancy_amount = match present(body, "discrepancyAmount") {
        Some(raw) => coerce_signed(raw)
            .map_err(|reason| invalid(shape, "discrepancyAmount", reason))?,
        None => total_billed - total_paid,
    };
    Ok(Some(ReconciliationTotals {
        total_billed,
        total_paid,
        discrepancy_amount,
    }))
}

/// Accepts JSON numbers and numeric strings such as `"50,000"` or `"₦45000.50"`.
fn coerce_signed(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => parse_amount_text(raw),
        _ => None,
    };
    match parsed {
        Some(amount) if amount.is_finite() => Ok(amount),
        _ => Err(format!("expected a number, got {value}")),
    }
}

fn coerce_amount(value: &Value) -> Result<f64, String> {
    let amount = coerce_signed(value)?;
    if amount < 0.0 {
        return Err(format!("amount must not be negative, got {amount}"));
    }
    Ok(amount)
}

fn parse_amount_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'))
        .chars()
        .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
