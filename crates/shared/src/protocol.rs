use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{LineItem, ReconciliationResult};

pub const DEFAULT_INVOICE_FIELD: &str = "invoice_file";
pub const DEFAULT_PAYOUT_SUMMARY_FIELD: &str = "payout_summary_file";

/// Body fields that may carry a human-readable failure message, in lookup order.
pub const FAILURE_MESSAGE_FIELDS: &[&str] = &["detail", "message", "error", "status"];

/// Shape (a): the canonical success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEnvelope {
    pub executive_summary: String,
    pub reconciliation: CanonicalReconciliation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalReconciliation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_billed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy_amount: Option<f64>,
    pub line_items: Vec<LineItem>,
}

impl From<&ReconciliationResult> for CanonicalEnvelope {
    fn from(result: &ReconciliationResult) -> Self {
        let totals = result.reported_totals;
        Self {
            executive_summary: result.executive_summary.clone(),
            reconciliation: CanonicalReconciliation {
                total_billed: totals.map(|t| t.total_billed),
                total_paid: totals.map(|t| t.total_paid),
                discrepancy_amount: totals.map(|t| t.discrepancy_amount),
                line_items: result.line_items.clone(),
            },
        }
    }
}

impl ReconciliationResult {
    pub fn to_canonical_json(&self) -> Value {
        serde_json::to_value(CanonicalEnvelope::from(self)).unwrap_or(Value::Null)
    }
}

/// Pulls a user-facing failure message out of an error body.
///
/// FastAPI validation errors arrive as `{"detail": [{"msg": ...}, ...]}`; their
/// messages are joined with "; ".
pub fn failure_message(body: &Value) -> Option<String> {
    FAILURE_MESSAGE_FIELDS
        .iter()
        .filter_map(|field| body.get(*field))
        .find_map(message_text)
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Array(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::Object(_) => entry.get("msg").and_then(message_text),
                    other => message_text(other),
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(_) => value.get("message").and_then(message_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::ReconciliationTotals;

    #[test]
    fn detail_string_wins_over_status() {
        let body = json!({"detail": "Invalid file format", "status": "error"});
        assert_eq!(failure_message(&body).as_deref(), Some("Invalid file format"));
    }

    #[test]
    fn status_is_used_when_nothing_else_is_present() {
        let body = json!({"status": "Quota exceeded"});
        assert_eq!(failure_message(&body).as_deref(), Some("Quota exceeded"));
    }

    #[test]
    fn joins_fastapi_validation_messages() {
        let body = json!({
            "detail": [
                {"loc": ["body", "invoice_file"], "msg": "field required", "type": "value_error.missing"},
                {"loc": ["body", "payout_summary_file"], "msg": "field required", "type": "value_error.missing"}
            ]
        });
        assert_eq!(
            failure_message(&body).as_deref(),
            Some("field required; field required")
        );
    }

    #[test]
    fn blank_or_missing_message_yields_none() {
        assert_eq!(failure_message(&json!({"detail": "   "})), None);
        assert_eq!(failure_message(&json!({"unrelated": 1})), None);
        assert_eq!(failure_message(&json!([1, 2, 3])), None);
    }

    #[test]
    fn canonical_json_omits_absent_totals() {
        let result = ReconciliationResult {
            executive_summary: "ok".to_string(),
            line_items: vec![],
            reported_totals: None,
        };
        let value = result.to_canonical_json();
        assert_eq!(value, json!({"executiveSummary": "ok", "reconciliation": {"lineItems": []}}));

        let with_totals = ReconciliationResult {
            reported_totals: Some(ReconciliationTotals {
                total_billed: 10.0,
                total_paid: 4.0,
                discrepancy_amount: 6.0,
            }),
            ..result
        };
        assert_eq!(
            with_totals.to_canonical_json()["reconciliation"]["discrepancyAmount"],
            json!(6.0)
        );
    }
}
