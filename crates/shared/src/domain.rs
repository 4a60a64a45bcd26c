use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub billed: f64,
    pub paid: f64,
    pub status: String,
}

impl LineItem {
    pub fn shortfall(&self) -> f64 {
        self.billed - self.paid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationTotals {
    pub total_billed: f64,
    pub total_paid: f64,
    pub discrepancy_amount: f64,
}

/// Canonical reconciliation outcome. Line items keep the order the service sent them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub executive_summary: String,
    pub line_items: Vec<LineItem>,
    /// Totals as reported by the service, when it sent them.
    pub reported_totals: Option<ReconciliationTotals>,
}

impl ReconciliationResult {
    pub fn computed_totals(&self) -> ReconciliationTotals {
        let total_billed: f64 = self.line_items.iter().map(|item| item.billed).sum();
        let total_paid: f64 = self.line_items.iter().map(|item| item.paid).sum();
        ReconciliationTotals {
            total_billed,
            total_paid,
            discrepancy_amount: total_billed - total_paid,
        }
    }

    pub fn totals(&self) -> ReconciliationTotals {
        self.reported_totals.unwrap_or_else(|| self.computed_totals())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: &str, billed: f64, paid: f64) -> LineItem {
        LineItem {
            description: description.to_string(),
            billed,
            paid,
            status: "partial".to_string(),
        }
    }

    #[test]
    fn computed_totals_sum_line_items() {
        let result = ReconciliationResult {
            executive_summary: String::new(),
            line_items: vec![item("CT Scan", 50000.0, 45000.0), item("Ward", 7500.0, 0.0)],
            reported_totals: None,
        };
        let totals = result.totals();
        assert_eq!(totals.total_billed, 57500.0);
        assert_eq!(totals.total_paid, 45000.0);
        assert_eq!(totals.discrepancy_amount, 12500.0);
    }

    #[test]
    fn reported_totals_take_precedence() {
        let reported = ReconciliationTotals {
            total_billed: 1.0,
            total_paid: 1.0,
            discrepancy_amount: 0.0,
        };
        let result = ReconciliationResult {
            executive_summary: String::new(),
            line_items: vec![item("CT Scan", 50000.0, 45000.0)],
            reported_totals: Some(reported),
        };
        assert_eq!(result.totals(), reported);
        assert_eq!(result.line_items[0].shortfall(), 5000.0);
    }
}
