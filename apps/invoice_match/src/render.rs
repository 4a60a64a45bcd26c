use client_core::{NotificationMessage, Severity};
use shared::domain::ReconciliationResult;

pub fn notification_line(message: &NotificationMessage) -> String {
    let tag = match message.severity {
        Severity::Success => "success",
        Severity::Error => "error",
        Severity::Info => "info",
    };
    format!("[{tag}] {}", message.text)
}

/// Two decimals with thousands separators, e.g. `12,500.00`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

pub fn result_report(result: &ReconciliationResult) -> String {
    let mut out = String::new();
    out.push_str("Executive summary\n");
    out.push_str(&result.executive_summary);
    out.push_str("\n\n");

    let width = result
        .line_items
        .iter()
        .map(|item| item.description.chars().count())
        .max()
        .unwrap_or(0)
        .max("Description".len());
    out.push_str(&format!(
        "{:<width$}  {:>14}  {:>14}  {}\n",
        "Description", "Billed", "Paid", "Status"
    ));
    for item in &result.line_items {
        out.push_str(&format!(
            "{:<width$}  {:>14}  {:>14}  {}\n",
            item.description,
            format_amount(item.billed),
            format_amount(item.paid),
            item.status
        ));
    }

    let totals = result.totals();
    out.push('\n');
    out.push_str(&format!("Total billed:  {}\n", format_amount(totals.total_billed)));
    out.push_str(&format!("Total paid:    {}\n", format_amount(totals.total_paid)));
    out.push_str(&format!(
        "Discrepancy:   {}\n",
        format_amount(totals.discrepancy_amount)
    ));
    out
}
