use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use client_core::{
    config::DEFAULT_SETTINGS_FILE, is_accepted_file, load_settings, selection_filter,
    ReconciliationController, SelectedFile, SlotKind, SubmitOutcome,
};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(about = "Reconcile a hospital invoice against an insurer payout summary")]
struct Args {
    /// Hospital invoice document.
    #[arg(long)]
    invoice: PathBuf,
    /// Insurer payout summary document.
    #[arg(long)]
    payout_summary: PathBuf,
    /// Reconciliation endpoint; overrides the settings file and environment.
    #[arg(long)]
    endpoint: Option<String>,
    /// Multipart field name for the invoice part.
    #[arg(long)]
    invoice_field: Option<String>,
    /// Multipart field name for the payout summary part.
    #[arg(long)]
    payout_field: Option<String>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Print the canonical JSON result instead of a table.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(field) = args.invoice_field {
        settings.invoice_field = field;
    }
    if let Some(field) = args.payout_field {
        settings.payout_field = field;
    }
    settings.validate()?;

    let controller = ReconciliationController::from_settings(&settings)?;
    for (slot, path) in [
        (SlotKind::HospitalInvoice, &args.invoice),
        (SlotKind::InsurerPayoutSummary, &args.payout_summary),
    ] {
        if !is_accepted_file(path) {
            bail!(
                "{} must be one of {}: '{}'",
                slot.label(),
                selection_filter(),
                path.display()
            );
        }
        controller.select_file(slot, SelectedFile::from_path(path).await?);
    }

    tracing::info!(endpoint = %settings.endpoint, "submitting documents for reconciliation");
    let outcome = controller.submit().await;
    if let Some(notification) = controller.snapshot().notification {
        eprintln!("{}", render::notification_line(&notification));
    }

    match outcome {
        SubmitOutcome::Succeeded(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result.to_canonical_json())?);
            } else {
                print!("{}", render::result_report(&result));
            }
            Ok(())
        }
        SubmitOutcome::Failed(err) | SubmitOutcome::Rejected(err) => {
            let category = err.category();
            Err(anyhow!(err).context(format!("reconciliation failed ({category:?})")))
        }
        SubmitOutcome::Busy | SubmitOutcome::Superseded => {
            bail!("reconciliation did not complete")
        }
    }
}
