use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

use crate::transport::MultipartFieldNames;

pub const DEFAULT_SETTINGS_FILE: &str = "invoice_match.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub invoice_field: String,
    pub payout_field: String,
    pub request_timeout_secs: u64,
    pub notification_dismiss_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let fields = MultipartFieldNames::default();
        Self {
            endpoint: "http://127.0.0.1:8000/reconcile".into(),
            invoice_field: fields.invoice,
            payout_field: fields.payout_summary,
            request_timeout_secs: 60,
            notification_dismiss_ms: 4000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    invoice_field: Option<String>,
    payout_field: Option<String>,
    request_timeout_secs: Option<u64>,
    notification_dismiss_ms: Option<u64>,
}

impl ClientSettings {
    pub fn field_names(&self) -> MultipartFieldNames {
        MultipartFieldNames {
            invoice: self.invoice_field.clone(),
            payout_summary: self.payout_field.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_dismiss_after(&self) -> Duration {
        Duration::from_millis(self.notification_dismiss_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("invalid reconciliation endpoint '{}'", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("reconciliation endpoint must be http(s), got '{}'", self.endpoint);
        }
        if self.invoice_field.trim().is_empty() || self.payout_field.trim().is_empty() {
            bail!("multipart field names must not be empty");
        }
        if self.invoice_field == self.payout_field {
            bail!(
                "invoice and payout summary must use distinct field names, both are '{}'",
                self.invoice_field
            );
        }
        Ok(())
    }

    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.endpoint {
            self.endpoint = v;
        }
        if let Some(v) = file_cfg.invoice_field {
            self.invoice_field = v;
        }
        if let Some(v) = file_cfg.payout_field {
            self.payout_field = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.notification_dismiss_ms {
            self.notification_dismiss_ms = v;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("INVOICE_MATCH_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = var("APP__ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = var("APP__INVOICE_FIELD") {
            self.invoice_field = v;
        }
        if let Some(v) = var("APP__PAYOUT_FIELD") {
            self.payout_field = v;
        }
        if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = parsed,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
            }
        }
        if let Some(v) = var("APP__NOTIFICATION_DISMISS_MS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.notification_dismiss_ms = parsed,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid APP__NOTIFICATION_DISMISS_MS"),
            }
        }
    }
}

/// Defaults, then the TOML file at `path` if it exists, then environment overrides.
pub fn load_settings(path: impl AsRef<Path>) -> anyhow::Result<ClientSettings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: impl AsRef<Path>,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let path = path.as_ref();
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        settings.apply_file(file_cfg);
    }

    settings.apply_env(var);
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
