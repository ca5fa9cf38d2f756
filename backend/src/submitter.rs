use anyhow::{Context, Result};
use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{FailedConsignment, Manifest, UploadResponse};

#[async_trait::async_trait]
pub trait ManifestSubmitter: Send + Sync {
    /// Uploads `manifest` and returns the tracking codes the carrier assigned
    async fn submit(&self, manifest: &Manifest) -> Result<Vec<String>, UpstreamError>;
}

pub struct PalletforceSubmitter {
    upload_url: String,
    http_client: HttpClient,
}

impl PalletforceSubmitter {
    pub fn new(upload_url: String, http_client: HttpClient) -> Self {
        Self {
            upload_url,
            http_client,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.carrier_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::new(config.carrier_url.clone(), http_client))
    }
}

#[async_trait::async_trait]
impl ManifestSubmitter for PalletforceSubmitter {
    async fn submit(&self, manifest: &Manifest) -> Result<Vec<String>, UpstreamError> {
        let response = self
            .http_client
            .post(&self.upload_url)
            .json(manifest)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let upload: UploadResponse = match serde_json::from_str(&body) {
            Ok(upload) => upload,
            Err(source) => return Err(UpstreamError::Decode { source, body }),
        };

        if !upload.success || !upload.failed_consignments.is_empty() {
            let mut failures: Vec<String> = upload
                .failed_consignments
                .iter()
                .flat_map(describe_failure)
                .collect();

            if failures.is_empty() {
                failures.push("carrier reported success=false without a reason".to_string());
            }

            for failure in &failures {
                tracing::error!(
                    transaction = %manifest.unique_transaction_number,
                    "Carrier failure: {}",
                    failure
                );
            }

            return Err(UpstreamError::Rejected { failures, body });
        }

        Ok(upload.tracking_codes)
    }
}

/// One line per reason, carrier text kept as sent
fn describe_failure(failed: &FailedConsignment) -> Vec<String> {
    let consignment = failed.consignment_number.as_deref().unwrap_or("unknown consignment");

    if failed.reasons.is_empty() {
        return vec![format!("{}: no reason given", consignment)];
    }

    failed
        .reasons
        .iter()
        .map(|reason| match reason {
            Value::String(text) => format!("{}: {}", consignment, text),
            other => format!("{}: {}", consignment, other),
        })
        .collect()
}
