//! Webhook relay: normalizes provider callbacks and forwards them to the
//! transaction-confirmation endpoint.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::domain::webhook::{ProviderCallback, TransactionConfirmation};
use crate::services::DebugLogBuffer;

pub struct RelayService {
    client: reqwest::Client,
    confirm_url: String,
    debug_log: Arc<DebugLogBuffer>,
}

impl RelayService {
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        confirm_url: String,
        debug_log: Arc<DebugLogBuffer>,
    ) -> Self {
        Self {
            client,
            confirm_url,
            debug_log,
        }
    }

    /// Normalize a raw provider callback and forward it. Returns the
    /// normalized confirmation that was sent.
    pub async fn relay(&self, callback: ProviderCallback) -> Result<TransactionConfirmation> {
        let confirmation = TransactionConfirmation::from(callback);

        self.debug_log.push(
            "webhook",
            format!(
                "relaying {} ({} {} cents)",
                confirmation.external_id,
                confirmation.status.as_str(),
                confirmation.amount_cents
            ),
        );

        let response = self
            .client
            .post(&self.confirm_url)
            .json(&confirmation)
            .send()
            .await
            .context("Failed to reach confirmation endpoint")?;

        let status = response.status();
        if !status.is_success() {
            self.debug_log.push(
                "webhook",
                format!(
                    "confirmation endpoint rejected {}: {status}",
                    confirmation.external_id
                ),
            );
            bail!("Confirmation endpoint returned {status}");
        }

        tracing::debug!(
            external_id = %confirmation.external_id,
            "Webhook relayed"
        );

        Ok(confirmation)
    }
}
