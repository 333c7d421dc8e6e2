//! HTTP client for the third-party cash-in provider.
//!
//! Two endpoints are used: `POST /transaction/qrcode/cashin` to create a PIX
//! QR-code charge and `GET /transaction/get/balance` for the account balance,
//! both authenticated with a static bearer token. Amounts are integer cents
//! on the wire.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,

    pub bearer_token: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cashin.example".to_string(),
            bearer_token: "change-me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashinRequest {
    pub external_id: String,

    /// Charge amount in integer BRL cents
    pub value: i64,

    pub payer_name: String,

    pub payer_document: String,
}

/// Provider response for a created charge. The provider family is
/// inconsistent about casing, so both spellings are accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashinCharge {
    #[serde(alias = "TransactionId")]
    pub transaction_id: String,

    #[serde(alias = "ExternalId")]
    pub external_id: String,

    #[serde(alias = "QrCode", alias = "qrcode")]
    pub qr_code: String,

    #[serde(default, alias = "CopyPaste", alias = "copyPaste")]
    pub copy_paste: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBalance {
    #[serde(alias = "Available", alias = "availableCents")]
    pub available: i64,

    #[serde(default, alias = "Blocked", alias = "blockedCents")]
    pub blocked: i64,
}

pub struct CashinProviderClient {
    config: ProviderConfig,
    client: Client,
}

impl CashinProviderClient {
    #[must_use]
    pub const fn with_shared_client(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Create a PIX QR-code cash-in charge.
    pub async fn create_cashin(&self, request: &CashinRequest) -> Result<CashinCharge> {
        let response = self
            .client
            .post(self.url("/transaction/qrcode/cashin"))
            .bearer_auth(&self.config.bearer_token)
            .json(request)
            .send()
            .await
            .context("Failed to reach cash-in provider")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Cash-in provider rejected charge: {body}");
            bail!("Cash-in provider returned {status}");
        }

        response
            .json::<CashinCharge>()
            .await
            .context("Failed to decode cash-in provider response")
    }

    /// Fetch the provider-side account balance.
    pub async fn get_balance(&self) -> Result<ProviderBalance> {
        let response = self
            .client
            .get(self.url("/transaction/get/balance"))
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await
            .context("Failed to reach cash-in provider")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Cash-in provider returned {status}");
        }

        response
            .json::<ProviderBalance>()
            .await
            .context("Failed to decode cash-in provider balance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_decodes_both_casings() {
        let camel: CashinCharge = serde_json::from_value(serde_json::json!({
            "transactionId": "t1", "externalId": "e1", "qrCode": "00020126..."
        }))
        .unwrap();
        let pascal: CashinCharge = serde_json::from_value(serde_json::json!({
            "TransactionId": "t1", "ExternalId": "e1", "QrCode": "00020126..."
        }))
        .unwrap();

        assert_eq!(camel.transaction_id, pascal.transaction_id);
        assert_eq!(camel.qr_code, pascal.qr_code);
    }
}
