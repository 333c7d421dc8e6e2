use serde::{Deserialize, Serialize};

/// Raw cash-in provider callback.
///
/// Providers in this family are inconsistent about field casing and send the
/// same payload as either `camelCase` or `PascalCase`; both spellings of each
/// field deserialize into the same value.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCallback {
    #[serde(alias = "externalId", alias = "ExternalId", alias = "orderId", alias = "OrderId")]
    pub external_id: String,

    #[serde(default, alias = "Status", alias = "transactionStatus", alias = "TransactionStatus")]
    pub status: Option<String>,

    #[serde(alias = "value", alias = "Value", alias = "amount", alias = "Amount")]
    pub amount_cents: i64,

    #[serde(default, alias = "Currency")]
    pub currency: Option<String>,

    #[serde(default, alias = "payerName", alias = "PayerName")]
    pub payer_name: Option<String>,

    #[serde(default, alias = "payerDocument", alias = "PayerDocument")]
    pub payer_document: Option<String>,
}

/// Terminal status carried in a normalized confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Failed,
}

impl ConfirmationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

/// The one internal shape the relay forwards, regardless of which field-name
/// variant the provider used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConfirmation {
    pub external_id: String,
    pub status: ConfirmationStatus,
    pub amount_cents: i64,
    pub currency: String,
}

impl From<ProviderCallback> for TransactionConfirmation {
    fn from(cb: ProviderCallback) -> Self {
        Self {
            external_id: cb.external_id,
            status: normalize_status(cb.status.as_deref()),
            amount_cents: cb.amount_cents,
            currency: cb.currency.unwrap_or_else(|| "BRL".to_string()),
        }
    }
}

/// Providers report completion under several labels; a cash-in callback with
/// no status at all means the payment settled.
fn normalize_status(raw: Option<&str>) -> ConfirmationStatus {
    let Some(raw) = raw else {
        return ConfirmationStatus::Confirmed;
    };

    match raw.to_ascii_uppercase().as_str() {
        "PAID" | "COMPLETED" | "CONFIRMED" | "APPROVED" | "SUCCESS" => {
            ConfirmationStatus::Confirmed
        }
        "FAILED" | "CANCELED" | "CANCELLED" | "REFUSED" | "EXPIRED" => ConfirmationStatus::Failed,
        _ => ConfirmationStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_and_pascal_variants_normalize_identically() {
        let camel: ProviderCallback =
            serde_json::from_value(serde_json::json!({"externalId": "x", "value": 1000}))
                .unwrap();
        let pascal: ProviderCallback =
            serde_json::from_value(serde_json::json!({"ExternalId": "x", "Value": 1000}))
                .unwrap();

        assert_eq!(
            TransactionConfirmation::from(camel),
            TransactionConfirmation::from(pascal)
        );
    }

    #[test]
    fn missing_status_means_confirmed() {
        let cb: ProviderCallback =
            serde_json::from_value(serde_json::json!({"ExternalId": "x", "Value": 250}))
                .unwrap();
        let confirmation = TransactionConfirmation::from(cb);

        assert_eq!(confirmation.status, ConfirmationStatus::Confirmed);
        assert_eq!(confirmation.currency, "BRL");
        assert_eq!(confirmation.amount_cents, 250);
    }

    #[test]
    fn provider_status_labels_collapse() {
        for label in ["PAID", "paid", "Completed", "SUCCESS"] {
            assert_eq!(normalize_status(Some(label)), ConfirmationStatus::Confirmed);
        }
        for label in ["FAILED", "canceled", "Cancelled", "EXPIRED"] {
            assert_eq!(normalize_status(Some(label)), ConfirmationStatus::Failed);
        }
        assert_eq!(
            normalize_status(Some("PROCESSING")),
            ConfirmationStatus::Pending
        );
    }

    #[test]
    fn confirmation_serializes_camel_case() {
        let confirmation = TransactionConfirmation {
            external_id: "ord-1".to_string(),
            status: ConfirmationStatus::Confirmed,
            amount_cents: 1000,
            currency: "BRL".to_string(),
        };

        let value = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(value["externalId"], "ord-1");
        assert_eq!(value["amountCents"], 1000);
        assert_eq!(value["status"], "confirmed");
    }
}
