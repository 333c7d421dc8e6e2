use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::webhook::{ConfirmationStatus, TransactionConfirmation};
use crate::entities::transactions;

pub use crate::entities::transactions::Model as TransactionRecord;

/// Result of applying a confirmation: whether this call actually transitioned
/// the transaction, and which wallet (if any) should be credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmOutcome {
    pub applied: bool,
    pub credit: Option<(i32, i64)>,
}

pub struct TransactionRepository {
    conn: DatabaseConnection,
}

impl TransactionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create_pending(
        &self,
        user_id: i32,
        external_id: &str,
        amount_cents: i64,
        currency: &str,
        payer_name: Option<&str>,
        payer_document: Option<&str>,
    ) -> Result<TransactionRecord> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = transactions::ActiveModel {
            user_id: Set(Some(user_id)),
            external_id: Set(external_id.to_string()),
            amount_cents: Set(amount_cents),
            currency: Set(currency.to_string()),
            status: Set("pending".to_string()),
            payer_name: Set(payer_name.map(ToString::to_string)),
            payer_document: Set(payer_document.map(ToString::to_string)),
            created_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert transaction")
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<TransactionRecord>> {
        transactions::Entity::find()
            .filter(transactions::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await
            .context("Failed to query transaction")
    }

    /// Apply a normalized confirmation keyed by `external_id`.
    ///
    /// Idempotent by design: a transaction already in a terminal state is left
    /// untouched and reported as not applied. A confirmation for an unknown
    /// `external_id` (callback raced ahead of local creation) inserts the
    /// record directly in its terminal state, with no wallet owner.
    pub async fn apply_confirmation(
        &self,
        confirmation: &TransactionConfirmation,
    ) -> Result<ConfirmOutcome> {
        let now = chrono::Utc::now().to_rfc3339();
        let status = confirmation.status.as_str();

        let existing = self.get_by_external_id(&confirmation.external_id).await?;

        let Some(existing) = existing else {
            let active = transactions::ActiveModel {
                user_id: Set(None),
                external_id: Set(confirmation.external_id.clone()),
                amount_cents: Set(confirmation.amount_cents),
                currency: Set(confirmation.currency.clone()),
                status: Set(status.to_string()),
                created_at: Set(now.clone()),
                confirmed_at: Set(matches!(
                    confirmation.status,
                    ConfirmationStatus::Confirmed
                )
                .then_some(now)),
                ..Default::default()
            };
            active
                .insert(&self.conn)
                .await
                .context("Failed to insert confirmed transaction")?;

            return Ok(ConfirmOutcome {
                applied: true,
                credit: None,
            });
        };

        if existing.status != "pending" {
            return Ok(ConfirmOutcome {
                applied: false,
                credit: None,
            });
        }

        let credit = match confirmation.status {
            ConfirmationStatus::Confirmed => {
                existing.user_id.map(|uid| (uid, existing.amount_cents))
            }
            ConfirmationStatus::Pending | ConfirmationStatus::Failed => None,
        };

        // A pending confirmation carries no transition
        if confirmation.status == ConfirmationStatus::Pending {
            return Ok(ConfirmOutcome {
                applied: false,
                credit: None,
            });
        }

        let mut active: transactions::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        if confirmation.status == ConfirmationStatus::Confirmed {
            active.confirmed_at = Set(Some(now));
        }
        active.update(&self.conn).await?;

        Ok(ConfirmOutcome {
            applied: true,
            credit,
        })
    }
}
