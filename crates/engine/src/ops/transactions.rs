//! Ledger append and the recent-entries read path.

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{NewTransaction, ResultEngine, Transaction, transactions};

use super::{Engine, categories::require_category, normalize_optional_text, with_tx};

const DEFAULT_RECENT_LIMIT: u64 = 50;
const MAX_RECENT_LIMIT: u64 = 200;

impl Engine {
    /// Append a one-off ledger entry.
    pub async fn append_transaction(&self, cmd: NewTransaction) -> ResultEngine<Transaction> {
        let description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            if let Some(category_id) = cmd.category_id {
                require_category(&db_tx, &cmd.user_id, category_id).await?;
            }
            let entry = Transaction::new(
                cmd.user_id.clone(),
                cmd.amount_minor,
                cmd.kind,
                cmd.category_id,
                description,
                cmd.occurred_on,
            )?;
            transactions::ActiveModel::from(&entry).insert(&db_tx).await?;
            Ok(entry)
        })
    }

    /// Most recent ledger entries for `user_id`, newest first.
    pub async fn recent_transactions(
        &self,
        user_id: &str,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Transaction>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(MAX_RECENT_LIMIT);
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::OccurredOn)
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(Transaction::try_from).collect()
    }
}
