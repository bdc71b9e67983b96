//! Catch-up generation: materializing due occurrences into the ledger.
//!
//! Scheduling is pull-based. There is no background timer: the recurrence
//! list read path runs [`Engine::sweep_due`] first, so overdue entries
//! appear as a side effect of reading (read-triggered reconciliation), and
//! [`Engine::generate_now`] covers the explicit "generate now" action.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Recurrence, ResultEngine, Transaction, recurrences, schedule, transactions,
};

use super::Engine;

/// Marker prepended to descriptions of machine-generated ledger entries.
const RECURRING_TAG: &str = "[Recurring]";

/// Per-record result of one sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepOutcome {
    pub recurrence_id: Uuid,
    pub generated: u32,
    pub deactivated: bool,
}

impl Engine {
    /// Generate every due occurrence for all active recurrences of `user_id`.
    ///
    /// Records whose `end_date` already lies behind `as_of` are deactivated
    /// without generating (terminal exhaustion); the rest run catch-up. A
    /// record can still generate its final occurrences and end up past its
    /// `end_date` in the same sweep; the next sweep then deactivates it.
    pub async fn sweep_due(
        &self,
        user_id: &str,
        as_of: NaiveDate,
    ) -> ResultEngine<Vec<SweepOutcome>> {
        let due = recurrences::Entity::find()
            .filter(recurrences::Column::UserId.eq(user_id))
            .filter(recurrences::Column::IsActive.eq(true))
            .filter(recurrences::Column::NextDueDate.lte(as_of))
            .all(&self.database)
            .await?;

        let mut outcomes = Vec::with_capacity(due.len());
        for model in due {
            let record = Recurrence::try_from(model)?;
            if record.end_date.is_some_and(|end| end < as_of) {
                self.deactivate_recurrence(record.id).await?;
                tracing::info!(recurrence_id = %record.id, "recurrence exhausted, deactivated");
                outcomes.push(SweepOutcome {
                    recurrence_id: record.id,
                    generated: 0,
                    deactivated: true,
                });
                continue;
            }

            let generated = self.catch_up(&record, as_of).await?;
            if generated > 0 {
                tracing::info!(recurrence_id = %record.id, generated, "caught up recurrence");
            }
            outcomes.push(SweepOutcome {
                recurrence_id: record.id,
                generated,
                deactivated: false,
            });
        }
        Ok(outcomes)
    }

    /// Explicit "generate now" for one recurrence.
    pub async fn generate_now(&self, user_id: &str, id: Uuid, as_of: NaiveDate) -> ResultEngine<u32> {
        let record = self.require_recurrence(user_id, id).await?;
        if !record.is_active {
            return Err(EngineError::Inactive(id.to_string()));
        }
        self.catch_up(&record, as_of).await
    }

    /// Materialize every occurrence of `record` due at or before `as_of`,
    /// stopping early once the cursor crosses `end_date`.
    ///
    /// The batch of inserts and the cursor advance run in one DB
    /// transaction, and the advance is conditional on `next_due_date` still
    /// holding the value read into `record`. Losing that race rolls the
    /// whole batch back and reports zero generated, so two concurrent
    /// callers cannot both materialize the same occurrence.
    pub async fn catch_up(&self, record: &Recurrence, as_of: NaiveDate) -> ResultEngine<u32> {
        match self.catch_up_guarded(record, as_of).await {
            Err(EngineError::StaleCursor(key)) => {
                tracing::warn!(recurrence_id = %key, "cursor moved underneath catch-up, batch dropped");
                Ok(0)
            }
            result => result,
        }
    }

    async fn catch_up_guarded(&self, record: &Recurrence, as_of: NaiveDate) -> ResultEngine<u32> {
        let read_cursor = record.next_due_date;
        let mut cursor = read_cursor;
        let mut generated: u32 = 0;

        let db_tx = self.database.begin().await?;
        while cursor <= as_of {
            if record.end_date.is_some_and(|end| cursor > end) {
                break;
            }
            insert_generated_entry(&db_tx, record, cursor).await?;
            generated += 1;
            cursor = schedule::next_occurrence(cursor, record.frequency);
        }

        if generated == 0 {
            return Ok(0);
        }

        let advanced = recurrences::Entity::update_many()
            .col_expr(recurrences::Column::NextDueDate, Expr::value(cursor))
            .col_expr(
                recurrences::Column::LastGeneratedDate,
                Expr::value(Some(as_of)),
            )
            .col_expr(recurrences::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(recurrences::Column::Id.eq(record.id.to_string()))
            .filter(recurrences::Column::NextDueDate.eq(read_cursor))
            .exec(&db_tx)
            .await?;
        if advanced.rows_affected == 0 {
            return Err(EngineError::StaleCursor(record.id.to_string()));
        }

        db_tx.commit().await?;
        Ok(generated)
    }
}

pub(super) async fn insert_generated_entry(
    db_tx: &DatabaseTransaction,
    record: &Recurrence,
    occurrence: NaiveDate,
) -> ResultEngine<()> {
    let description = match record.description.as_deref() {
        Some(text) => format!("{RECURRING_TAG} {text}"),
        None => RECURRING_TAG.to_string(),
    };
    let entry = Transaction::new(
        record.user_id.clone(),
        record.amount_minor,
        record.kind,
        record.category_id,
        Some(description),
        occurrence,
    )?;
    transactions::ActiveModel::from(&entry).insert(db_tx).await?;
    Ok(())
}
