//! Recurrence CRUD, owner-scoped.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, NewRecurrence, Recurrence, RecurrencePatch, ResultEngine, recurrences, schedule,
};

use super::{
    Engine, categories::require_category, generation::insert_generated_entry,
    normalize_optional_text, with_tx,
};

const MAX_DESCRIPTION_LEN: usize = 255;

impl Engine {
    /// Create a recurrence with an initial cursor equal to `start_date`.
    ///
    /// With `generate_first` set, exactly one ledger entry dated
    /// `start_date` is materialized in the same transaction and the cursor
    /// advances past it. This happens even when `start_date` lies in the
    /// future: the user asked for the entry, so the due check does not
    /// apply.
    pub async fn create_recurrence(&self, cmd: NewRecurrence) -> ResultEngine<Recurrence> {
        let description = normalize_optional_text(cmd.description.as_deref());
        validate_fields(
            cmd.amount_minor,
            description.as_deref(),
            cmd.start_date,
            cmd.end_date,
        )?;

        with_tx!(self, |db_tx| {
            if let Some(category_id) = cmd.category_id {
                require_category(&db_tx, &cmd.user_id, category_id).await?;
            }

            let now = Utc::now();
            let mut record = Recurrence {
                id: Uuid::new_v4(),
                user_id: cmd.user_id.clone(),
                category_id: cmd.category_id,
                amount_minor: cmd.amount_minor,
                kind: cmd.kind,
                description,
                frequency: cmd.frequency,
                start_date: cmd.start_date,
                end_date: cmd.end_date,
                next_due_date: cmd.start_date,
                last_generated_date: None,
                is_active: cmd.is_active,
                created_at: now,
                updated_at: now,
            };
            recurrences::ActiveModel::from(&record).insert(&db_tx).await?;

            if cmd.generate_first {
                insert_generated_entry(&db_tx, &record, record.start_date).await?;
                record.next_due_date =
                    schedule::next_occurrence(record.start_date, record.frequency);
                record.last_generated_date = Some(record.start_date);
                let advance = recurrences::ActiveModel {
                    id: ActiveValue::Set(record.id.to_string()),
                    next_due_date: ActiveValue::Set(record.next_due_date),
                    last_generated_date: ActiveValue::Set(record.last_generated_date),
                    updated_at: ActiveValue::Set(Utc::now()),
                    ..Default::default()
                };
                advance.update(&db_tx).await?;
            }

            Ok(record)
        })
    }

    /// Partial update of a recurrence.
    ///
    /// When `frequency` is patched the cursor is recomputed from the last
    /// generated date (or `start_date` when nothing has been generated yet).
    /// No other field touches the cursor.
    pub async fn update_recurrence(
        &self,
        user_id: &str,
        id: Uuid,
        patch: RecurrencePatch,
    ) -> ResultEngine<Recurrence> {
        let description = patch
            .description
            .as_ref()
            .map(|value| normalize_optional_text(value.as_deref()));
        if let Some(amount_minor) = patch.amount_minor {
            if amount_minor <= 0 {
                return Err(EngineError::Validation(
                    "amount must be positive".to_string(),
                ));
            }
        }
        if let Some(Some(text)) = description.as_ref() {
            if text.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(EngineError::Validation(format!(
                    "description must be at most {MAX_DESCRIPTION_LEN} characters"
                )));
            }
        }

        with_tx!(self, |db_tx| {
            let model = recurrences::Entity::find()
                .filter(recurrences::Column::Id.eq(id.to_string()))
                .filter(recurrences::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("recurrence not exists".to_string()))?;
            let existing = Recurrence::try_from(model)?;

            if let Some(Some(category_id)) = patch.category_id {
                require_category(&db_tx, user_id, category_id).await?;
            }

            let start_date = patch.start_date.unwrap_or(existing.start_date);
            let end_date = match patch.end_date {
                Some(end_date) => end_date,
                None => existing.end_date,
            };
            if end_date.is_some_and(|end| end < start_date) {
                return Err(EngineError::Validation(
                    "end date must not precede start date".to_string(),
                ));
            }

            let mut active = recurrences::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(category_id) = patch.category_id {
                active.category_id = ActiveValue::Set(category_id.map(|c| c.to_string()));
            }
            if let Some(amount_minor) = patch.amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(kind) = patch.kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(description) = description {
                active.description = ActiveValue::Set(description);
            }
            if let Some(start_date) = patch.start_date {
                active.start_date = ActiveValue::Set(start_date);
            }
            if let Some(end_date) = patch.end_date {
                active.end_date = ActiveValue::Set(end_date);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            if let Some(frequency) = patch.frequency {
                active.frequency = ActiveValue::Set(frequency.as_str().to_string());
                let anchor = existing.last_generated_date.unwrap_or(existing.start_date);
                active.next_due_date =
                    ActiveValue::Set(schedule::next_occurrence(anchor, frequency));
            }

            let updated = active.update(&db_tx).await?;
            Recurrence::try_from(updated)
        })
    }

    /// Owner-scoped hard delete. Already-generated ledger entries stay.
    pub async fn delete_recurrence(&self, user_id: &str, id: Uuid) -> ResultEngine<()> {
        let model = recurrences::Entity::find()
            .filter(recurrences::Column::Id.eq(id.to_string()))
            .filter(recurrences::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("recurrence not exists".to_string()))?;

        let active: recurrences::ActiveModel = model.into();
        active.delete(&self.database).await?;
        Ok(())
    }

    /// Owner-scoped listing: active records first, then soonest due.
    pub async fn list_recurrences(&self, user_id: &str) -> ResultEngine<Vec<Recurrence>> {
        let models = recurrences::Entity::find()
            .filter(recurrences::Column::UserId.eq(user_id))
            .order_by_desc(recurrences::Column::IsActive)
            .order_by_asc(recurrences::Column::NextDueDate)
            .all(&self.database)
            .await?;

        models.into_iter().map(Recurrence::try_from).collect()
    }

    pub(super) async fn require_recurrence(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> ResultEngine<Recurrence> {
        let model = recurrences::Entity::find()
            .filter(recurrences::Column::Id.eq(id.to_string()))
            .filter(recurrences::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("recurrence not exists".to_string()))?;

        Recurrence::try_from(model)
    }

    pub(super) async fn deactivate_recurrence(&self, id: Uuid) -> ResultEngine<()> {
        let active = recurrences::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            is_active: ActiveValue::Set(false),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        active.update(&self.database).await?;
        Ok(())
    }
}

fn validate_fields(
    amount_minor: i64,
    description: Option<&str>,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> ResultEngine<()> {
    let mut problems = Vec::new();
    if amount_minor <= 0 {
        problems.push("amount must be positive".to_string());
    }
    if description.is_some_and(|text| text.chars().count() > MAX_DESCRIPTION_LEN) {
        problems.push(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        ));
    }
    if end_date.is_some_and(|end| end < start_date) {
        problems.push("end date must not precede start date".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation(problems.join(", ")))
    }
}
