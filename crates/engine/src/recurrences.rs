//! Recurrence records: stored rules describing repeating ledger entries.
//!
//! `next_due_date` is the schedule cursor, the first occurrence not yet
//! materialized. It starts at `start_date` and only ever moves forward;
//! the catch-up loop owns every advance.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Frequency, TransactionKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Option<Uuid>,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Inclusive upper bound: occurrences past this date are never generated.
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    /// The as-of date of the most recent catch-up run.
    pub last_generated_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurrences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category_id: Option<String>,
    pub amount_minor: i64,
    pub kind: String,
    pub description: Option<String>,
    pub frequency: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub next_due_date: Date,
    pub last_generated_date: Option<Date>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Recurrence> for ActiveModel {
    fn from(record: &Recurrence) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            user_id: ActiveValue::Set(record.user_id.clone()),
            category_id: ActiveValue::Set(record.category_id.map(|id| id.to_string())),
            amount_minor: ActiveValue::Set(record.amount_minor),
            kind: ActiveValue::Set(record.kind.as_str().to_string()),
            description: ActiveValue::Set(record.description.clone()),
            frequency: ActiveValue::Set(record.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(record.start_date),
            end_date: ActiveValue::Set(record.end_date),
            next_due_date: ActiveValue::Set(record.next_due_date),
            last_generated_date: ActiveValue::Set(record.last_generated_date),
            is_active: ActiveValue::Set(record.is_active),
            created_at: ActiveValue::Set(record.created_at),
            updated_at: ActiveValue::Set(record.updated_at),
        }
    }
}

impl TryFrom<Model> for Recurrence {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("recurrence not exists".to_string()))?,
            user_id: model.user_id,
            category_id: model.category_id.and_then(|s| Uuid::parse_str(&s).ok()),
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            description: model.description,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            next_due_date: model.next_due_date,
            last_generated_date: model.last_generated_date,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
