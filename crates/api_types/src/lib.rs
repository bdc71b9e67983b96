use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

pub mod recurrence {
    use super::*;

    /// Request body for creating a recurrence.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurrenceNew {
        pub category_id: Option<Uuid>,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        pub description: Option<String>,
        pub frequency: Frequency,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        #[serde(default = "default_active")]
        pub is_active: bool,
        /// Materialize the first occurrence right away, even when
        /// `start_date` is still in the future.
        #[serde(default)]
        pub generate_first: bool,
    }

    fn default_active() -> bool {
        true
    }

    /// Partial update.
    ///
    /// Omitted fields stay unchanged; nullable fields take an explicit
    /// `null` to clear (absent and null are different things here).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurrenceUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category_id: Option<Option<Uuid>>,
        pub amount_minor: Option<i64>,
        pub kind: Option<TransactionKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<Option<String>>,
        pub frequency: Option<Frequency>,
        pub start_date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub end_date: Option<Option<NaiveDate>>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurrenceView {
        pub id: Uuid,
        pub category_id: Option<Uuid>,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        pub description: Option<String>,
        pub frequency: Frequency,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub next_due_date: NaiveDate,
        pub last_generated_date: Option<NaiveDate>,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Per-record outcome of the sweep that runs before listing.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SweepResult {
        pub recurrence_id: Uuid,
        pub generated: u32,
        pub deactivated: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurrenceListResponse {
        pub recurrences: Vec<RecurrenceView>,
        pub sweep: Vec<SweepResult>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GenerateResponse {
        pub generated: u32,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub category_id: Option<Uuid>,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        pub description: Option<String>,
        pub occurred_on: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub category_id: Option<Uuid>,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        pub description: Option<String>,
        pub occurred_on: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecentQuery {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionsResponse {
        pub transactions: Vec<TransactionView>,
    }
}
