//! Command structs for engine write operations.
//!
//! These types group parameters for writes (recurrence create/update, ledger
//! appends), keeping call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Frequency, TransactionKind};

/// Create a recurrence.
#[derive(Clone, Debug)]
pub struct NewRecurrence {
    pub user_id: String,
    pub category_id: Option<Uuid>,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    /// Materialize one entry dated `start_date` right away, even when that
    /// date is still in the future.
    pub generate_first: bool,
}

impl NewRecurrence {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        amount_minor: i64,
        kind: TransactionKind,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category_id: None,
            amount_minor,
            kind,
            description: None,
            frequency,
            start_date,
            end_date: None,
            is_active: true,
            generate_first: false,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub fn generate_first(mut self) -> Self {
        self.generate_first = true;
        self
    }
}

/// Partial update of a recurrence.
///
/// The outer `Option` means "leave unchanged"; for nullable columns the
/// inner `Option` distinguishes "set" from "clear".
#[derive(Clone, Debug, Default)]
pub struct RecurrencePatch {
    pub category_id: Option<Option<Uuid>>,
    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub description: Option<Option<String>>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

impl RecurrencePatch {
    #[must_use]
    pub fn category_id(mut self, category_id: Option<Uuid>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: Option<NaiveDate>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Append a one-off ledger entry.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub user_id: String,
    pub category_id: Option<Uuid>,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
}

impl NewTransaction {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        amount_minor: i64,
        kind: TransactionKind,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category_id: None,
            amount_minor,
            kind,
            description: None,
            occurred_on,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
