pub use categories::Category;
pub use commands::{NewRecurrence, NewTransaction, RecurrencePatch};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, SweepOutcome};
pub use recurrences::Recurrence;
pub use schedule::{Frequency, next_occurrence};
pub use transactions::{Transaction, TransactionKind};

mod categories;
mod commands;
mod error;
mod ops;
mod recurrences;
mod schedule;
mod transactions;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
