use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, Frequency, NewRecurrence, NewTransaction, RecurrencePatch,
    TransactionKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    insert_user(&db, "alice").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn insert_user(db: &DatabaseConnection, username: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec![username.into(), "password".into()],
    ))
    .await
    .unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn create_starts_cursor_at_start_date() {
    let (engine, _db) = engine_with_db().await;
    let record = engine
        .create_recurrence(
            NewRecurrence::new(
                "alice",
                4200,
                TransactionKind::Expense,
                Frequency::Monthly,
                date(2024, 5, 1),
            )
            .description("  rent  "),
        )
        .await
        .unwrap();

    assert_eq!(record.next_due_date, date(2024, 5, 1));
    assert_eq!(record.last_generated_date, None);
    assert!(record.is_active);
    // Descriptions are stored trimmed.
    assert_eq!(record.description.as_deref(), Some("rent"));
}

#[tokio::test]
async fn create_rejects_invalid_fields_with_joined_message() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_recurrence(
            NewRecurrence::new(
                "alice",
                -5,
                TransactionKind::Expense,
                Frequency::Monthly,
                date(2024, 5, 1),
            )
            .description("x".repeat(300))
            .end_date(date(2024, 4, 1)),
        )
        .await
        .unwrap_err();

    let EngineError::Validation(message) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(message.contains("amount must be positive"));
    assert!(message.contains("description must be at most 255 characters"));
    assert!(message.contains("end date must not precede start date"));
}

#[tokio::test]
async fn create_with_foreign_category_is_rejected() {
    let (engine, db) = engine_with_db().await;
    insert_user(&db, "bob").await;
    let bobs = engine.create_category("bob", "Food").await.unwrap();

    let err = engine
        .create_recurrence(
            NewRecurrence::new(
                "alice",
                100,
                TransactionKind::Expense,
                Frequency::Weekly,
                date(2024, 1, 1),
            )
            .category_id(bobs.id),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("category does not exist".to_string())
    );
}

#[tokio::test]
async fn update_distinguishes_clear_from_absent() {
    let (engine, _db) = engine_with_db().await;
    let record = engine
        .create_recurrence(
            NewRecurrence::new(
                "alice",
                4200,
                TransactionKind::Expense,
                Frequency::Monthly,
                date(2024, 1, 1),
            )
            .description("rent")
            .end_date(date(2024, 12, 31)),
        )
        .await
        .unwrap();

    // Absent fields stay untouched.
    let updated = engine
        .update_recurrence(
            "alice",
            record.id,
            RecurrencePatch::default().amount_minor(4400),
        )
        .await
        .unwrap();
    assert_eq!(updated.amount_minor, 4400);
    assert_eq!(updated.description.as_deref(), Some("rent"));
    assert_eq!(updated.end_date, Some(date(2024, 12, 31)));
    assert_eq!(updated.next_due_date, date(2024, 1, 1));

    // An explicit null clears the column.
    let updated = engine
        .update_recurrence(
            "alice",
            record.id,
            RecurrencePatch::default().end_date(None).description(None),
        )
        .await
        .unwrap();
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.description, None);
}

#[tokio::test]
async fn update_of_foreign_record_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let record = engine
        .create_recurrence(NewRecurrence::new(
            "alice",
            100,
            TransactionKind::Expense,
            Frequency::Weekly,
            date(2024, 1, 1),
        ))
        .await
        .unwrap();

    let err = engine
        .update_recurrence("bob", record.id, RecurrencePatch::default().amount_minor(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn delete_keeps_generated_entries() {
    let (engine, _db) = engine_with_db().await;
    let record = engine
        .create_recurrence(NewRecurrence::new(
            "alice",
            100,
            TransactionKind::Expense,
            Frequency::Daily,
            date(2024, 1, 1),
        ))
        .await
        .unwrap();
    engine
        .generate_now("alice", record.id, date(2024, 1, 1))
        .await
        .unwrap();

    engine.delete_recurrence("alice", record.id).await.unwrap();

    assert!(engine.list_recurrences("alice").await.unwrap().is_empty());
    let entries = engine.recent_transactions("alice", None).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn category_delete_clears_references() {
    let (engine, _db) = engine_with_db().await;
    let category = engine.create_category("alice", "Subscriptions").await.unwrap();

    let record = engine
        .create_recurrence(
            NewRecurrence::new(
                "alice",
                999,
                TransactionKind::Expense,
                Frequency::Monthly,
                date(2024, 1, 1),
            )
            .category_id(category.id),
        )
        .await
        .unwrap();
    engine
        .generate_now("alice", record.id, date(2024, 1, 1))
        .await
        .unwrap();
    engine
        .append_transaction(
            NewTransaction::new("alice", 50, TransactionKind::Expense, date(2024, 1, 2))
                .category_id(category.id),
        )
        .await
        .unwrap();

    engine.delete_category("alice", category.id).await.unwrap();

    let records = engine.list_recurrences("alice").await.unwrap();
    assert_eq!(records[0].category_id, None);
    let entries = engine.recent_transactions("alice", None).await.unwrap();
    assert!(entries.iter().all(|e| e.category_id.is_none()));
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    engine.create_category("alice", "Rent").await.unwrap();

    let err = engine.create_category("alice", "  Rent  ").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Rent".to_string()));
}

#[tokio::test]
async fn empty_category_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine.create_category("alice", "   ").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn append_transaction_validates_amount() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .append_transaction(NewTransaction::new(
            "alice",
            0,
            TransactionKind::Expense,
            date(2024, 1, 1),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn recent_transactions_orders_newest_first() {
    let (engine, _db) = engine_with_db().await;
    for day in [3u32, 1, 2] {
        engine
            .append_transaction(NewTransaction::new(
                "alice",
                100 * i64::from(day),
                TransactionKind::Expense,
                date(2024, 1, day),
            ))
            .await
            .unwrap();
    }

    let entries = engine.recent_transactions("alice", None).await.unwrap();
    let dates: Vec<_> = entries.iter().map(|e| e.occurred_on).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 3), date(2024, 1, 2), date(2024, 1, 1)]
    );
}
