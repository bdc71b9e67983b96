//! Category registry operations, owner-scoped.

use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories};

use super::Engine;

impl Engine {
    /// Create a category with a trimmed name, unique per user.
    pub async fn create_category(&self, user_id: &str, name: &str) -> ResultEngine<Category> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Validation(
                "category name must not be empty".to_string(),
            ));
        }

        let existing = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(trimmed))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(trimmed.to_string()));
        }

        let category = Category {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: trimmed.to_string(),
            created_at: Utc::now(),
        };
        categories::ActiveModel::from(&category)
            .insert(&self.database)
            .await?;
        Ok(category)
    }

    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;

        models.into_iter().map(Category::try_from).collect()
    }

    /// Delete a category. References from recurrences and ledger entries are
    /// cleared to NULL by the schema, never cascaded.
    pub async fn delete_category(&self, user_id: &str, id: Uuid) -> ResultEngine<()> {
        let model = categories::Entity::find()
            .filter(categories::Column::Id.eq(id.to_string()))
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

        let active: categories::ActiveModel = model.into();
        active.delete(&self.database).await?;
        Ok(())
    }
}

pub(super) async fn require_category<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    id: Uuid,
) -> ResultEngine<()> {
    let found = categories::Entity::find()
        .filter(categories::Column::Id.eq(id.to_string()))
        .filter(categories::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    if found.is_none() {
        return Err(EngineError::Validation(
            "category does not exist".to_string(),
        ));
    }
    Ok(())
}
