//! Queries used by the HTTP handlers

use chirpy_auth::{async_trait, Credential, CredentialStore, StoreError};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{chirp, user};

/// Ordering of chirp listings by creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// User queries
#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<user::Model, DbErr> {
        let now = Utc::now();
        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            hashed_password: Set(hashed_password.to_string()),
            is_chirpy_red: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        new_user.insert(&self.db).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(&self.db).await
    }

    /// Mark a user as Chirpy Red; returns `false` if no such user exists
    pub async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::IsChirpyRed, Expr::value(true))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Delete every user and their chirps; returns the number of users removed
    pub async fn delete_all(&self) -> Result<u64, DbErr> {
        let txn = self.db.begin().await?;
        chirp::Entity::delete_many().exec(&txn).await?;
        let result = user::Entity::delete_many().exec(&txn).await?;
        txn.commit().await?;
        debug!("Deleted {} users", result.rows_affected);
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_credential(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let found = self
            .find_by_email(email)
            .await
            .map_err(|e| StoreError(e.to_string()))?;

        Ok(found.map(|user| Credential {
            subject: user.id,
            password_hash: user.hashed_password,
        }))
    }
}

/// Chirp queries
#[derive(Clone)]
pub struct ChirpRepository {
    db: DatabaseConnection,
}

impl ChirpRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, body: &str, user_id: Uuid) -> Result<chirp::Model, DbErr> {
        let now = Utc::now();
        let new_chirp = chirp::ActiveModel {
            id: Set(Uuid::new_v4()),
            body: Set(body.to_string()),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        new_chirp.insert(&self.db).await
    }

    pub async fn list(
        &self,
        author_id: Option<Uuid>,
        sort: SortOrder,
    ) -> Result<Vec<chirp::Model>, DbErr> {
        let mut query = chirp::Entity::find();

        if let Some(author_id) = author_id {
            query = query.filter(chirp::Column::UserId.eq(author_id));
        }

        query = match sort {
            SortOrder::Asc => query.order_by_asc(chirp::Column::CreatedAt),
            SortOrder::Desc => query.order_by_desc(chirp::Column::CreatedAt),
        };

        query.all(&self.db).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<chirp::Model>, DbErr> {
        chirp::Entity::find_by_id(id).one(&self.db).await
    }

    /// Delete a chirp; returns `false` if it did not exist
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = chirp::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
