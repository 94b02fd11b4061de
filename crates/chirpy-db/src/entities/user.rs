//! User entity: login identity and membership tier

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// User email (unique, used as login name)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing)]
    pub hashed_password: String,

    /// Whether the user has been upgraded to Chirpy Red by the payment provider
    pub is_chirpy_red: bool,

    /// When the user account was created
    pub created_at: ChronoDateTimeUtc,

    /// When the user was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// User authors chirps
    #[sea_orm(has_many = "super::chirp::Entity")]
    Chirps,
}

impl Related<super::chirp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chirps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
