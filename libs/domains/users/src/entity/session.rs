use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `sessions` table.
///
/// Rows are issued by the auth layer on login; the user service only reads
/// them to enrich or filter user results.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub token: String,
    pub expiration: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub user_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Session {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            token: model.token,
            expiration: model.expiration.into(),
            created_at: model.created_at.into(),
            user_id: model.user_id,
        }
    }
}
