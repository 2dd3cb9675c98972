use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

use crate::{
    entity::{session, user},
    error::{UserError, UserResult},
    models::{NewUserRecord, Session, User, UserPatch, UserQuery},
    repository::UserRepository,
};

/// PostgreSQL implementation of [`UserRepository`] backed by SeaORM.
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_error(e: sea_orm::DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list_active_with_sessions(&self) -> UserResult<Vec<(User, Vec<Session>)>> {
        let rows = user::Entity::find()
            .filter(user::Column::Status.eq(true))
            .find_with_related(session::Entity)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(u, sessions)| {
                (
                    u.into(),
                    sessions.into_iter().map(Into::into).collect::<Vec<_>>(),
                )
            })
            .collect())
    }

    async fn search(&self, query: UserQuery) -> UserResult<Vec<(User, Vec<Session>)>> {
        let mut select = user::Entity::find();

        if let Some(status) = query.status {
            select = select.filter(user::Column::Status.eq(status));
        }

        if let Some(ref fragment) = query.name_contains {
            select = select.filter(user::Column::Name.contains(fragment.as_str()));
        }

        // The expiration bounds constrain which session rows come back, not
        // which users: users whose sessions all miss the bounds surface with
        // an empty session list and are dropped by the service
        let mut select = select.find_with_related(session::Entity);

        if let Some(before) = query.logged_in_before {
            select = select.filter(session::Column::Expiration.lt(before));
        }

        if let Some(after) = query.logged_in_after {
            select = select.filter(session::Column::Expiration.gt(after));
        }

        let rows = select
            .order_by_desc(session::Column::Expiration)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(u, sessions)| {
                (
                    u.into(),
                    sessions.into_iter().map(Into::into).collect::<Vec<_>>(),
                )
            })
            .collect())
    }

    async fn find_active_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Status.eq(true))
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn exists(&self, id: i64) -> UserResult<bool> {
        let found = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(found.is_some())
    }

    async fn create(&self, record: NewUserRecord) -> UserResult<User> {
        let now = Utc::now();
        let active_model = user::ActiveModel {
            id: NotSet,
            name: Set(record.name),
            email: Set(record.email),
            password: Set(record.password_hash),
            cellphone: Set(record.cellphone),
            status: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let model = active_model.insert(&self.db).await.map_err(db_error)?;

        tracing::info!(user_id = model.id, "Created user");
        Ok(model.into())
    }

    async fn update(&self, id: i64, patch: UserPatch) -> UserResult<()> {
        // Matches on id alone; zero rows affected is not an error
        user::Entity::update_many()
            .col_expr(user::Column::Name, Expr::value(patch.name))
            .col_expr(user::Column::Password, Expr::value(patch.password))
            .col_expr(user::Column::Cellphone, Expr::value(patch.cellphone))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(user_id = id, "Updated user");
        Ok(())
    }

    async fn set_status(&self, id: i64, status: bool) -> UserResult<()> {
        user::Entity::update_many()
            .col_expr(user::Column::Status, Expr::value(status))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(user_id = id, status, "Changed user status");
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        expiration: DateTime<Utc>,
    ) -> UserResult<Session> {
        let active_model = session::ActiveModel {
            id: NotSet,
            token: Set(token.to_string()),
            expiration: Set(expiration.into()),
            created_at: Set(Utc::now().into()),
            user_id: Set(user_id),
        };

        let model = active_model.insert(&self.db).await.map_err(db_error)?;

        tracing::info!(user_id, session_id = model.id, "Created session");
        Ok(model.into())
    }

    async fn find_session_by_token(&self, token: &str) -> UserResult<Option<Session>> {
        let model = session::Entity::find()
            .filter(session::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }
}
