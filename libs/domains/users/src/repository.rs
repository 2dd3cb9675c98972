use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::UserResult;
use crate::models::{NewUserRecord, Session, User, UserPatch, UserQuery};

/// Repository trait for User and Session persistence.
///
/// Injected into the service at construction so the data store can be
/// substituted with a test double. Session rows are written only by the auth
/// layer (login); the user service reads them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users with status=true, each paired with all of its sessions
    async fn list_active_with_sessions(&self) -> UserResult<Vec<(User, Vec<Session>)>>;

    /// Users matching the typed filter, paired with the sessions that fall
    /// inside the expiration bounds (ordered by expiration descending).
    /// The session join is optional: users whose sessions all miss the bounds
    /// come back with an empty session list and are discarded by the caller.
    async fn search(&self, query: UserQuery) -> UserResult<Vec<(User, Vec<Session>)>>;

    /// A user by id, visible rows only (status=true)
    async fn find_active_by_id(&self, id: i64) -> UserResult<Option<User>>;

    /// A user by exact email, regardless of status (duplicate checks must see
    /// soft-deleted rows too)
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Whether any row (active or soft-deleted) has this id
    async fn exists(&self, id: i64) -> UserResult<bool>;

    /// Insert a new user with status forced true
    async fn create(&self, record: NewUserRecord) -> UserResult<User>;

    /// Apply a fully-resolved patch to the row with this id. The where-clause
    /// matches on id alone; status is deliberately not re-checked here.
    async fn update(&self, id: i64, patch: UserPatch) -> UserResult<()>;

    /// Flip the visibility gate for the row with this id
    async fn set_status(&self, id: i64, status: bool) -> UserResult<()>;

    /// Issue a session row (auth layer only)
    async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        expiration: DateTime<Utc>,
    ) -> UserResult<Session>;

    /// Look up a session by its opaque token
    async fn find_session_by_token(&self, token: &str) -> UserResult<Option<Session>>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<i64, User>>>,
    sessions: Arc<RwLock<BTreeMap<i64, Session>>>,
    next_user_id: Arc<AtomicI64>,
    next_session_id: Arc<AtomicI64>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(BTreeMap::new())),
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            next_user_id: Arc::new(AtomicI64::new(1)),
            next_session_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn sessions_for(
        sessions: &BTreeMap<i64, Session>,
        user_id: i64,
        query: &UserQuery,
    ) -> Vec<Session> {
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| query.logged_in_before.is_none_or(|bound| s.expiration < bound))
            .filter(|s| query.logged_in_after.is_none_or(|bound| s.expiration > bound))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.expiration.cmp(&a.expiration));
        matching
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list_active_with_sessions(&self) -> UserResult<Vec<(User, Vec<Session>)>> {
        let users = self.users.read().await;
        let sessions = self.sessions.read().await;

        let result = users
            .values()
            .filter(|u| u.status)
            .map(|u| {
                let owned: Vec<Session> = sessions
                    .values()
                    .filter(|s| s.user_id == u.id)
                    .cloned()
                    .collect();
                (u.clone(), owned)
            })
            .collect();

        Ok(result)
    }

    async fn search(&self, query: UserQuery) -> UserResult<Vec<(User, Vec<Session>)>> {
        let users = self.users.read().await;
        let sessions = self.sessions.read().await;

        let result = users
            .values()
            .filter(|u| query.status.is_none_or(|status| u.status == status))
            .filter(|u| {
                query
                    .name_contains
                    .as_deref()
                    .is_none_or(|fragment| u.name.contains(fragment))
            })
            .map(|u| (u.clone(), Self::sessions_for(&sessions, u.id, &query)))
            .collect();

        Ok(result)
    }

    async fn find_active_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.status).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn exists(&self, id: i64) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(users.contains_key(&id))
    }

    async fn create(&self, record: NewUserRecord) -> UserResult<User> {
        let mut users = self.users.write().await;

        let now = Utc::now();
        let user = User {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            name: record.name,
            email: record.email,
            password: record.password_hash,
            cellphone: record.cellphone,
            status: true,
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> UserResult<()> {
        let mut users = self.users.write().await;

        // Matching on id alone mirrors the SQL update; zero rows affected is
        // not an error
        if let Some(user) = users.get_mut(&id) {
            user.name = patch.name;
            user.password = patch.password;
            user.cellphone = patch.cellphone;
            user.updated_at = Utc::now();
        }

        Ok(())
    }

    async fn set_status(&self, id: i64, status: bool) -> UserResult<()> {
        let mut users = self.users.write().await;

        if let Some(user) = users.get_mut(&id) {
            user.status = status;
            user.updated_at = Utc::now();
        }

        Ok(())
    }

    async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        expiration: DateTime<Utc>,
    ) -> UserResult<Session> {
        let mut sessions = self.sessions.write().await;

        let session = Session {
            id: self.next_session_id.fetch_add(1, Ordering::SeqCst),
            token: token.to_string(),
            expiration,
            created_at: Utc::now(),
            user_id,
        };

        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session_by_token(&self, token: &str) -> UserResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().find(|s| s.token == token).cloned())
    }
}
