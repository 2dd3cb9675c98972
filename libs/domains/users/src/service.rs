use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngExt;
use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::models::{
    AuthSession, BulkCreateSummary, CreateUser, FindUsersQuery, FoundUser, NewUser, NewUserRecord,
    Session, SessionExpiration, UpdateUser, User, UserPatch, UserQuery, UserResponse,
    UserWithSessions,
};
use crate::repository::UserRepository;

/// How long an issued session token stays valid.
const SESSION_TTL_HOURS: i64 = 24;

/// Service layer for user account business logic.
///
/// Every operation resolves to a payload or a [`UserError`]; the HTTP layer
/// turns that into the (code, message) envelope.
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// All active users, each enriched with its sessions.
    pub async fn list_active_users(&self) -> UserResult<Vec<UserWithSessions>> {
        let rows = self.repository.list_active_with_sessions().await?;

        Ok(rows
            .into_iter()
            .map(|(user, sessions)| UserWithSessions {
                user: user.into(),
                sessions: sessions.into_iter().map(Into::into).collect(),
            })
            .collect())
    }

    /// Filtered search over users and their login sessions.
    ///
    /// The session join is optional at the query level, then users whose
    /// session set came back empty are discarded here. The two steps keep
    /// "no session matched the bounds" distinguishable from "user has no
    /// sessions at all" while excluding both from the final result.
    pub async fn find_users(&self, filters: FindUsersQuery) -> UserResult<Vec<FoundUser>> {
        let query = UserQuery::from(filters);
        let rows = self.repository.search(query).await?;

        Ok(rows
            .into_iter()
            .filter(|(_, sessions)| !sessions.is_empty())
            .map(|(user, sessions)| FoundUser {
                user: user.into(),
                sessions: sessions
                    .into_iter()
                    .map(|s| SessionExpiration {
                        expiration: s.expiration,
                    })
                    .collect(),
            })
            .collect())
    }

    /// Create users in bulk. Candidates are processed independently and in
    /// order; one candidate's failure never aborts the batch, and prior
    /// successes are never rolled back.
    pub async fn bulk_create_users(&self, candidates: Vec<NewUser>) -> UserResult<BulkCreateSummary> {
        let mut success_count = 0;
        let mut failed_users = Vec::new();

        for candidate in candidates {
            match self.create_candidate(&candidate).await {
                Ok(user) => {
                    tracing::info!(user_id = user.id, "Bulk-created user");
                    success_count += 1;
                }
                Err(e) => {
                    tracing::debug!(email = %candidate.email, error = %e, "Bulk candidate rejected");
                    failed_users.push(candidate);
                }
            }
        }

        Ok(BulkCreateSummary {
            success_count,
            failure_count: failed_users.len(),
            failed_users,
        })
    }

    async fn create_candidate(&self, candidate: &NewUser) -> UserResult<User> {
        if self
            .repository
            .find_by_email(&candidate.email)
            .await?
            .is_some()
        {
            return Err(UserError::AlreadyExists);
        }

        let password_hash = self.hash_password(&candidate.password)?;

        self.repository
            .create(NewUserRecord {
                name: candidate.name.clone(),
                email: candidate.email.clone(),
                password_hash,
                cellphone: candidate.cellphone.clone(),
            })
            .await
    }

    /// Self-registration. Validation order: password confirmation first, then
    /// the duplicate-email check against rows of any status.
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        if input.password != input.password_second {
            return Err(UserError::PasswordMismatch);
        }

        if self.repository.find_by_email(&input.email).await?.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let password_hash = self.hash_password(&input.password)?;

        let created = self
            .repository
            .create(NewUserRecord {
                name: input.name,
                email: input.email,
                password_hash,
                cellphone: input.cellphone,
            })
            .await?;

        tracing::info!(user_id = created.id, "Registered user");
        Ok(created)
    }

    /// A single active user, or None when the id is unknown or soft-deleted.
    /// The two cases are not distinguished at this layer.
    pub async fn get_user(&self, id: i64) -> UserResult<Option<UserResponse>> {
        let user = self.repository.find_active_by_id(id).await?;
        Ok(user.map(Into::into))
    }

    /// Update name/password/cellphone, falling back to the current value for
    /// omitted fields. The password is re-hashed only when a new plaintext
    /// was supplied.
    ///
    /// The read and the write are not wrapped in a transaction and the write
    /// matches on id alone: a concurrent status flip between the two steps
    /// goes undetected.
    pub async fn update_user(&self, id: i64, input: UpdateUser) -> UserResult<()> {
        let current = self
            .repository
            .find_active_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let password = match input.password {
            Some(ref plaintext) => self.hash_password(plaintext)?,
            None => current.password,
        };

        let patch = UserPatch {
            name: input.name.unwrap_or(current.name),
            password,
            cellphone: input.cellphone.unwrap_or(current.cellphone),
        };

        self.repository.update(id, patch).await
    }

    /// Soft delete: flip status to false without re-checking the current
    /// value. Calling this twice is harmless.
    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        self.repository.set_status(id, false).await
    }

    // Auth collaborator surface

    /// Whether any row (active or soft-deleted) has this id. Used by the
    /// id-exists guard before the by-id operations run.
    pub async fn user_exists(&self, id: i64) -> UserResult<bool> {
        self.repository.exists(id).await
    }

    /// Verify login credentials against the active user's password hash.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> UserResult<User> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !user.status {
            return Err(UserError::InvalidCredentials);
        }

        if !self.verify_password(password, &user.password)? {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Verify credentials and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> UserResult<Session> {
        let user = self.verify_credentials(email, password).await?;

        let token = generate_token();
        let expiration = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        let session = self
            .repository
            .create_session(user.id, &token, expiration)
            .await?;

        tracing::info!(user_id = user.id, session_id = session.id, "Issued session token");
        Ok(session)
    }

    /// Resolve a bearer token to an authenticated context. Unknown and
    /// expired tokens are rejected alike.
    pub async fn authenticate(&self, token: &str) -> UserResult<AuthSession> {
        let session = self
            .repository
            .find_session_by_token(token)
            .await?
            .ok_or(UserError::InvalidToken)?;

        if session.expiration <= Utc::now() {
            return Err(UserError::InvalidToken);
        }

        Ok(AuthSession {
            session_id: session.id,
            user_id: session.user_id,
        })
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Opaque session token: 32 random bytes, hex encoded.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    const_hex::encode(bytes)
}
