use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// User entity - matches the SQL schema
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email (unique across active and soft-deleted rows)
    pub email: String,
    /// Argon2 password hash (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password: String,
    /// Contact phone number
    pub cellphone: String,
    /// Visibility gate: true = active, false = soft-deleted
    pub status: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Session entity - owned by the auth layer, read-only for the user service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub expiration: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

/// User response DTO (without the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cellphone: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            cellphone: user.cellphone,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Session DTO attached to listing results
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: i64,
    pub token: String,
    pub expiration: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            token: session.token,
            expiration: session.expiration,
            created_at: session.created_at,
        }
    }
}

/// A user together with its sessions, as returned by the full listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserWithSessions {
    #[serde(flatten)]
    pub user: UserResponse,
    pub sessions: Vec<SessionResponse>,
}

/// Session projection used by the filtered search (expiration only)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionExpiration {
    pub expiration: DateTime<Utc>,
}

/// A user matched by the filtered search, with the sessions that fell inside
/// the requested login window
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoundUser {
    #[serde(flatten)]
    pub user: UserResponse,
    pub sessions: Vec<SessionExpiration>,
}

/// DTO for self-registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
    /// Password confirmation; must match `password`
    pub password_second: String,
    pub cellphone: String,
}

/// A bulk-create candidate. Rejected candidates are echoed back verbatim, so
/// this type is serializable in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub cellphone: String,
}

/// DTO for updating an existing user. Omitted fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub password: Option<String>,
    pub cellphone: Option<String>,
}

/// Wire-level query string for the filtered search.
///
/// Values arrive as flat strings; `deleted` keeps its original string form so
/// the `status = (deleted == "false")` comparison is preserved exactly.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct FindUsersQuery {
    /// "false" selects active users; any other value selects soft-deleted ones
    pub deleted: Option<String>,
    /// Substring match on the display name
    pub name: Option<String>,
    /// Upper bound (exclusive) on session expiration
    #[serde(rename = "loggedInbefore")]
    pub logged_in_before: Option<DateTime<Utc>>,
    /// Lower bound (exclusive) on session expiration
    #[serde(rename = "loggedInafter")]
    pub logged_in_after: Option<DateTime<Utc>>,
}

/// Typed filter handed to the repository, built once from [`FindUsersQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub status: Option<bool>,
    pub name_contains: Option<String>,
    pub logged_in_before: Option<DateTime<Utc>>,
    pub logged_in_after: Option<DateTime<Utc>>,
}

impl From<FindUsersQuery> for UserQuery {
    fn from(filters: FindUsersQuery) -> Self {
        Self {
            status: filters.deleted.as_deref().map(|deleted| deleted == "false"),
            name_contains: filters.name,
            logged_in_before: filters.logged_in_before,
            logged_in_after: filters.logged_in_after,
        }
    }
}

/// Repository-level insert record; `status` is forced true by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub cellphone: String,
}

/// Fully-resolved patch applied to a user row. Every field carries a concrete
/// value: the service fills omitted fields from the current row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPatch {
    pub name: String,
    pub password: String,
    pub cellphone: String,
}

/// Outcome of a bulk create: per-candidate failures are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateSummary {
    pub success_count: usize,
    pub failure_count: usize,
    /// The original input records that were rejected
    pub failed_users: Vec<NewUser>,
}

/// DTO for login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
}

/// Response after a successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

/// Authenticated request context, inserted into request extensions by the
/// token middleware.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: i64,
    pub user_id: i64,
}

/// Fixed-message success envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
