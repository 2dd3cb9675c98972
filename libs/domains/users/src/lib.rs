//! Users Domain
//!
//! User account management: registration, bulk import, listing with session
//! enrichment, filtered search over login activity, update, and soft delete.
//!
//! # Architecture
//!
//! ```text
//! handlers ──► service ──► repository (trait) ──► entity / models
//!    │            │
//!    └── auth ────┘   token middleware + login, backed by the sessions table
//! ```
//!
//! Soft delete is the only deletion policy: `status = false` hides a row from
//! every read path but keeps it for duplicate-email checks and audit.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{handlers, repository::InMemoryUserRepository, service::UserService};
//!
//! let repository = InMemoryUserRepository::new();
//! let service = UserService::new(repository);
//!
//! let router = handlers::router(service);
//! ```

pub mod auth;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use models::{
    AuthSession, BulkCreateSummary, CreateUser, FindUsersQuery, FoundUser, LoginRequest,
    LoginResponse, NewUser, Session, UpdateUser, User, UserQuery, UserResponse, UserWithSessions,
};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
