//! SeaORM entities for the `users` and `sessions` tables.

pub mod session;
pub mod user;
