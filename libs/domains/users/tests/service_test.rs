//! Service tests for the users domain, run against the in-memory repository.
//!
//! These cover the business rules end to end: validation order on create,
//! duplicate-email scope, soft-delete semantics, the filtered search's
//! two-step session policy, and bulk-create failure isolation.

use chrono::{Duration, Utc};
use domain_users::{
    CreateUser, FindUsersQuery, InMemoryUserRepository, NewUser, UpdateUser, UserError,
    UserRepository, UserService,
};

fn create_input(name: &str, email: &str, password: &str) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        password_second: password.to_string(),
        cellphone: "555-0100".to_string(),
    }
}

fn candidate(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "secret".to_string(),
        cellphone: "555-0100".to_string(),
    }
}

fn service_with_repo() -> (UserService<InMemoryUserRepository>, InMemoryUserRepository) {
    let repo = InMemoryUserRepository::new();
    (UserService::new(repo.clone()), repo)
}

#[tokio::test]
async fn test_create_rejects_password_mismatch_without_creating_a_row() {
    let (service, repo) = service_with_repo();

    let result = service
        .create_user(CreateUser {
            password_second: "different".to_string(),
            ..create_input("Ada", "ada@example.com", "secret")
        })
        .await;

    assert!(matches!(result, Err(UserError::PasswordMismatch)));
    assert!(repo.find_by_email("ada@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_rejects_duplicate_email() {
    let (service, _repo) = service_with_repo();

    service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();

    let result = service
        .create_user(create_input("Imposter", "ada@example.com", "other"))
        .await;

    assert!(matches!(result, Err(UserError::AlreadyExists)));
}

#[tokio::test]
async fn test_soft_deleted_email_still_blocks_registration() {
    let (service, _repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();
    service.delete_user(user.id).await.unwrap();

    // The duplicate check ignores status, so the email stays taken
    let result = service
        .create_user(create_input("Ada Again", "ada@example.com", "secret"))
        .await;

    assert!(matches!(result, Err(UserError::AlreadyExists)));
}

#[tokio::test]
async fn test_password_round_trip() {
    let (service, repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "correct horse"))
        .await
        .unwrap();

    // The stored value is a hash, not the plaintext
    let stored = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_ne!(stored.password, "correct horse");

    let session = service.login("ada@example.com", "correct horse").await.unwrap();
    assert_eq!(session.user_id, user.id);
    assert!(session.expiration > Utc::now());

    let result = service.login("ada@example.com", "wrong horse").await;
    assert!(matches!(result, Err(UserError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_rejected_for_soft_deleted_user() {
    let (service, _repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();
    service.delete_user(user.id).await.unwrap();

    let result = service.login("ada@example.com", "secret").await;
    assert!(matches!(result, Err(UserError::InvalidCredentials)));
}

#[tokio::test]
async fn test_soft_delete_is_idempotent() {
    let (service, _repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();

    service.delete_user(user.id).await.unwrap();
    assert!(service.get_user(user.id).await.unwrap().is_none());

    // Second delete still reports success and the row stays hidden
    service.delete_user(user.id).await.unwrap();
    assert!(service.get_user(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_user_does_not_distinguish_missing_from_soft_deleted() {
    let (service, _repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();
    service.delete_user(user.id).await.unwrap();

    assert!(service.get_user(user.id).await.unwrap().is_none());
    assert!(service.get_user(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_with_only_cellphone_keeps_name_and_password() {
    let (service, repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();
    let before = repo.find_by_email("ada@example.com").await.unwrap().unwrap();

    service
        .update_user(
            user.id,
            UpdateUser {
                cellphone: Some("555".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let after = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(after.cellphone, "555");
    assert_eq!(after.name, "Ada");
    assert_eq!(after.password, before.password, "hash must not be re-derived");
}

#[tokio::test]
async fn test_update_rehashes_only_when_password_supplied() {
    let (service, repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "old password"))
        .await
        .unwrap();
    let before = repo.find_by_email("ada@example.com").await.unwrap().unwrap();

    service
        .update_user(
            user.id,
            UpdateUser {
                password: Some("new password".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let after = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_ne!(after.password, before.password);

    service.login("ada@example.com", "new password").await.unwrap();
    let result = service.login("ada@example.com", "old password").await;
    assert!(matches!(result, Err(UserError::InvalidCredentials)));
}

#[tokio::test]
async fn test_update_unknown_or_deleted_user_is_not_found() {
    let (service, _repo) = service_with_repo();

    let result = service.update_user(42, UpdateUser::default()).await;
    assert!(matches!(result, Err(UserError::NotFound(42))));

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();
    service.delete_user(user.id).await.unwrap();

    let result = service.update_user(user.id, UpdateUser::default()).await;
    assert!(matches!(result, Err(UserError::NotFound(_))));
}

#[tokio::test]
async fn test_bulk_create_isolates_the_duplicate() {
    let (service, _repo) = service_with_repo();

    service
        .create_user(create_input("Ada", "taken@example.com", "secret"))
        .await
        .unwrap();

    let summary = service
        .bulk_create_users(vec![
            candidate("One", "one@example.com"),
            candidate("Dup", "taken@example.com"),
            candidate("Two", "two@example.com"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.failed_users.len(), 1);
    // The rejected candidate comes back as the original input
    assert_eq!(summary.failed_users[0].email, "taken@example.com");
    assert_eq!(summary.failed_users[0].name, "Dup");

    // The siblings were created despite the failure in between
    assert!(service.login("one@example.com", "secret").await.is_ok());
    assert!(service.login("two@example.com", "secret").await.is_ok());
}

#[tokio::test]
async fn test_bulk_create_with_every_candidate_failing_still_succeeds() {
    let (service, _repo) = service_with_repo();

    service
        .create_user(create_input("Ada", "taken@example.com", "secret"))
        .await
        .unwrap();

    let summary = service
        .bulk_create_users(vec![
            candidate("A", "taken@example.com"),
            candidate("B", "taken@example.com"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failure_count, 2);
}

#[tokio::test]
async fn test_find_users_requires_a_session_within_bounds() {
    let (service, repo) = service_with_repo();
    let now = Utc::now();

    let early = service
        .create_user(create_input("Early Bird", "early@example.com", "secret"))
        .await
        .unwrap();
    let late = service
        .create_user(create_input("Late Riser", "late@example.com", "secret"))
        .await
        .unwrap();
    service
        .create_user(create_input("No Sessions", "none@example.com", "secret"))
        .await
        .unwrap();

    repo.create_session(early.id, "early-token", now - Duration::hours(2))
        .await
        .unwrap();
    repo.create_session(late.id, "late-token", now + Duration::hours(2))
        .await
        .unwrap();

    let found = service
        .find_users(FindUsersQuery {
            logged_in_before: Some(now),
            ..Default::default()
        })
        .await
        .unwrap();

    // Only the user with a session before the bound appears; the user with
    // only later sessions and the user with no sessions at all are both gone
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.email, "early@example.com");
    assert!(found[0].sessions.iter().all(|s| s.expiration < now));
}

#[tokio::test]
async fn test_find_users_without_bounds_still_drops_sessionless_users() {
    let (service, repo) = service_with_repo();

    let with_session = service
        .create_user(create_input("Logged In", "in@example.com", "secret"))
        .await
        .unwrap();
    service
        .create_user(create_input("Never Logged In", "never@example.com", "secret"))
        .await
        .unwrap();

    repo.create_session(with_session.id, "tok", Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let found = service.find_users(FindUsersQuery::default()).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.email, "in@example.com");
}

#[tokio::test]
async fn test_find_users_deleted_filter_literal_semantics() {
    let (service, repo) = service_with_repo();
    let expiration = Utc::now() + Duration::hours(1);

    let active = service
        .create_user(create_input("Active", "active@example.com", "secret"))
        .await
        .unwrap();
    let deleted = service
        .create_user(create_input("Deleted", "deleted@example.com", "secret"))
        .await
        .unwrap();
    repo.create_session(active.id, "a-tok", expiration).await.unwrap();
    repo.create_session(deleted.id, "d-tok", expiration).await.unwrap();
    service.delete_user(deleted.id).await.unwrap();

    let query = |value: &str| FindUsersQuery {
        deleted: Some(value.to_string()),
        ..Default::default()
    };

    let found = service.find_users(query("false")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.email, "active@example.com");

    let found = service.find_users(query("true")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.email, "deleted@example.com");

    // Any string other than "false" behaves like "true"
    let found = service.find_users(query("whatever")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.email, "deleted@example.com");
}

#[tokio::test]
async fn test_find_users_by_name_substring() {
    let (service, repo) = service_with_repo();
    let expiration = Utc::now() + Duration::hours(1);

    let ada = service
        .create_user(create_input("Ada Lovelace", "ada@example.com", "secret"))
        .await
        .unwrap();
    let grace = service
        .create_user(create_input("Grace Hopper", "grace@example.com", "secret"))
        .await
        .unwrap();
    repo.create_session(ada.id, "a-tok", expiration).await.unwrap();
    repo.create_session(grace.id, "g-tok", expiration).await.unwrap();

    let found = service
        .find_users(FindUsersQuery {
            name: Some("Love".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.email, "ada@example.com");
}

#[tokio::test]
async fn test_authenticate_rejects_expired_and_unknown_tokens() {
    let (service, repo) = service_with_repo();

    let user = service
        .create_user(create_input("Ada", "ada@example.com", "secret"))
        .await
        .unwrap();
    repo.create_session(user.id, "stale", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let result = service.authenticate("stale").await;
    assert!(matches!(result, Err(UserError::InvalidToken)));

    let result = service.authenticate("no-such-token").await;
    assert!(matches!(result, Err(UserError::InvalidToken)));

    let session = service.login("ada@example.com", "secret").await.unwrap();
    let auth = service.authenticate(&session.token).await.unwrap();
    assert_eq!(auth.user_id, user.id);
}

#[tokio::test]
async fn test_list_active_users_includes_sessions_and_hides_deleted() {
    let (service, repo) = service_with_repo();

    let kept = service
        .create_user(create_input("Kept", "kept@example.com", "secret"))
        .await
        .unwrap();
    let removed = service
        .create_user(create_input("Removed", "removed@example.com", "secret"))
        .await
        .unwrap();
    repo.create_session(kept.id, "k-tok", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    service.delete_user(removed.id).await.unwrap();

    let users = service.list_active_users().await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user.email, "kept@example.com");
    assert_eq!(users[0].sessions.len(), 1);
    assert_eq!(users[0].sessions[0].token, "k-tok");
}
