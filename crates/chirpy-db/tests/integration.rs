//! Integration tests for chirpy-db
//!
//! Tests database operations with real SQLite in-memory database

use chirpy_auth::CredentialStore;
use chirpy_db::{
    connect,
    entities::{chirp, user},
    migrate, ChirpRepository, SortOrder, UserRepository,
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = setup_test_db().await;
    assert!(migrate(&db).await.is_ok());
}

#[tokio::test]
async fn test_create_and_find_user() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db);

    let created = users
        .create_user("walt@breakingbad.com", "$argon2id$fake")
        .await
        .unwrap();

    assert_eq!(created.email, "walt@breakingbad.com");
    assert!(!created.is_chirpy_red);

    let by_email = users
        .find_by_email("walt@breakingbad.com")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(by_email.id, created.id);

    let by_id = users.find_by_id(created.id).await.unwrap();
    assert_eq!(by_id.map(|u| u.email), Some(created.email));

    assert!(users
        .find_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db);

    users.create_user("dup@example.com", "hash").await.unwrap();
    let err = users
        .create_user("dup@example.com", "hash")
        .await
        .unwrap_err();

    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_credential_store_lookup() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db);
    let created = users
        .create_user("saul@bettercall.com", "$argon2id$stored")
        .await
        .unwrap();

    let credential = users
        .find_credential("saul@bettercall.com")
        .await
        .unwrap()
        .expect("credential should exist");

    assert_eq!(credential.subject, created.id);
    assert_eq!(credential.password_hash, "$argon2id$stored");

    assert!(users
        .find_credential("missing@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_upgrade_to_chirpy_red() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db);
    let created = users.create_user("red@example.com", "hash").await.unwrap();

    assert!(users.upgrade_to_chirpy_red(created.id).await.unwrap());
    let upgraded = users.find_by_id(created.id).await.unwrap().unwrap();
    assert!(upgraded.is_chirpy_red);

    assert!(!users.upgrade_to_chirpy_red(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_chirp_crud() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db.clone());
    let chirps = ChirpRepository::new(db);
    let author = users.create_user("author@example.com", "hash").await.unwrap();

    let created = chirps.create("hello world", author.id).await.unwrap();
    assert_eq!(created.user_id, author.id);

    let fetched = chirps.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.body, "hello world");

    assert!(chirps.delete(created.id).await.unwrap());
    assert!(chirps.get(created.id).await.unwrap().is_none());
    assert!(!chirps.delete(created.id).await.unwrap());
}

#[tokio::test]
async fn test_list_chirps_filter_and_sort() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db.clone());
    let chirps = ChirpRepository::new(db.clone());
    let alice = users.create_user("alice@example.com", "hash").await.unwrap();
    let bob = users.create_user("bob@example.com", "hash").await.unwrap();

    let base = Utc::now();
    let rows = [
        (0, alice.id, "first"),
        (1, bob.id, "second"),
        (2, alice.id, "third"),
    ];
    for (offset, author, body) in rows {
        let at = base + Duration::seconds(offset);
        chirp::ActiveModel {
            id: Set(Uuid::new_v4()),
            body: Set(body.to_string()),
            user_id: Set(author),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let all: Vec<String> = chirps
        .list(None, SortOrder::Asc)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.body)
        .collect();
    assert_eq!(all, vec!["first", "second", "third"]);

    let desc: Vec<String> = chirps
        .list(None, SortOrder::Desc)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.body)
        .collect();
    assert_eq!(desc, vec!["third", "second", "first"]);

    let alices: Vec<String> = chirps
        .list(Some(alice.id), SortOrder::Asc)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.body)
        .collect();
    assert_eq!(alices, vec!["first", "third"]);
}

#[tokio::test]
async fn test_delete_all_removes_users_and_chirps() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db.clone());
    let chirps = ChirpRepository::new(db.clone());

    let a = users.create_user("a@example.com", "hash").await.unwrap();
    users.create_user("b@example.com", "hash").await.unwrap();
    chirps.create("gone soon", a.id).await.unwrap();

    assert_eq!(users.delete_all().await.unwrap(), 2);
    assert_eq!(user::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(chirp::Entity::find().count(&db).await.unwrap(), 0);

    // The repositories keep working after the reset
    let c = users.create_user("c@example.com", "hash").await.unwrap();
    chirps.create("fresh start", c.id).await.unwrap();
    assert_eq!(users.delete_all().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_all_on_empty_database() {
    let db = setup_test_db().await;
    let users = UserRepository::new(db.clone());

    assert_eq!(users.delete_all().await.unwrap(), 0);
    assert_eq!(users.delete_all().await.unwrap(), 0);
}
