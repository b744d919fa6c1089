//! Workflow engine over PostgreSQL.
//!
//! These tests need a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p docflow-db -- --ignored`

use std::sync::Arc;

use docflow_core::password::hash_password;
use docflow_core::{
    CreateDocumentRequest, CreateUserRequest, DocumentStatus, Error, ForwardRequest, Priority,
    RespondRequest, Scope, StatusUpdate, User, UserRepository, UserRole, WorkflowEngine,
};
use docflow_db::test_fixtures::{connect_test_database, unique_name};
use docflow_db::Database;

async fn setup() -> (Database, WorkflowEngine) {
    dotenvy::dotenv().ok();
    let db = connect_test_database()
        .await
        .expect("Failed to connect to test database");
    let engine = WorkflowEngine::new(
        Arc::new(db.documents.clone()),
        Arc::new(db.directory.clone()),
    );
    (db, engine)
}

async fn seed_owner(db: &Database, department: &str) -> User {
    db.users
        .insert(
            CreateUserRequest {
                username: unique_name("owner"),
                password: String::new(),
                full_name: None,
                role: UserRole::Employee,
                department: Some(department.to_string()),
                division: None,
                sub_role: None,
            },
            hash_password("secret-pass").expect("hash"),
        )
        .await
        .expect("Failed to seed owner")
}

async fn seed_department(db: &Database, prefix: &str) -> String {
    use docflow_core::DirectoryRepository;
    db.directory
        .create_department(&unique_name(prefix))
        .await
        .expect("Failed to seed department")
        .name
}

fn leave_request(user_id: i64) -> CreateDocumentRequest {
    CreateDocumentRequest {
        doc_type: "Leave Request".to_string(),
        user_id,
        priority: Priority::Medium,
        payload: Some(vec![0x25, 0x50, 0x44, 0x46]),
        description: None,
    }
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_round_trips_payload() {
    let (db, engine) = setup().await;
    let hr = seed_department(&db, "hr").await;
    let owner = seed_owner(&db, &hr).await;

    let doc = engine.create(leave_request(owner.id)).await.unwrap();
    let fetched = engine.get(doc.id).await.unwrap();

    assert_eq!(fetched.status, DocumentStatus::Pending);
    assert_eq!(fetched.version, 1);
    assert_eq!(fetched.payload.as_deref(), Some(&[0x25, 0x50, 0x44, 0x46][..]));
    assert_eq!(fetched.department.as_deref(), Some(hr.as_str()));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_forward_then_respond() {
    let (db, engine) = setup().await;
    let hr = seed_department(&db, "hr").await;
    let finance = seed_department(&db, "finance").await;
    let owner = seed_owner(&db, &hr).await;

    let doc = engine.create(leave_request(owner.id)).await.unwrap();
    engine
        .update_status(
            doc.id,
            StatusUpdate {
                status: Some(DocumentStatus::Approved),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let forwarded = engine
        .forward(ForwardRequest {
            document_id: doc.id,
            target_department: finance.clone(),
            notes: Some("Check budget".to_string()),
            forwarder_department: None,
            forwarder_name: Some("Admin Ann".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(forwarded.status, DocumentStatus::Received);
    assert!(forwarded.is_forwarded_request);
    assert_eq!(forwarded.forwarded_from.as_deref(), Some(hr.as_str()));
    assert_eq!(forwarded.department.as_deref(), Some(finance.as_str()));

    engine
        .respond(RespondRequest {
            document_id: doc.id,
            responder_department: Some(finance.clone()),
            responder_name: Some("Fin Fay".to_string()),
            message: "Approved by finance".to_string(),
        })
        .await
        .unwrap();

    let responses = engine.list_responses(&hr).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].message, "Approved by finance");
    assert_eq!(responses[0].responder_name.as_deref(), Some("Fin Fay"));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_stale_version_is_rejected_in_sql() {
    let (db, engine) = setup().await;
    let hr = seed_department(&db, "hr").await;
    let owner = seed_owner(&db, &hr).await;
    let doc = engine.create(leave_request(owner.id)).await.unwrap();

    engine
        .update_status(
            doc.id,
            StatusUpdate {
                status: Some(DocumentStatus::Approved),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = engine
        .update_status(
            doc.id,
            StatusUpdate {
                status: Some(DocumentStatus::Released),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_department_scope_and_stats() {
    let (db, engine) = setup().await;
    let hr = seed_department(&db, "hr").await;
    let owner = seed_owner(&db, &hr).await;
    let a = engine.create(leave_request(owner.id)).await.unwrap();
    engine.create(leave_request(owner.id)).await.unwrap();
    engine.archive(a.id, None).await.unwrap();

    let scope = Scope {
        role: Some(UserRole::Admin),
        department: Some(hr.to_uppercase()),
        ..Default::default()
    };
    let docs = engine.list(scope.clone(), None).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs[0].id > docs[1].id);

    let stats = engine.stats(scope).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 1);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_delete_missing_document() {
    let (_db, engine) = setup().await;
    let err = engine.delete(i64::MAX).await.unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(_)));
}
