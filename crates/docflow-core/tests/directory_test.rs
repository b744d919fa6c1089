//! Directory service: departments, divisions, accounts, and login.

use std::sync::Arc;

use docflow_core::memory::MemoryStore;
use docflow_core::{
    CreateUserRequest, DirectoryService, Error, SubRole, UpdateUserRequest, UserRole, UserStatus,
};

fn service() -> (Arc<MemoryStore>, DirectoryService) {
    let store = Arc::new(MemoryStore::new());
    store.seed_department("HR");
    store.seed_department("Finance");
    let service = DirectoryService::new(store.clone(), store.clone());
    (store, service)
}

fn new_user(username: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        password: "correct horse".to_string(),
        full_name: Some("Jane Doe".to_string()),
        role: UserRole::Employee,
        department: Some("HR".to_string()),
        division: None,
        sub_role: None,
    }
}

#[tokio::test]
async fn test_departments_are_sorted() {
    let (_, svc) = service();
    svc.create_department("Admin Office").await.unwrap();
    assert_eq!(
        svc.departments().await.unwrap(),
        vec!["Admin Office", "Finance", "HR"]
    );
}

#[tokio::test]
async fn test_duplicate_department_conflicts() {
    let (_, svc) = service();
    let err = svc.create_department("hr").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_division_lifecycle() {
    let (_, svc) = service();

    let division = svc.create_division("Payroll", "HR").await.unwrap();
    assert_eq!(division.name, "Payroll");
    assert_eq!(division.department, "HR");
    assert_eq!(svc.divisions("HR").await.unwrap(), vec!["Payroll"]);
    assert!(svc.divisions("Finance").await.unwrap().is_empty());

    // Same name in another department is fine
    svc.create_division("Payroll", "Finance").await.unwrap();

    let err = svc.create_division("Payroll", "HR").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_division_requires_known_department() {
    let (_, svc) = service();
    let err = svc.create_division("Audit", "Nowhere").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = svc.create_division("", "HR").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_login_succeeds_with_correct_password() {
    let (store, svc) = service();
    let seeded = store.seed_user("admin", "admin-pass", UserRole::Admin, Some("HR"));

    let user = svc.login("admin", "admin-pass").await.unwrap();
    assert_eq!(user.id, seeded.id);
    assert_eq!(user.default_route(), "/admin");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (store, svc) = service();
    let mut inactive = store.seed_user("gone", "gone-pass", UserRole::Employee, Some("HR"));
    inactive.status = UserStatus::Inactive;
    store.put_user(inactive);
    store.seed_user("admin", "admin-pass", UserRole::Admin, Some("HR"));

    for (username, password) in [
        ("admin", "wrong-pass"),
        ("nobody", "admin-pass"),
        ("gone", "gone-pass"),
    ] {
        let err = svc.login(username, password).await.unwrap_err();
        match err {
            Error::Unauthorized(msg) => assert_eq!(msg, "Invalid credentials"),
            other => panic!("{}: expected Unauthorized, got {:?}", username, other),
        }
    }
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (_, svc) = service();
    assert!(matches!(
        svc.login("", "x").await.unwrap_err(),
        Error::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_create_user_then_login() {
    let (_, svc) = service();
    let created = svc.create_user(new_user("jdoe")).await.unwrap();
    assert_eq!(created.status, UserStatus::Active);

    let user = svc.login("jdoe", "correct horse").await.unwrap();
    assert_eq!(user.id, created.id);
    assert_eq!(user.default_route(), "/employee");
}

#[tokio::test]
async fn test_create_user_validation() {
    let (_, svc) = service();

    let mut weak = new_user("weak");
    weak.password = "short".to_string();
    assert!(matches!(
        svc.create_user(weak).await.unwrap_err(),
        Error::InvalidInput(_)
    ));

    let mut lost = new_user("lost");
    lost.department = Some("Nowhere".to_string());
    assert!(matches!(
        svc.create_user(lost).await.unwrap_err(),
        Error::InvalidInput(_)
    ));

    let mut no_div = new_user("nodiv");
    no_div.division = Some("Payroll".to_string());
    assert!(matches!(
        svc.create_user(no_div).await.unwrap_err(),
        Error::InvalidInput(_)
    ));

    svc.create_user(new_user("jdoe")).await.unwrap();
    assert!(matches!(
        svc.create_user(new_user("jdoe")).await.unwrap_err(),
        Error::Conflict(_)
    ));
}

#[tokio::test]
async fn test_deactivated_user_cannot_login() {
    let (_, svc) = service();
    let user = svc.create_user(new_user("jdoe")).await.unwrap();

    let updated = svc
        .update_user(
            user.id,
            UpdateUserRequest {
                status: Some(UserStatus::Inactive),
                sub_role: Some(SubRole::Recorder),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, UserStatus::Inactive);
    assert_eq!(updated.sub_role, Some(SubRole::Recorder));

    assert!(matches!(
        svc.login("jdoe", "correct horse").await.unwrap_err(),
        Error::Unauthorized(_)
    ));
}

#[tokio::test]
async fn test_password_change() {
    let (_, svc) = service();
    let user = svc.create_user(new_user("jdoe")).await.unwrap();

    svc.update_user(
        user.id,
        UpdateUserRequest {
            password: Some("battery staple".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(svc.login("jdoe", "correct horse").await.is_err());
    assert!(svc.login("jdoe", "battery staple").await.is_ok());
}

#[tokio::test]
async fn test_users_by_department() {
    let (_, svc) = service();
    svc.create_user(new_user("jdoe")).await.unwrap();
    let mut fin = new_user("fin");
    fin.department = Some("Finance".to_string());
    svc.create_user(fin).await.unwrap();

    let hr = svc.users(Some("hr")).await.unwrap();
    assert_eq!(hr.len(), 1);
    assert_eq!(hr[0].username, "jdoe");
    assert_eq!(svc.users(None).await.unwrap().len(), 2);

    assert!(svc.user(hr[0].id).await.is_ok());
    assert!(svc.user(999).await.unwrap_err().is_not_found());
}
