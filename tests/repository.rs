mod common;

use common::{new_tag, new_user, seed, setup_db, setting, tag, user};
use sea_crud::{CrudError, CrudRepository, PaginationQuery};
use sea_orm::{ActiveValue::Set, EntityTrait};

fn users() -> CrudRepository<user::Entity> {
    CrudRepository::with_defaults()
}

#[tokio::test]
async fn test_find_one_excludes_soft_deleted() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    let alice = repo.find_one(&db, 1).await.unwrap();
    assert_eq!(alice.name, "Alice");

    repo.remove(&db, 1).await.unwrap();
    let err = repo.find_one(&db, 1).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Entity with ID 1 not found.");
}

#[tokio::test]
async fn test_find_one_missing() {
    let db = setup_db().await;
    let err = users().find_one(&db, 42).await.unwrap_err();
    assert!(matches!(err, CrudError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_create_returns_inserted_row() {
    let db = setup_db().await;
    let created = users()
        .create(&db, new_user("Zoe", "zoe@example.com"), &["email"])
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.email, "zoe@example.com");
    assert!(created.deleted_at.is_none());
}

#[tokio::test]
async fn test_create_unique_precheck_conflict() {
    let db = setup_db().await;
    seed(&db).await;

    let err = users()
        .create(&db, new_user("Other Alice", "alice@example.com"), &["email"])
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "Entity with email \"alice@example.com\" already exists.");
}

#[tokio::test]
async fn test_create_duplicate_without_precheck_is_translated() {
    let db = setup_db().await;
    seed(&db).await;

    let err = users()
        .create(&db, new_user("Other Alice", "alice@example.com"), &[])
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "Duplicate entry detected.");
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_unique_check_skips_unknown_and_unset_fields() {
    let db = setup_db().await;
    seed(&db).await;

    let model = user::ActiveModel {
        name: Set("Alice".to_string()),
        ..Default::default()
    };
    users()
        .check_unique_fields(&db, &model, &["email", "nickname"], None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_sets_fields_and_updated_at() {
    let db = setup_db().await;
    seed(&db).await;

    let changes = user::ActiveModel {
        name: Set("Alicia".to_string()),
        ..Default::default()
    };
    let updated = users().update(&db, 1, changes, &[]).await.unwrap();

    assert_eq!(updated.name, "Alicia");
    assert_eq!(updated.email, "alice@example.com");
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_update_unique_check_excludes_own_row() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    let same_email = user::ActiveModel {
        email: Set("alice@example.com".to_string()),
        ..Default::default()
    };
    repo.update(&db, 1, same_email, &["email"]).await.unwrap();

    let taken_email = user::ActiveModel {
        email: Set("bob@example.org".to_string()),
        ..Default::default()
    };
    let err = repo.update(&db, 1, taken_email, &["email"]).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_update_missing_row() {
    let db = setup_db().await;
    let err = users()
        .update(&db, 99, new_user("Ghost", "ghost@example.com"), &[])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_reaches_soft_deleted_rows() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    repo.remove(&db, 2).await.unwrap();
    let changes = user::ActiveModel {
        name: Set("Robert".to_string()),
        ..Default::default()
    };
    let updated = repo.update(&db, 2, changes, &[]).await.unwrap();
    assert_eq!(updated.name, "Robert");
    assert!(updated.deleted_at.is_some());
}

#[tokio::test]
async fn test_remove_marks_row_deleted() {
    let db = setup_db().await;
    seed(&db).await;

    let removed = users().remove(&db, 3).await.unwrap();
    assert!(removed.deleted_at.is_some());
    assert!(removed.updated_at.is_some());

    let still_there = user::Entity::find_by_id(3).one(&db).await.unwrap();
    assert!(still_there.is_some());
}

#[tokio::test]
async fn test_remove_missing_row() {
    let db = setup_db().await;
    assert!(users().remove(&db, 7).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_remove_unsupported_without_timestamps() {
    let db = setup_db().await;
    let repo: CrudRepository<tag::Entity> = CrudRepository::with_defaults();
    let tag = repo.create(&db, new_tag("urgent"), &[]).await.unwrap();

    let err = repo.remove(&db, tag.id).await.unwrap_err();
    assert!(matches!(err, CrudError::Unsupported(_)));
}

#[tokio::test]
async fn test_purge_requires_soft_delete_first() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    let err = repo.purge(&db, 4).await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(err.to_string().contains("must be soft-deleted before it can be purged"));

    repo.remove(&db, 4).await.unwrap();
    let purged = repo.purge(&db, 4).await.unwrap();
    assert_eq!(purged.name, "Dave");
    assert!(user::Entity::find_by_id(4).one(&db).await.unwrap().is_none());

    assert!(repo.purge(&db, 4).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_restore() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    let err = repo.restore(&db, 5).await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(err.to_string().contains("is not soft-deleted"));

    repo.remove(&db, 5).await.unwrap();
    let restored = repo.restore(&db, 5).await.unwrap();
    assert!(restored.deleted_at.is_none());
    assert_eq!(repo.find_one(&db, 5).await.unwrap().name, "Eve");

    assert!(repo.restore(&db, 50).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_restore_on_table_without_soft_delete() {
    let db = setup_db().await;
    let repo: CrudRepository<tag::Entity> = CrudRepository::with_defaults();
    let tag = repo.create(&db, new_tag("later"), &[]).await.unwrap();

    let err = repo.restore(&db, tag.id).await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(err.to_string(), "Table tags does not support soft delete.");
}

#[tokio::test]
async fn test_bulk_create_and_update() {
    let db = setup_db().await;
    let repo = users();

    let created = repo
        .bulk_create(
            &db,
            vec![new_user("Ann", "ann@example.com"), new_user("Ben", "ben@example.com")],
        )
        .await
        .unwrap();
    assert_eq!(created.len(), 2);

    let updates = vec![
        (
            created[0].id,
            user::ActiveModel {
                name: Set("Anna".to_string()),
                ..Default::default()
            },
        ),
        (
            999,
            user::ActiveModel {
                name: Set("Nobody".to_string()),
                ..Default::default()
            },
        ),
    ];
    let updated = repo.bulk_update(&db, updates).await.unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].name, "Anna");
    assert!(updated[0].updated_at.is_some());
}

#[tokio::test]
async fn test_bulk_create_rolls_back_on_failure() {
    let db = setup_db().await;
    seed(&db).await;

    let err = users()
        .bulk_create(
            &db,
            vec![new_user("New", "new@example.com"), new_user("Dup", "alice@example.com")],
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let all = user::Entity::find().all(&db).await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_bulk_soft_delete_and_restore() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    assert_eq!(repo.bulk_soft_delete(&db, &[1, 2, 99]).await.unwrap(), 2);
    let remaining = repo.find_all(&db, &PaginationQuery::new()).await.unwrap();
    assert_eq!(common::names(&remaining), vec!["Carol", "Dave", "Eve"]);

    assert_eq!(repo.bulk_restore(&db, &[1, 2]).await.unwrap(), 2);
    assert_eq!(repo.find_all(&db, &PaginationQuery::new()).await.unwrap().len(), 5);

    let empty: [i32; 0] = [];
    assert_eq!(repo.bulk_restore(&db, &empty).await.unwrap(), 0);
}

#[tokio::test]
async fn test_bulk_soft_delete_unsupported() {
    let db = setup_db().await;
    let repo: CrudRepository<tag::Entity> = CrudRepository::with_defaults();

    let err = repo.bulk_soft_delete(&db, &[1]).await.unwrap_err();
    assert!(matches!(err, CrudError::Unsupported(_)));
    assert_eq!(err.to_string(), "Soft delete not supported for this table.");
}

#[tokio::test]
async fn test_bulk_delete() {
    let db = setup_db().await;
    seed(&db).await;
    let repo = users();

    let empty: [i32; 0] = [];
    assert_eq!(repo.bulk_delete(&db, &empty).await.unwrap(), 0);
    assert_eq!(repo.bulk_delete(&db, &[4, 5]).await.unwrap(), 2);
    assert_eq!(user::Entity::find().all(&db).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_id_operations_require_id_column() {
    let db = setup_db().await;
    let repo: CrudRepository<setting::Entity> = CrudRepository::with_defaults();

    let err = repo.find_one(&db, "theme".to_string()).await.unwrap_err();
    assert!(matches!(err, CrudError::Unsupported(_)));
    assert_eq!(err.to_string(), "Table settings does not have an \"id\" column.");

    assert!(repo.bulk_delete(&db, &["theme".to_string()]).await.is_err());
}

#[tokio::test]
async fn test_safe_execute_passes_not_found_through() {
    let result: sea_crud::Result<()> =
        sea_crud::safe_execute(async { Err(CrudError::not_found(3)) }).await;
    assert!(result.unwrap_err().is_not_found());

    let result: sea_crud::Result<()> = sea_crud::safe_execute(async {
        Err(sea_orm::DbErr::Custom("boom".to_string()).into())
    })
    .await;
    let err = result.unwrap_err();
    assert!(matches!(err, CrudError::Internal(_)));
    assert!(err.to_string().contains("Database operation failed"));
}
