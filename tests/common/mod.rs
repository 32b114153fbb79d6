#![allow(dead_code)]

use sea_orm::{
    ActiveValue::Set, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use sea_crud::CrudTable;

pub mod user {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        #[sea_orm(unique)]
        pub email: String,
        pub country_id: Option<i32>,
        pub updated_at: Option<DateTimeUtc>,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod country {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "countries")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod post {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub user_id: i32,
        pub title: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Table without soft delete or `updated_at`
pub mod tag {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub label: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Table keyed by something other than `id`
pub mod setting {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "settings")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub key: String,
        pub value: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl CrudTable for user::Entity {}
impl CrudTable for country::Entity {}
impl CrudTable for post::Entity {}
impl CrudTable for tag::Entity {}
impl CrudTable for setting::Entity {}

/// Fresh in-memory SQLite database with every test table created.
///
/// A single pooled connection keeps the in-memory database alive and shared.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(user::Entity)))
        .await
        .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(country::Entity)))
        .await
        .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(post::Entity)))
        .await
        .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(tag::Entity)))
        .await
        .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(setting::Entity)))
        .await
        .unwrap();

    db
}

pub fn new_user(name: &str, email: &str) -> user::ActiveModel {
    user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        ..Default::default()
    }
}

pub fn new_tag(label: &str) -> tag::ActiveModel {
    tag::ActiveModel {
        label: Set(label.to_string()),
        ..Default::default()
    }
}

/// Countries France (1) and Japan (2); users Alice (FR), Bob (JP), Carol (FR),
/// Dave and Eve without a country; posts by Alice and Bob.
pub async fn seed(db: &DatabaseConnection) {
    country::Entity::insert_many([
        country::ActiveModel {
            id: Set(1),
            name: Set("France".to_string()),
        },
        country::ActiveModel {
            id: Set(2),
            name: Set("Japan".to_string()),
        },
    ])
    .exec(db)
    .await
    .unwrap();

    let users = [
        (1, "Alice", "alice@example.com", Some(1)),
        (2, "Bob", "bob@example.org", Some(2)),
        (3, "Carol", "carol@example.com", Some(1)),
        (4, "Dave", "dave@example.net", None),
        (5, "Eve", "eve@example.com", None),
    ];
    for (id, name, email, country_id) in users {
        user::Entity::insert(user::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            country_id: Set(country_id),
            ..Default::default()
        })
        .exec(db)
        .await
        .unwrap();
    }

    post::Entity::insert_many([
        post::ActiveModel {
            id: Set(1),
            user_id: Set(1),
            title: Set("Rust ownership".to_string()),
        },
        post::ActiveModel {
            id: Set(2),
            user_id: Set(2),
            title: Set("Sushi guide".to_string()),
        },
    ])
    .exec(db)
    .await
    .unwrap();
}

pub fn names(users: &[user::Model]) -> Vec<&str> {
    users.iter().map(|u| u.name.as_str()).collect()
}
