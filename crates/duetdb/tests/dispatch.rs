//! End-to-end dispatch tests against the mock backends.

use duetdb::test_support::{MockDocumentConnection, MockSqlConnection};
use duetdb::{
    Connection, DialectKind, Error, Map, Predicate, Query, Record, Sort, Update, Value,
};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Insert a record with a null field, then fetch it back by primary key
// and observe the null preserved through the round trip.
#[tokio::test]
async fn insert_then_find_one_preserves_null() {
    init_tracing();
    let mock = MockSqlConnection::new(DialectKind::Postgres);
    let stored = Map::new()
        .with("id", 1i64)
        .with("name", "Alice")
        .with("age", Value::Null);
    mock.queue_rows(vec![stored.clone()]); // RETURNING * response
    mock.queue_rows(vec![stored]); // the later point lookup

    let connection = Connection::sql(mock);
    let query = Query::new("users");

    let inserted = query
        .insert(
            &connection,
            Map::new().with("name", "Alice").with("age", Value::Null),
        )
        .await
        .unwrap();
    assert_eq!(inserted.get("id"), Some(&Value::Int(1)));

    let id = inserted.primary_key_values().unwrap()[0].1.clone();
    let found = query.find_by_id(&connection, id).await.unwrap();
    assert_eq!(found.get("age"), Some(&Value::Null));
}

#[tokio::test]
async fn insert_command_shapes_per_dialect() {
    // Postgres reads the stored row back
    let mock = MockSqlConnection::new(DialectKind::Postgres);
    mock.queue_rows(vec![Map::new().with("id", 1i64)]);
    let mock = std::sync::Arc::new(mock);
    let connection = Connection::Sql(mock.clone());
    Query::new("users")
        .insert(&connection, Map::new().with("name", "Alice"))
        .await
        .unwrap();
    let issued = mock.issued();
    assert_eq!(
        issued[0].text,
        "INSERT INTO \"users\" (\"name\") VALUES ($1) RETURNING *"
    );
    assert_eq!(issued[0].binds, vec![Value::String("Alice".into())]);

    // MySQL has no RETURNING; the inserted fields echo back
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::MySql));
    let connection = Connection::Sql(mock.clone());
    let record = Query::new("users")
        .insert(&connection, Map::new().with("name", "Bob"))
        .await
        .unwrap();
    assert_eq!(record.get("name"), Some(&Value::String("Bob".into())));
    assert_eq!(
        mock.issued()[0].text,
        "INSERT INTO `users` (`name`) VALUES (?)"
    );
}

#[tokio::test]
async fn find_compiles_filters_sort_and_pagination() {
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::Postgres));
    let connection = Connection::Sql(mock.clone());

    Query::new("users")
        .filter(Predicate::eq("status", "active"))
        .filter(Predicate::gt("age", 18i64))
        .sort(Sort::desc("created_at"))
        .skip(10)
        .limit(5)
        .find(&connection)
        .await
        .unwrap();

    let issued = mock.issued();
    assert_eq!(
        issued[0].text,
        "SELECT * FROM \"users\" WHERE \"status\" = $1 AND \"age\" > $2 \
         ORDER BY \"created_at\" DESC LIMIT 5 OFFSET 10"
    );
    assert_eq!(
        issued[0].binds,
        vec![Value::String("active".into()), Value::Int(18)]
    );
}

#[tokio::test]
async fn find_one_returns_object_not_found() {
    let mock = MockSqlConnection::new(DialectKind::Sqlite);
    let connection = Connection::sql(mock);
    let err = Query::new("users")
        .filter(Predicate::eq("id", 404i64))
        .find_one(&connection)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ObjectNotFound));
}

// An update op without a lowering for the target dialect fails before
// any backend call is issued.
#[tokio::test]
async fn unsupported_lowering_issues_zero_io() {
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::MySql));
    let connection = Connection::Sql(mock.clone());

    let err = Query::new("users")
        .filter(Predicate::eq("id", 1i64))
        .update(&connection, &Update::new().add_to_set("tags", "x"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn missing_dialect_fails_before_io() {
    let mock = std::sync::Arc::new(MockSqlConnection::without_dialect());
    let connection = Connection::Sql(mock.clone());

    let err = Query::new("users").find(&connection).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn return_before_on_sql_update_fails_before_io() {
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::Postgres));
    let connection = Connection::Sql(mock.clone());

    let err = Query::new("users")
        .return_before()
        .update(&connection, &Update::new().set("name", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn update_returns_records_when_dialect_can() {
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::Postgres));
    mock.queue_rows(vec![Map::new().with("id", 1i64).with("version", 2i64)]);
    let connection = Connection::Sql(mock.clone());

    let result = Query::new("users")
        .filter(Predicate::eq("id", 1i64))
        .update(&connection, &Update::new().increment("version", 1i64))
        .await
        .unwrap();

    assert_eq!(result.affected, 1);
    assert_eq!(result.records[0].get("version"), Some(&Value::Int(2)));
    assert_eq!(
        mock.issued()[0].text,
        "UPDATE \"users\" SET \"version\" = \"version\" + $1 WHERE \"id\" = $2 RETURNING *"
    );
}

#[tokio::test]
async fn update_falls_back_to_count_without_returning() {
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::MySql).with_affected(3));
    let connection = Connection::Sql(mock.clone());

    let result = Query::new("users")
        .update(&connection, &Update::new().set("active", false))
        .await
        .unwrap();

    assert_eq!(result.affected, 3);
    assert!(result.records.is_empty());
    assert_eq!(
        mock.issued()[0].text,
        "UPDATE `users` SET `active` = FALSE"
    );
}

#[tokio::test]
async fn delete_compiles_and_reports_count() {
    let mock = std::sync::Arc::new(MockSqlConnection::new(DialectKind::MySql).with_affected(2));
    let connection = Connection::Sql(mock.clone());

    let result = Query::new("sessions")
        .filter(Predicate::lt("expires_at", 100i64))
        .delete(&connection)
        .await
        .unwrap();

    assert_eq!(result.affected, 2);
    assert_eq!(
        mock.issued()[0].text,
        "DELETE FROM `sessions` WHERE `expires_at` < ?"
    );
}

#[tokio::test]
async fn for_update_on_document_store_is_rejected() {
    let mock = std::sync::Arc::new(MockDocumentConnection::new());
    let connection = Connection::Document(mock.clone());

    let err = Query::new("jobs")
        .for_update()
        .find(&connection)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert_eq!(mock.call_count(), 0);
}

// The same request API drives the document path end to end, producing
// the identical record representation.
#[tokio::test]
async fn document_path_round_trip() {
    init_tracing();
    let connection = Connection::document(MockDocumentConnection::new());
    let query = Query::new("users").primary_key(vec!["_id".to_string()]);

    let alice = query
        .insert(
            &connection,
            Map::new().with("name", "Alice").with("age", Value::Null),
        )
        .await
        .unwrap();
    assert!(alice.contains("_id"));
    assert_eq!(alice.get("age"), Some(&Value::Null));

    query
        .insert(
            &connection,
            Map::new().with("name", "Bob").with("age", 30i64),
        )
        .await
        .unwrap();

    // point lookup by the returned primary key sees the stored null
    let id = alice.primary_key_values().unwrap()[0].1.clone();
    let found = query.find_by_id(&connection, id).await.unwrap();
    assert_eq!(found.get("age"), Some(&Value::Null));
    assert_eq!(found.primary_key, vec!["_id".to_string()]);

    // filtered find translates comparisons into operator documents
    let adults = query
        .clone()
        .filter(Predicate::ge("age", 18i64))
        .find(&connection)
        .await
        .unwrap();
    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].get("name"), Some(&Value::String("Bob".into())));

    // update through $-operators
    let result = query
        .clone()
        .filter(Predicate::eq("name", "Bob"))
        .update(
            &connection,
            &Update::new().increment("age", 1i64).push("tags", "admin"),
        )
        .await
        .unwrap();
    assert_eq!(result.affected, 1);

    let bob = query
        .clone()
        .filter(Predicate::eq("name", "Bob"))
        .find_one(&connection)
        .await
        .unwrap();
    assert_eq!(bob.get("age"), Some(&Value::Int(31)));
    assert_eq!(
        bob.get("tags"),
        Some(&Value::Array(vec![Value::String("admin".into())]))
    );

    // delete and observe the count
    let result = query
        .clone()
        .filter(Predicate::like("name", "A%"))
        .delete(&connection)
        .await
        .unwrap();
    assert_eq!(result.affected, 1);

    let remaining = query.find(&connection).await.unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn document_find_applies_sort_skip_limit_projection() {
    let connection = Connection::document(MockDocumentConnection::new());
    let query = Query::new("scores").primary_key(vec!["_id".to_string()]);

    for (name, score) in [("a", 3i64), ("b", 1i64), ("c", 2i64), ("d", 4i64)] {
        query
            .insert(
                &connection,
                Map::new().with("name", name).with("score", score),
            )
            .await
            .unwrap();
    }

    let top: Vec<Record> = query
        .clone()
        .sort(Sort::desc("score"))
        .skip(1)
        .limit(2)
        .fields(vec!["name".to_string()])
        .find(&connection)
        .await
        .unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].get("name"), Some(&Value::String("a".into())));
    assert_eq!(top[1].get("name"), Some(&Value::String("c".into())));
    // projection dropped everything else
    assert!(!top[0].contains("score"));
    assert!(!top[0].contains("_id"));
}

#[tokio::test]
async fn both_paths_produce_the_same_record_shape() {
    // SQL path
    let sql = MockSqlConnection::new(DialectKind::Postgres);
    sql.queue_rows(vec![Map::new().with("_id", 1i64).with("name", "x")]);
    let sql_record = Query::new("users")
        .primary_key(vec!["_id".to_string()])
        .find_one(&Connection::sql(sql))
        .await
        .unwrap();

    // document path, aligned on the same key name; an explicit _id
    // keeps the store from generating one
    let connection = Connection::document(MockDocumentConnection::new());
    let query = Query::new("users").primary_key(vec!["_id".to_string()]);
    query
        .insert(&connection, Map::new().with("_id", 1i64).with("name", "x"))
        .await
        .unwrap();
    let doc_record = query.find_one(&connection).await.unwrap();

    assert_eq!(sql_record, doc_record);
}
