mod common;

use common::*;
use entorm::{
    Conditions, EntityRef, EntityType, JoinTarget, SelectQuery, Session, SessionConfig, Value,
};

fn phone_row(id: &str, name: &str, number: &str) -> entorm::Row {
    row(&[("id", id), ("name", name), ("number", number)])
}

#[tokio::test]
async fn test_runs_entity_query() {
    let mock = MockExecutor::new();
    let mut session = Session::new(mock.clone());

    let mut fetcher = session.fetch::<ContactPhone>();
    assert_eq!(fetcher.sql(), "SELECT t0.* FROM contact_phone AS t0");
    assert!(fetcher.one().await.unwrap().is_none());

    assert_eq!(mock.statements(), vec!["SELECT t0.* FROM contact_phone AS t0"]);
}

#[tokio::test]
async fn test_executes_only_once() {
    let mock = MockExecutor::new();
    mock.respond(vec![phone_row("42", "mobile", "+49 151 00000000")]);
    let mut session = Session::new(mock.clone());

    let mut fetcher = session.fetch::<ContactPhone>();
    assert!(fetcher.one().await.unwrap().is_some());
    assert!(fetcher.one().await.unwrap().is_none());
    assert!(fetcher.all(0).await.unwrap().is_empty());

    assert_eq!(mock.statements().len(), 1);
}

#[tokio::test]
async fn test_custom_query_with_arguments() {
    let mock = MockExecutor::new();
    let mut session = Session::new(mock.clone());

    session
        .fetch::<ContactPhone>()
        .set_query(
            "SELECT * FROM contact_phone WHERE id = ? AND name = ?",
            vec![Value::from(42), Value::from("mobile")],
        )
        .unwrap()
        .one()
        .await
        .unwrap();
    session
        .fetch::<ContactPhone>()
        .set_query("SELECT * FROM contact_phone WHERE name = 'it''s me'", vec![])
        .unwrap()
        .one()
        .await
        .unwrap();

    assert_eq!(
        mock.statements(),
        vec![
            "SELECT * FROM contact_phone WHERE id = 42 AND name = 'mobile'",
            "SELECT * FROM contact_phone WHERE name = 'it''s me'",
        ]
    );
}

#[tokio::test]
async fn test_custom_query_rejects_wrong_argument_count() {
    let mut session = Session::new(MockExecutor::new());
    let result = session
        .fetch::<ContactPhone>()
        .set_query("SELECT * FROM contact_phone WHERE id = ?", vec![]);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_returns_entity_with_row_data() {
    let mock = MockExecutor::new();
    mock.respond(vec![phone_row("42", "mobile", "+49 151 00000000")]);
    let mut session = Session::new(mock);

    let phone = session.fetch::<ContactPhone>().one().await.unwrap().unwrap();
    let phone = phone.lock();
    assert_eq!(phone.name(), "ContactPhone");
    assert_eq!(phone.get("number").unwrap(), Value::from("+49 151 00000000"));
    assert!(!phone.is_dirty());
}

#[tokio::test]
async fn test_returns_previously_mapped_entity() {
    let mock = MockExecutor::new();
    mock.respond(vec![phone_row("42", "mobile", "+49 151 00000000")]);
    let mut session = Session::new(mock);

    let known = session.map(ContactPhone::create_with([
        ("id", Value::from(42)),
        ("name", Value::from("mobile")),
        ("number", Value::from("+49 151 00000000")),
    ]));

    let fetched = session.fetch::<ContactPhone>().one().await.unwrap().unwrap();
    assert!(fetched.ptr_eq(&known));
    assert_eq!(session.identity_map().len(), 1);
}

#[tokio::test]
async fn test_updates_original_data_of_mapped_entity() {
    let mock = MockExecutor::new();
    mock.respond(vec![phone_row("42", "home", "+49 30 1234")]);
    let mut session = Session::new(mock);

    let known = session.map(ContactPhone::create_with([
        ("id", "42"),
        ("name", "mobile"),
        ("number", "+49 151 00000000"),
    ]));
    known.lock().set("number", "+49 160 99999999");

    session.fetch::<ContactPhone>().one().await.unwrap();

    let phone = known.lock();
    // Clean columns follow storage, local edits survive.
    assert_eq!(phone.get("name").unwrap(), Value::from("home"));
    assert_eq!(phone.original("name").unwrap(), Value::from("home"));
    assert_eq!(phone.get("number").unwrap(), Value::from("+49 160 99999999"));
    assert_eq!(phone.original("number").unwrap(), Value::from("+49 30 1234"));
    assert_eq!(phone.dirty_fields(), vec!["number".to_string()]);
}

#[tokio::test]
async fn test_all_returns_every_row() {
    let mock = MockExecutor::new();
    mock.respond(vec![
        phone_row("1", "mobile", "1"),
        phone_row("2", "home", "2"),
        phone_row("3", "work", "3"),
    ]);
    let mut session = Session::new(mock);

    let phones = session.fetch::<ContactPhone>().all(0).await.unwrap();
    assert_eq!(phones.len(), 3);
    assert_eq!(session.identity_map().len(), 3);
}

#[tokio::test]
async fn test_all_returns_remaining_and_limited_rows() {
    let mock = MockExecutor::new();
    mock.respond(vec![
        phone_row("1", "mobile", "1"),
        phone_row("2", "home", "2"),
        phone_row("3", "work", "3"),
        phone_row("4", "fax", "4"),
    ]);
    let mut session = Session::new(mock);

    let mut fetcher = session.fetch::<ContactPhone>();
    let first = fetcher.one().await.unwrap().unwrap();
    assert_eq!(first.lock().get("id").unwrap(), Value::from("1"));

    let next: Vec<EntityRef> = fetcher.all(2).await.unwrap();
    let ids: Vec<Value> = next.iter().map(|e| e.lock().get("id").unwrap()).collect();
    assert_eq!(ids, vec![Value::from("2"), Value::from("3")]);

    assert_eq!(fetcher.all(0).await.unwrap().len(), 1);
    assert!(fetcher.all(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_all_respects_row_cap() {
    let mock = MockExecutor::new();
    mock.respond(vec![
        phone_row("1", "mobile", "1"),
        phone_row("2", "home", "2"),
        phone_row("3", "work", "3"),
    ]);
    let config = SessionConfig::new().row_cap(2);
    let mut session = Session::with_config(mock, config).unwrap();

    let mut fetcher = session.fetch::<ContactPhone>();
    assert_eq!(fetcher.all(0).await.unwrap().len(), 2);
    // An explicit limit is not capped.
    assert_eq!(fetcher.all(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_columns_are_locked() {
    let mut session = Session::new(MockExecutor::new());
    let fetcher = session
        .fetch::<ContactPhone>()
        .columns(["a", "b"])
        .unwrap()
        .column("COUNT(*)", vec![], Some("count"))
        .unwrap();
    assert_eq!(fetcher.sql(), "SELECT t0.* FROM contact_phone AS t0");
}

#[tokio::test]
async fn test_joins_entities_with_alias() {
    let mock = MockExecutor::new();
    let mut session = Session::new(mock.clone());

    let mut fetcher = session
        .fetch::<ContactPhone>()
        .join(JoinTarget::entity::<StudlyCaps>())
        .where_("t0.studly_caps_id = t1.id")
        .unwrap()
        .close()
        .where_((StudlyCaps::field("someVar"), "foobar"))
        .unwrap();
    fetcher.all(0).await.unwrap();

    assert_eq!(
        mock.statements(),
        vec![
            "SELECT t0.* FROM contact_phone AS t0 JOIN studly_caps AS t1 ON t0.studly_caps_id = t1.id WHERE t1.some_var = 'foobar'"
        ]
    );
}

#[tokio::test]
async fn test_translates_field_names() {
    let mut session = Session::new(MockExecutor::new());

    let sql = session.fetch::<StaticTableName>().where_(("id", 23)).unwrap().sql();
    assert_eq!(sql, "SELECT t0.* FROM my_table AS t0 WHERE t0.stn_id = 23");

    let sql = session
        .fetch::<StaticTableName>()
        .where_((StaticTableName::field("id"), 23))
        .unwrap()
        .sql();
    assert_eq!(sql, "SELECT t0.* FROM my_table AS t0 WHERE t0.stn_id = 23");

    let sql = session
        .fetch::<StaticTableName>()
        .parenthesis()
        .where_("id = 23")
        .unwrap()
        .close()
        .sql();
    assert_eq!(sql, "SELECT t0.* FROM my_table AS t0 WHERE (t0.stn_id = 23)");
}

#[tokio::test]
async fn test_unknown_aliases_fail() {
    let mut session = Session::new(MockExecutor::new());

    let err = session
        .fetch::<StaticTableName>()
        .where_((ContactPhone::field("id"), 23))
        .err()
        .unwrap();
    assert!(err.is_not_joined());
    assert_eq!(err.to_string(), "Class ContactPhone not joined");

    let err = session
        .fetch::<StaticTableName>()
        .where_(("foobar.id", 23))
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "Alias foobar unknown");
}

#[tokio::test]
async fn test_find_uses_identity_map_first() {
    let mock = MockExecutor::new();
    mock.respond(vec![phone_row("42", "mobile", "+49 151 00000000")]);
    let mut session = Session::new(mock.clone());

    let found = session.find::<ContactPhone>(42).await.unwrap().unwrap();
    let again = session.find::<ContactPhone>("42").await.unwrap().unwrap();
    assert!(found.ptr_eq(&again));
    assert_eq!(
        mock.statements(),
        vec!["SELECT t0.* FROM contact_phone AS t0 WHERE t0.id = 42"]
    );

    assert!(session.find::<ContactPhone>(43).await.unwrap().is_none());
    assert_eq!(mock.statements().len(), 2);
}

#[tokio::test]
async fn test_find_by_composite_key() {
    let mock = MockExecutor::new();
    mock.respond(vec![row(&[("user_id", "1"), ("group_id", "7")])]);
    let mut session = Session::new(mock.clone());

    let membership = session.find::<Membership>(vec![1, 7]).await.unwrap().unwrap();
    assert_eq!(membership.lock().get("groupId").unwrap(), Value::from("7"));
    assert_eq!(
        mock.statements(),
        vec!["SELECT t0.* FROM memberships AS t0 WHERE t0.user_id = 1 AND t0.group_id = 7"]
    );

    let err = session.find::<Membership>(1).await.unwrap_err();
    assert!(err.is_incomplete_key());
}
