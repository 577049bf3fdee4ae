//! Integration tests for the query language over JSON records.

use magic_ql::{
    prepend_condition, Config, Error, LogicalOperator, PartialQuery, Query, SetterQuery,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn records() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "alpha", "status": "open", "size": 10, "tags": ["rust", "db"], "owner": {"team": "core"}}),
        json!({"id": 2, "name": "beta", "status": "done", "size": 25, "tags": ["web"], "owner": {"team": "ui"}}),
        json!({"id": 3, "name": "gamma", "status": "open", "size": 40, "tags": [], "owner": {"team": "core"}}),
        json!({"id": 4, "name": "delta_x", "status": "blocked", "size": 5, "tags": ["rust"]}),
    ]
}

fn matching_ids(query: &Query, records: &[Value]) -> Vec<i64> {
    records
        .iter()
        .filter(|r| query.eval(r))
        .filter_map(|r| r["id"].as_i64())
        .collect()
}

#[test]
fn test_filter_records() {
    init_logging();
    let records = records();

    let query = Query::parse("status = 'open' AND size > 15").unwrap();
    assert_eq!(matching_ids(&query, &records), vec![3]);

    let query = Query::parse("status IN ['done', 'blocked'] OR tags CONTAINS 'db'").unwrap();
    assert_eq!(matching_ids(&query, &records), vec![1, 2, 4]);

    let query = Query::parse("owner.team = 'core' AND name LIKE '%a'").unwrap();
    assert_eq!(matching_ids(&query, &records), vec![1, 3]);

    let query = Query::parse("name LIKE 'delta\\_%'").unwrap();
    assert_eq!(matching_ids(&query, &records), vec![4]);
}

#[test]
fn test_empty_query_matches_everything() {
    let records = records();
    let query = Query::parse("LIMIT 2").unwrap();
    assert_eq!(matching_ids(&query, &records), vec![1, 2, 3, 4]);
    assert_eq!(query.limit(), Some(2));
}

#[test]
fn test_mandatory_condition() {
    init_logging();
    let records = records();

    // The user cannot escape the mandatory condition with an OR
    let query = prepend_condition("status = 'open' OR status = 'done'", "owner.team = 'core'")
        .unwrap();
    assert_eq!(
        query.to_string(),
        "( status = \"open\" OR status = \"done\" ) AND owner.team = \"core\""
    );
    assert_eq!(matching_ids(&query, &records), vec![1, 3]);
}

#[test]
fn test_pagination_round_trip() {
    // A storage layer pushes the canonical text to a remote API and
    // re-queries with the continuation token it gets back
    let mut query = Query::parse("size >= 10 ORDER BY size DESC LIMIT 2").unwrap();
    let page_two = Query::parse("OFFSET 'cursor-2'").unwrap();
    query.merge(page_two, LogicalOperator::And);

    let text = query.to_string();
    assert_eq!(text, "size >= 10 ORDER BY size DESC LIMIT 2 OFFSET \"cursor-2\"");

    let reparsed = Query::parse(&text).unwrap();
    assert_eq!(reparsed, query);
    assert_eq!(reparsed.continuation_token(), Some("cursor-2"));
}

#[test]
fn test_client_errors() {
    for input in [
        "status =",
        "status = 'open",
        "(status = 'open'",
        "status LIKE 'a)'",
        "status",
        "LIMIT 10 ORDER BY a",
        "a = 1 # comment",
    ] {
        let err = Query::parse(input).unwrap_err();
        assert!(err.is_syntax(), "{} should be a syntax error", input);
        match err {
            Error::Syntax { query, .. } => assert_eq!(query, input),
            other => panic!("Expected Syntax, got {:?}", other),
        }
    }
}

#[test]
fn test_partial_prefilter_then_confirm() {
    init_logging();
    let query = PartialQuery::parse("status = 'open' AND size > 15").unwrap();

    // Index entries carry only the status
    let index = [json!({"id": 1, "status": "open"}), json!({"id": 2, "status": "done"})];
    assert!(query.eval(&index[0], true));
    assert!(query.was_partial_match());
    assert!(!query.eval(&index[1], true));
    assert!(!query.was_partial_match());

    // Full record fails the confirming strict pass
    let records = records();
    assert!(!query.eval(&records[0], false));
    assert!(query.eval(&records[2], false));
}

#[test]
fn test_patch_records() {
    let setter = SetterQuery::new("status = 'done' AND owner.reviewed = TRUE AND size = 0").unwrap();
    let mut records = records();
    for record in records.iter_mut() {
        setter.apply(record);
    }

    let done = Query::parse("status = 'done' AND owner.reviewed = TRUE AND size = 0").unwrap();
    assert_eq!(matching_ids(&done, &records), vec![1, 2, 3, 4]);
    assert_eq!(records[3]["owner"], json!({"reviewed": true}));
}

#[test]
fn test_config_from_file() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        "max_depth = 3\nreserved_segments = [\"__proto__\", \"secret\"]\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(Query::parse_with("(((a = 1)))", &config).is_ok());
    assert!(Query::parse_with("((((a = 1))))", &config).is_err());

    let setter = SetterQuery::with_config("secret.key = 'x' AND public = 'y'", &config).unwrap();
    let mut target = json!({});
    setter.apply(&mut target);
    assert_eq!(target, json!({"public": "y"}));
}
