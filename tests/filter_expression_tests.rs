use crudtables::{DataTable, DataTablesError, parse};
use serde_json::json;

mod common;
use common::{USER_COUNT, address_of, entities::user, grid_query, setup_seeded_db};

fn with_filter(base: &str, filter: &serde_json::Value) -> String {
    let encoded = url_escape::encode_component(&filter.to_string()).to_string();
    format!("{base}&q={encoded}")
}

#[tokio::test]
async fn test_filter_on_nested_relation() {
    let db = setup_seeded_db().await.expect("Failed to setup test database");
    let table = DataTable::<user::Entity>::new(["id"]);

    let raw = with_filter(
        &grid_query(0, -1, &["id"], &[(0, "asc")]),
        &json!({"filters": [{"name": "address__city__name", "op": "eq", "val": "Paris"}]}),
    );
    let page = table.respond(&db, &parse(&raw).unwrap()).await.unwrap();

    let expected = (1..=USER_COUNT).filter(|id| address_of(*id) == Some(1)).count() as u64;
    assert_eq!(page.records_total, expected, "q filter applies before the total count");
    assert_eq!(page.records_filtered, expected);
    assert_eq!(page.data[0]["id"], json!(1));
}

#[tokio::test]
async fn test_filter_shares_joins_with_display_columns() {
    let db = setup_seeded_db().await.expect("Failed to setup test database");
    let table = DataTable::<user::Entity>::new(["id", "account.name"]);

    let raw = with_filter(
        &grid_query(0, -1, &["id", "account__name"], &[(0, "asc")]),
        &json!({"filters": [{"name": "account.email", "op": "like", "val": "%globex%"}]}),
    );
    let page = table.respond(&db, &parse(&raw).unwrap()).await.unwrap();
    assert_eq!(page.records_total, 5);
    assert!(page.data.iter().all(|record| record["account__name"] == json!("Globex")));
}

#[tokio::test]
async fn test_filter_operators() {
    let db = setup_seeded_db().await.expect("Failed to setup test database");
    let table = DataTable::<user::Entity>::new(["id"]);
    let base = grid_query(0, -1, &["id"], &[(0, "asc")]);

    let cases = [
        (json!({"filters": [{"name": "id", "op": "in", "val": [1, 2, 3]}]}), 3),
        (json!({"filters": [{"name": "id", "op": "not_in", "val": [1, 2, 3]}]}), 22),
        (json!({"filters": [{"name": "id", "op": ">", "val": 20}]}), 5),
        (json!({"filters": [{"name": "id", "op": "le", "val": 4}]}), 4),
        (json!({"filters": [{"name": "id", "op": "neq", "val": 1}]}), 24),
        (json!({"filters": [{"name": "address_id", "op": "is_null"}]}), 8),
        (json!({"filters": [{"name": "account_id", "op": "==", "val": null}]}), 15),
        (json!({"filters": [{"name": "full_name", "op": "has", "val": "Sal"}]}), 2),
        (
            json!({"filters": [{"name": "id", "op": "eq", "val": 1},
                               {"name": "id", "op": "eq", "val": 2}],
                   "disjunction": true}),
            2,
        ),
        (
            json!({"filters": [{"name": "id", "op": "eq", "val": 1},
                               {"name": "id", "op": "eq", "val": 2}]}),
            0,
        ),
        (json!({"filters": []}), 25),
    ];

    for (filter, expected) in cases {
        let raw = with_filter(&base, &filter);
        let page = table.respond(&db, &parse(&raw).unwrap()).await.unwrap();
        assert_eq!(page.records_total, expected, "filter {filter}");
    }
}

#[tokio::test]
async fn test_filter_combines_with_search() {
    let db = setup_seeded_db().await.expect("Failed to setup test database");
    let table = DataTable::<user::Entity>::new(["id", "full_name"]);

    let raw = with_filter(
        &format!("{}&search[value]=Sa", grid_query(0, -1, &["id", "full_name"], &[])),
        &json!({"filters": [{"name": "account_id", "op": "is_not_null"}]}),
    );
    let page = table.respond(&db, &parse(&raw).unwrap()).await.unwrap();
    assert_eq!(page.records_total, 10);
    assert_eq!(page.records_filtered, 1);
}

#[tokio::test]
async fn test_invalid_filters() {
    let db = setup_seeded_db().await.expect("Failed to setup test database");
    let table = DataTable::<user::Entity>::new(["id", "initials"]);
    let base = grid_query(0, 10, &["id"], &[]);

    let cases = [
        json!({"filters": [{"name": "nickname", "op": "eq", "val": 1}]}),
        json!({"filters": [{"name": "address__planet", "op": "eq", "val": 1}]}),
        json!({"filters": [{"name": "initials", "op": "eq", "val": "SS"}]}),
        json!({"filters": [{"name": "id", "op": "between", "val": [1, 2]}]}),
        json!([1, 2, 3]),
    ];
    for filter in cases {
        let raw = with_filter(&base, &filter);
        let err = table.respond(&db, &parse(&raw).unwrap()).await.unwrap_err();
        assert!(
            matches!(err, DataTablesError::InvalidFilterExpression { .. }),
            "{filter} should be rejected, got {err:?}"
        );
    }

    let raw = format!("{base}&q=%7Bnot-json");
    let response = table.json(&db, &raw).await;
    let value = serde_json::to_value(response).unwrap();
    assert!(
        value["error"]
            .as_str()
            .unwrap()
            .starts_with("Unable to decode filter expression")
    );
}
