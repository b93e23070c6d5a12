//! Aggregation Pipeline Tests
//!
//! Pipelines over the bookstore catalog:
//! - Average price by genre, top author, books per decade
//! - Stage order is the caller's order
//! - Invalid pipelines fail before any document is read

mod common;

use common::bookstore;
use foliodb::{
    Document, DocumentStore, Expr, Filter, GroupStage, IndexSpec, Pipeline, Projection, SortSpec,
    Stage, Value,
};
use serde_json::json;

fn field<'a>(doc: &'a Document, name: &str) -> &'a Value {
    doc.get(name).unwrap_or(&Value::Null)
}

// =============================================================================
// Bookstore Aggregations
// =============================================================================

/// Average price per genre, groups in first-seen order.
#[test]
fn test_average_price_by_genre() {
    let store = bookstore();
    let out = store
        .aggregate_json(&json!([
            {"$group": {"_id": "$genre", "averagePrice": {"$avg": "$price"}}}
        ]))
        .unwrap();

    let genres: Vec<_> = out.iter().filter_map(|d| d.get("_id").and_then(Value::as_str)).collect();
    assert_eq!(
        genres,
        vec![
            "Fiction",
            "Dystopian",
            "Fantasy",
            "Romance",
            "Political Satire",
            "Adventure",
            "Gothic Fiction"
        ]
    );

    let fiction = field(&out[0], "averagePrice").as_f64().unwrap();
    assert!((fiction - (12.99 + 9.99 + 8.99 + 10.50) / 4.0).abs() < 1e-9);
    let fantasy = field(&out[2], "averagePrice").as_f64().unwrap();
    assert!((fantasy - 17.49).abs() < 1e-9);
}

/// avg over prices 10, 20 and 30 in one genre is exactly 20.
#[test]
fn test_average_of_three() {
    let mut store = DocumentStore::new();
    for price in [10.0, 20.0, 30.0] {
        store
            .insert(Document::new().with("genre", "X").with("price", price))
            .unwrap();
    }

    let pipeline = Pipeline::new(vec![Stage::Group(
        GroupStage::by(Expr::field("genre")).avg("avg", Expr::field("price")),
    )])
    .unwrap();
    let out = store.aggregate(&pipeline).unwrap();

    assert_eq!(out, vec![Document::new().with("_id", "X").with("avg", 20.0)]);
}

/// Author with the most books; ties keep first-seen order.
#[test]
fn test_author_with_most_books() {
    let store = bookstore();
    let out = store
        .aggregate_json(&json!([
            {"$group": {"_id": "$author", "count": {"$sum": 1}}},
            {"$sort": {"count": -1}},
            {"$limit": 1}
        ]))
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(field(&out[0], "_id"), &Value::from("George Orwell"));
    assert_eq!(field(&out[0], "count"), &Value::Int(2));
}

/// Books per decade, using the substring form of the decade label.
#[test]
fn test_books_per_decade() {
    let store = bookstore();
    let out = store
        .aggregate_json(&json!([
            {"$group": {
                "_id": {"$concat": [
                    {"$substr": [{"$subtract": ["$published_year", {"$mod": ["$published_year", 10]}]}, 0, 4]},
                    "s"
                ]},
                "count": {"$sum": 1}
            }},
            {"$sort": {"_id": 1}}
        ]))
        .unwrap();

    let decades: Vec<(String, i64)> = out
        .iter()
        .map(|d| {
            (
                field(d, "_id").as_str().unwrap_or_default().to_string(),
                field(d, "count").as_i64().unwrap_or_default(),
            )
        })
        .collect();
    let expected = [
        ("1810s", 1),
        ("1840s", 1),
        ("1850s", 1),
        ("1920s", 1),
        ("1930s", 2),
        ("1940s", 2),
        ("1950s", 2),
        ("1960s", 1),
        ("1980s", 1),
    ];
    assert_eq!(
        decades,
        expected
            .iter()
            .map(|(d, n)| (d.to_string(), *n))
            .collect::<Vec<_>>()
    );
}

/// The typed decade label matches the JSON form.
#[test]
fn test_typed_decade_label() {
    let store = bookstore();
    let pipeline = Pipeline::new(vec![
        Stage::Match(Filter::all().eq("genre", "Fantasy")),
        Stage::Group(
            GroupStage::by(Expr::decade_label("published_year"))
                .count("count")
                .min("cheapest", Expr::field("price"))
                .max("longest", Expr::field("pages")),
        ),
        Stage::Sort(vec![SortSpec::asc("_id")]),
    ])
    .unwrap();

    let out = store.aggregate(&pipeline).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(field(&out[0], "_id"), &Value::from("1930s"));
    assert_eq!(field(&out[0], "cheapest"), &Value::Float(14.99));
    assert_eq!(field(&out[1], "_id"), &Value::from("1950s"));
    assert_eq!(field(&out[1], "longest"), &Value::Int(1178));
}

/// Group keys keep integers beyond float precision apart.
#[test]
fn test_group_large_integer_keys() {
    let mut store = DocumentStore::new();
    for k in [9_007_199_254_740_992_i64, 9_007_199_254_740_993, 9_007_199_254_740_992] {
        store.insert(Document::new().with("k", k)).unwrap();
    }

    let out = store
        .aggregate_json(&json!([{"$group": {"_id": "$k", "n": {"$sum": 1}}}]))
        .unwrap();
    assert_eq!(
        out,
        vec![
            Document::new().with("_id", 9_007_199_254_740_992_i64).with("n", 2),
            Document::new().with("_id", 9_007_199_254_740_993_i64).with("n", 1),
        ]
    );
}

// =============================================================================
// Stage Semantics
// =============================================================================

/// Zero stages return the collection unchanged.
#[test]
fn test_empty_pipeline() {
    let store = bookstore();
    let out = store.aggregate(&Pipeline::new(Vec::new()).unwrap()).unwrap();
    let all: Vec<Document> = store.iter().cloned().collect();
    assert_eq!(out, all);
}

/// Stages run in the order given; skip then limit differs from limit then skip.
#[test]
fn test_stage_order_respected() {
    let store = bookstore();
    let sort = Stage::Sort(vec![SortSpec::asc("price")]);
    let project = Stage::Project(Projection::include(["title"]).without_id());

    let skip_limit = Pipeline::new(vec![sort.clone(), Stage::Skip(2), Stage::Limit(3), project.clone()])
        .unwrap();
    let limit_skip = Pipeline::new(vec![sort, Stage::Limit(3), Stage::Skip(2), project]).unwrap();

    assert_eq!(store.aggregate(&skip_limit).unwrap().len(), 3);
    let out = store.aggregate(&limit_skip).unwrap();
    assert_eq!(out, vec![Document::new().with("title", "The Catcher in the Rye")]);
}

/// A leading match uses an index; the rest of the pipeline sees only matches.
#[test]
fn test_leading_match_uses_index() {
    let mut store = bookstore();
    store.create_index(IndexSpec::new().asc("genre")).unwrap();

    let out = store
        .aggregate_json(&json!([
            {"$match": {"genre": "Dystopian"}},
            {"$group": {"_id": "$genre", "total": {"$sum": "$pages"}}}
        ]))
        .unwrap();

    assert_eq!(out, vec![Document::new().with("_id", "Dystopian").with("total", 639)]);
    assert_eq!(store.index_usage("genre_1"), Some(1));

    // A later match never consults indexes.
    store
        .aggregate_json(&json!([
            {"$sort": {"title": 1}},
            {"$match": {"genre": "Dystopian"}}
        ]))
        .unwrap();
    assert_eq!(store.index_usage("genre_1"), Some(1));
    assert_eq!(store.metrics().snapshot().pipelines_executed, 2);
}

// =============================================================================
// Validation
// =============================================================================

/// Unknown stage names fail before anything runs.
#[test]
fn test_unknown_stage() {
    let store = bookstore();
    let err = store
        .aggregate_json(&json!([
            {"$match": {"genre": "Fiction"}},
            {"$lookup": {"from": "authors"}}
        ]))
        .unwrap_err();
    assert_eq!(err.code(), "FOLIO_UNKNOWN_STAGE");
    assert_eq!(store.metrics().snapshot().pipelines_executed, 0);
    assert_eq!(store.metrics().snapshot().queries_executed, 0);
}

/// Malformed stage bodies are rejected.
#[test]
fn test_invalid_stages() {
    let cases = [
        json!([{"$limit": 0}]),
        json!([{"$skip": -1}]),
        json!([{"$group": {"count": {"$sum": 1}}}]),
        json!([{"$group": {"_id": "$genre", "n": {"$median": "$price"}}}]),
        json!([{"$sort": {}}]),
        json!([{"$limit": 1, "$skip": 1}]),
    ];
    for raw in &cases {
        let err = Pipeline::from_json(raw).unwrap_err();
        assert!(
            matches!(err.code(), "FOLIO_INVALID_STAGE" | "FOLIO_INVALID_SORT"),
            "{} -> {}",
            raw,
            err
        );
    }

    let err = Pipeline::from_json(&json!([{"$project": {"title": 1, "price": 0}}])).unwrap_err();
    assert_eq!(err.code(), "FOLIO_INVALID_PROJECTION");
}
