mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{build_app, create_post, token_for, TestApp, TestRequest};

// Planned queries end to end: index selection, per-record read filtering,
// and the reject-over-scan policy.

async fn seed(app: &TestApp) -> Result<()> {
    let alice = token_for("alice", &[]);
    let bob = token_for("bob", &[]);

    create_post(
        app,
        &alice,
        json!({
            "author_id": "alice", "title": "early", "published": true,
            "published_at": "2024-01-15T00:00:00Z"
        }),
    )
    .await?;
    create_post(
        app,
        &alice,
        json!({
            "author_id": "alice", "title": "late", "published": true,
            "published_at": "2024-07-15T00:00:00Z"
        }),
    )
    .await?;
    create_post(
        app,
        &alice,
        json!({ "author_id": "alice", "title": "draft" }),
    )
    .await?;
    create_post(
        app,
        &bob,
        json!({
            "author_id": "bob", "title": "bobs", "published": true,
            "published_at": "2024-03-01T00:00:00Z"
        }),
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn author_query_plans_on_by_author() -> Result<()> {
    let app = build_app();
    seed(&app).await?;
    let alice = token_for("alice", &[]);

    let res = TestRequest::post("/api/find/Post")
        .bearer(&alice)
        .json(json!({ "where": { "author_id": "alice" } }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["plan"]["kind"], json!("secondary_index"));
    assert_eq!(res.data()["plan"]["index"], json!("byAuthor"));
    // The owner sees all three of their posts, drafts included
    assert_eq!(res.data()["records"].as_array().map(Vec::len), Some(3));

    Ok(())
}

#[tokio::test]
async fn read_filtering_is_per_record() -> Result<()> {
    let app = build_app();
    seed(&app).await?;
    let bob = token_for("bob", &[]);

    // Bob queries Alice's posts: only the published ones survive the
    // conditional read rule
    let res = TestRequest::post("/api/find/Post")
        .bearer(&bob)
        .json(json!({ "where": { "author_id": "alice" } }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let records = res.data()["records"].as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record["attributes"]["published"], json!(true));
    }

    Ok(())
}

#[tokio::test]
async fn range_query_engages_sort_key_index() -> Result<()> {
    let app = build_app();
    seed(&app).await?;
    let bob = token_for("bob", &[]);

    let res = TestRequest::post("/api/find/Post")
        .bearer(&bob)
        .json(json!({
            "where": {
                "published": true,
                "published_at": { "$gte": "2024-03-01T00:00:00Z" }
            }
        }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["plan"]["index"], json!("byPublished"));
    assert_eq!(res.data()["plan"]["sort_key_used"], json!(true));
    // March and July qualify; January is below the bound
    assert_eq!(res.data()["records"].as_array().map(Vec::len), Some(2));

    Ok(())
}

#[tokio::test]
async fn primary_identifier_query_uses_primary_key() -> Result<()> {
    let app = build_app();
    let alice = token_for("alice", &[]);
    let id = create_post(
        &app,
        &alice,
        json!({ "author_id": "alice", "title": "single" }),
    )
    .await?;

    let res = TestRequest::post("/api/find/Post")
        .bearer(&alice)
        .json(json!({ "where": { "id": id } }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["plan"]["kind"], json!("primary_key"));
    assert_eq!(res.data()["records"].as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn unservable_query_is_rejected_not_scanned() -> Result<()> {
    let app = build_app();
    seed(&app).await?;
    let alice = token_for("alice", &[]);

    // No index covers title equality alone
    let res = TestRequest::post("/api/find/Post")
        .bearer(&alice)
        .json(json!({ "where": { "title": "draft" } }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    // An empty predicate would be a full scan
    let res = TestRequest::post("/api/find/Post")
        .bearer(&alice)
        .json(json!({}))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn unsupported_filter_operator_is_a_validation_error() -> Result<()> {
    let app = build_app();
    let alice = token_for("alice", &[]);

    let res = TestRequest::post("/api/find/Post")
        .bearer(&alice)
        .json(json!({ "where": { "title": { "$like": "dr%" } } }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn api_key_find_sees_published_records_only() -> Result<()> {
    let app = build_app();
    seed(&app).await?;

    let res = TestRequest::post("/api/find/Post")
        .api_key()
        .json(json!({ "where": { "author_id": "alice" } }))
        .send(&app)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["records"].as_array().map(Vec::len), Some(2));

    Ok(())
}
