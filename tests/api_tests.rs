mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{
    body_json, body_text, create_test_app, post_json, register, row_count, signed_in,
};
use serde_json::json;
use tower::ServiceExt;

fn product_body(category_id: &str) -> String {
    json!({
        "name": "Kindle",
        "price": 129.99,
        "amount": 10,
        "features": [
            { "type": "screen", "name": "size", "details": "6in" },
            { "type": "battery", "name": "life", "details": "6 weeks" }
        ],
        "desc": "e-reader",
        "category_id": category_id
    })
    .to_string()
}

async fn create_category(app: &axum::Router, token: &str, name: &str) -> String {
    let body = json!({ "name": name }).to_string();
    let response = post_json(app, "/categories", &body, Some(token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_user_success() {
    let (app, db) = create_test_app().await;

    let response = register(&app, "a@b.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    let json = body_json(response).await;
    let id = json["id"].as_str().unwrap();
    assert_eq!(location, format!("/{}", id));

    let user = db.users().get_by_id(id).await.unwrap().unwrap();
    assert_eq!(user.name, "a@b.com");
}

#[tokio::test]
async fn test_duplicate_user_is_validation_failure() {
    let (app, _) = create_test_app().await;
    let body = r#"{"Name":"a@b.com","Password":"secret1"}"#;

    let first = post_json(&app, "/users", body, None).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(&app, "/users", body, None).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(second).await,
        json!({
            "msg": "validation failed",
            "errors": [{
                "failed_field": "user_request.name",
                "condition": "should_be_unique",
                "actual_value": "a@b.com"
            }]
        })
    );
}

#[tokio::test]
async fn test_every_invalid_field_is_reported() {
    let (app, _) = create_test_app().await;

    let response = post_json(&app, "/users", r#"{"name":"nope","password":"123"}"#, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["failed_field"], "user_request.name");
    assert_eq!(errors[0]["condition"], "email");
    assert_eq!(errors[1]["failed_field"], "user_request.password");
    assert_eq!(errors[1]["condition"], "min");
    assert_eq!(errors[1]["actual_value"], "");
}

#[tokio::test]
async fn test_missing_fields_are_required() {
    let (app, _) = create_test_app().await;

    let response = post_json(&app, "/users", "{}", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let conditions: Vec<_> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["condition"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(conditions, vec!["required", "required"]);
}

#[tokio::test]
async fn test_malformed_payload() {
    let (app, _) = create_test_app().await;

    for body in ["", "{not json", r#"{"name": 42}"#] {
        let response = post_json(&app, "/users", body, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(body_json(response).await, json!({ "error": "Bad Request" }));
    }
}

#[tokio::test]
async fn test_create_category_requires_session() {
    let (app, _) = create_test_app().await;

    let response = post_json(&app, "/categories", r#"{"name":"books"}"#, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));

    let response = post_json(&app, "/categories", r#"{"name":"books"}"#, Some("forged")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validation_is_reported_before_missing_session() {
    let (app, _) = create_test_app().await;

    let response = post_json(&app, "/categories", r#"{"name":"  "}"#, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["errors"][0]["condition"],
        "not_blank"
    );
}

#[tokio::test]
async fn test_create_category_and_duplicate() {
    let (app, db) = create_test_app().await;
    let token = signed_in(&app).await;

    let id = create_category(&app, &token, "books").await;
    let category = db.categories().get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(category.name, "books");

    let response = post_json(&app, "/categories", r#"{"name":"books"}"#, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["failed_field"], "category_request.name");
    assert_eq!(json["errors"][0]["condition"], "should_be_unique");
}

#[tokio::test]
async fn test_create_product_with_features() {
    let (app, db) = create_test_app().await;
    let token = signed_in(&app).await;
    let category = create_category(&app, &token, "books").await;

    let response = post_json(&app, "/products", &product_body(&category), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let id = body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let product = db.products().get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(product.name, "Kindle");
    assert_eq!(product.category_id, category);
    assert_eq!(db.products().features(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_product_with_unknown_category_writes_nothing() {
    let (app, db) = create_test_app().await;
    let token = signed_in(&app).await;

    let response = post_json(&app, "/products", &product_body("no-such-id"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["errors"],
        json!([{
            "failed_field": "product_request.category_id",
            "condition": "should_exist",
            "actual_value": "no-such-id"
        }])
    );

    assert_eq!(row_count(&db, "products").await, 0);
    assert_eq!(row_count(&db, "feature_types").await, 0);
    assert_eq!(row_count(&db, "features").await, 0);
}

#[tokio::test]
async fn test_product_feature_rules() {
    let (app, _) = create_test_app().await;
    let token = signed_in(&app).await;
    let category = create_category(&app, &token, "books").await;

    let body = json!({
        "Name": "Kindle",
        "Price": 10,
        "Amount": 1,
        "Features": [{ "type": "screen", "name": "" }],
        "Desc": "x".repeat(101),
        "CategoryID": category
    })
    .to_string();

    let response = post_json(&app, "/products", &body, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let fields: Vec<_> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            format!(
                "{}:{}",
                e["failed_field"].as_str().unwrap(),
                e["condition"].as_str().unwrap()
            )
        })
        .collect();
    assert_eq!(
        fields,
        vec![
            "product_request.features:min",
            "product_request.features[0].name:required",
            "product_request.desc:max",
        ]
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = create_test_app().await;

    let response = post_json(&app, "/nowhere", "{}", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let (app, _) = create_test_app().await;

    for uri in ["/users", "/categories", "/auth"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json",
            "{}",
            uri
        );
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Method Not Allowed" })
        );
    }
}

#[tokio::test]
async fn test_pretty_output() {
    let (app, _) = create_test_app().await;

    let compact = body_text(post_json(&app, "/users", "{}", None).await).await;
    assert!(!compact.contains('\n'));

    let pretty = body_text(post_json(&app, "/users?pretty", "{}", None).await).await;
    assert!(pretty.contains("\n  \"msg\": \"validation failed\""));

    let keys = ["msg", "errors", "failed_field", "condition", "actual_value"];
    let order: Vec<_> = keys
        .iter()
        .map(|key| pretty.find(&format!("\"{}\"", key)).unwrap())
        .collect();
    assert!(order.is_sorted(), "keys out of order: {}", pretty);

    let reparsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    let original: serde_json::Value = serde_json::from_str(&compact).unwrap();
    assert_eq!(reparsed, original);
}
