use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use viewdef_model::{SourceTable, StaticCatalog};
use viewdef_server::{router, AppState};
use viewdef_validate::SqlParserValidator;

fn app() -> Router {
    let catalog: StaticCatalog = [
        SourceTable::new("hr.public.employees", ["emp_id", "dept_id", "name", "salary"])
            .with_primary_key("emp_id")
            .with_connection("hrDS"),
        SourceTable::new("hr.public.departments", ["dept_id", "title", "budget"])
            .with_connection("hrDS"),
    ]
    .into_iter()
    .collect();

    router(AppState::new(catalog, SqlParserValidator::new()))
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_single_view() {
    let (status, body) = post(
        "/views/single",
        json!({
            "viewName": "Names",
            "table": "hr.public.employees",
            "columnNames": ["name", "emp_id"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["viewDdl"],
        "CREATE VIEW Names (RowId, name, emp_id) AS SELECT ROW_NUMBER() OVER (ORDER BY emp_id), \
         name, emp_id FROM hr.public.employees;"
    );
}

#[tokio::test]
async fn test_single_view_unknown_table() {
    let (status, body) = post(
        "/views/single",
        json!({ "viewName": "V", "table": "hr.public.ghosts" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "MISSING_TABLE");
    assert!(body["error"].as_str().unwrap().contains("hr.public.ghosts"));
}

#[tokio::test]
async fn test_join_view_and_info() {
    let (status, body) = post(
        "/views/join",
        json!({
            "viewName": "Staffing",
            "leftTable": "hr.public.employees",
            "leftColumnNames": ["name"],
            "rightTable": "hr.public.departments",
            "rightColumnNames": ["title"],
            "joinType": "LEFT_OUTER",
            "criteriaPredicates": [
                { "leftColumn": "dept_id", "rightColumn": "dept_id", "operator": "=" }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let ddl = body["viewDdl"].as_str().unwrap().to_string();
    assert!(ddl.contains("FROM hr.public.employees AS A LEFT OUTER JOIN hr.public.departments AS B"));
    assert!(ddl.ends_with("ON A.dept_id = B.dept_id;"));

    let (status, info) = post("/views/info", json!({ "viewDdl": ddl })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["viewName"], "Staffing");
    assert_eq!(info["editable"], true);
    assert_eq!(info["spec"]["join"]["joinType"], "LEFT_OUTER");
    assert_eq!(info["tables"][0]["side"], "LEFT");
    assert_eq!(info["tables"][0]["connection"], "hrDS");
    assert_eq!(info["tables"][1]["columnNames"], json!(["title"]));

    let (_, validation) = post("/ddl/validate", json!({ "viewDdl": ddl })).await;
    assert_eq!(validation["validationResult"], "Success");
}

#[tokio::test]
async fn test_join_view_without_criteria() {
    let (status, body) = post(
        "/views/join",
        json!({
            "viewName": "V",
            "leftTable": "hr.public.employees",
            "rightTable": "hr.public.departments",
            "joinType": "INNER"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "MISSING_JOIN_CRITERIA");
}

#[tokio::test]
async fn test_validate_messages() {
    let (_, empty) = post("/ddl/validate", json!({ "viewDdl": "  " })).await;
    assert_eq!(empty["validationResult"], "No DDL to validate");

    let (_, invalid) = post("/ddl/validate", json!({ "viewDdl": "CRE" })).await;
    let message = invalid["validationResult"].as_str().unwrap();
    assert_ne!(message, "Success");
    assert!(!message.is_empty());
}

#[tokio::test]
async fn test_info_for_unparseable_view() {
    let (status, info) = post("/views/info", json!({ "viewDdl": "SELECT" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["editable"], false);
    assert_eq!(info["tables"], json!([]));
}

#[tokio::test]
async fn test_tokenize() {
    let (status, body) = post(
        "/criteria/tokenize",
        json!({ "criteria": "A.x = B.y OR A.z >= B.w" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "leftColumn": "x", "rightColumn": "y", "operator": "=", "combiner": "OR" },
            { "leftColumn": "z", "rightColumn": "w", "operator": ">=", "combiner": "AND" }
        ])
    );
}
