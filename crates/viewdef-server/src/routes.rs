//! HTTP routes
//!
//! Every handler is a pure function of its request body plus the read-only
//! catalog loaded at startup.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use viewdef_compiler::{generate_view, introspect, tokenize_predicates, InvalidSpecError};
use viewdef_model::{
    ColumnRef, CriteriaPredicate, JoinCriteria, JoinType, StaticCatalog, TableColumns, TableRef,
    ViewSpec, ViewTableInfo, LEFT_ALIAS, RIGHT_ALIAS,
};
use viewdef_validate::{validation_status, DdlValidator};

use crate::log_event;

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<StaticCatalog>,
    validator: Arc<dyn DdlValidator + Send + Sync>,
}

impl AppState {
    pub fn new(catalog: StaticCatalog, validator: impl DdlValidator + Send + Sync + 'static) -> Self {
        Self {
            catalog: Arc::new(catalog),
            validator: Arc::new(validator),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn invalid_spec(err: InvalidSpecError) -> ApiError {
    warn!(reason = err.reason(), error = %err, "view spec rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
            reason: Some(err.reason().to_string()),
        }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleViewRequest {
    pub view_name: String,
    pub table: String,
    #[serde(default)]
    pub column_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinViewRequest {
    pub view_name: String,
    pub left_table: String,
    #[serde(default)]
    pub left_column_names: Vec<String>,
    pub right_table: String,
    #[serde(default)]
    pub right_column_names: Vec<String>,
    pub join_type: JoinType,
    #[serde(default)]
    pub criteria_predicates: Vec<CriteriaPredicate>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDdlResponse {
    pub view_ddl: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDdlRequest {
    #[serde(default)]
    pub view_ddl: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfoResponse {
    pub view_name: String,
    pub editable: bool,
    pub spec: ViewSpec,
    pub tables: Vec<ViewTableInfo>,
    pub raw_ddl: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub validation_result: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenizeRequest {
    #[serde(default)]
    pub criteria: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/views/single", post(single_view))
        .route("/views/join", post(join_view))
        .route("/views/info", post(view_info))
        .route("/ddl/validate", post(validate_ddl))
        .route("/criteria/tokenize", post(tokenize_criteria))
        .route("/health", get(health_check))
        .with_state(state)
}

fn columns(names: Vec<String>, alias: Option<&str>) -> Vec<ColumnRef> {
    names
        .into_iter()
        .map(|name| match alias {
            Some(alias) => ColumnRef::aliased(name, alias),
            None => ColumnRef::new(name),
        })
        .collect()
}

async fn single_view(
    State(state): State<AppState>,
    Json(req): Json<SingleViewRequest>,
) -> Result<Json<ViewDdlResponse>, ApiError> {
    let spec = ViewSpec::single(
        req.view_name,
        TableRef::new(req.table),
        columns(req.column_names, None),
    );

    let view_ddl = generate_view(&spec, state.catalog.as_ref()).map_err(invalid_spec)?;
    log_event!(level: Level::INFO, event: "view_generated", view: spec.view_name, tables: 1);
    Ok(Json(ViewDdlResponse { view_ddl }))
}

async fn join_view(
    State(state): State<AppState>,
    Json(req): Json<JoinViewRequest>,
) -> Result<Json<ViewDdlResponse>, ApiError> {
    let left = TableRef::left(req.left_table);
    let right = TableRef::right(req.right_table);

    let spec = ViewSpec {
        view_name: req.view_name,
        tables: vec![left.clone(), right.clone()],
        projected_columns: vec![
            TableColumns {
                table: left,
                columns: columns(req.left_column_names, Some(LEFT_ALIAS)),
            },
            TableColumns {
                table: right,
                columns: columns(req.right_column_names, Some(RIGHT_ALIAS)),
            },
        ],
        join: Some(JoinCriteria {
            join_type: req.join_type,
            predicates: req.criteria_predicates,
        }),
    };

    let view_ddl = generate_view(&spec, state.catalog.as_ref()).map_err(invalid_spec)?;
    log_event!(
        level: Level::INFO,
        event: "view_generated",
        view: spec.view_name,
        tables: 2,
        join_type: req.join_type,
    );
    Ok(Json(ViewDdlResponse { view_ddl }))
}

async fn view_info(
    State(state): State<AppState>,
    Json(req): Json<ViewDdlRequest>,
) -> Json<ViewInfoResponse> {
    let result = introspect(&req.view_ddl);
    let tables = result.view_info(state.catalog.as_ref());
    info!(editable = result.editable(), tables = tables.len(), "view introspected");

    let raw_ddl = result.raw_ddl().to_string();
    let editable = result.editable();
    let spec = result.into_spec();

    Json(ViewInfoResponse {
        view_name: spec.view_name.clone(),
        editable,
        spec,
        tables,
        raw_ddl,
    })
}

async fn validate_ddl(
    State(state): State<AppState>,
    Json(req): Json<ViewDdlRequest>,
) -> Json<ValidationResponse> {
    let status = validation_status(state.validator.as_ref(), &req.view_ddl);
    info!(success = status.is_success(), "DDL validated");
    Json(ValidationResponse {
        validation_result: status.message().to_string(),
    })
}

async fn tokenize_criteria(Json(req): Json<TokenizeRequest>) -> Json<Vec<CriteriaPredicate>> {
    Json(tokenize_predicates(&req.criteria))
}

async fn health_check() -> &'static str {
    "OK"
}
