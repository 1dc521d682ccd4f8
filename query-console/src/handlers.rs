//! Handler模块

use std::time::Instant;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Extension, Form, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::connection::{ConnectionListing, RegisterConnectionRequest};
use common::models::query::{FetchForm, QueryRequest, QueryResult};
use common::response::ApiResponse;

use crate::pages::PageError;
use crate::state::AppState;

// ============== 页面 ==============

/// 查询页面（默认首页）
pub async fn query_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let registry = state.registry.list().await;
    Ok(Html(state.pages.query_page(&registry)?))
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    password: Option<String>,
}

/// 连接管理页面，需通过管理员校验
///
/// 表单只能通过查询参数携带口令；以 Bearer 方式进入时改为提示使用 JSON API。
pub async fn admin_page(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, PageError> {
    Ok(Html(state.pages.admin_page(query.password.as_deref())?))
}

/// 保存连接并跳转回查询页面
pub async fn save_details(
    State(state): State<AppState>,
    Form(req): Form<RegisterConnectionRequest>,
) -> Result<Redirect, PageError> {
    req.validate()?;
    state.registry.save(&req.name, &req.dsn).await?;
    Ok(Redirect::to("/"))
}

/// 执行固定查询并渲染结果表格
pub async fn fetch_results(
    State(state): State<AppState>,
    Form(form): Form<FetchForm>,
) -> Result<Html<String>, PageError> {
    let scanned = state
        .dispatcher
        .execute(&form.database, &form.value, form.skip_filter())
        .await?;
    Ok(Html(state.pages.results_page(&scanned.rows)?))
}

// ============== JSON API ==============

/// 列出已注册的连接名称
#[utoipa::path(
    get,
    path = "/api/connections",
    tag = "connections",
    responses(
        (status = 200, description = "连接列表", body = ApiResponse<ConnectionListing>)
    )
)]
pub async fn list_connections(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<ApiResponse<ConnectionListing>> {
    let listing = ConnectionListing::from(state.registry.list().await);
    Json(
        ApiResponse::ok_with_service(listing, state.config.service_name.as_str())
            .with_request_id(request_id.as_str()),
    )
}

/// 注册数据库连接（同名覆盖）
#[utoipa::path(
    post,
    path = "/api/admin/connections",
    tag = "connections",
    request_body = RegisterConnectionRequest,
    responses(
        (status = 200, description = "连接已保存", body = ApiResponse<ConnectionListing>),
        (status = 400, description = "名称或 DSN 为空"),
        (status = 401, description = "管理员校验失败")
    )
)]
pub async fn register_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<RegisterConnectionRequest>,
) -> Result<Json<ApiResponse<ConnectionListing>>, AppError> {
    req.validate()?;
    state.registry.save(&req.name, &req.dsn).await?;
    let listing = ConnectionListing::from(state.registry.list().await);
    Ok(Json(
        ApiResponse::ok_with_service(listing, state.config.service_name.as_str())
            .with_request_id(request_id.as_str()),
    ))
}

/// 执行固定查询
#[utoipa::path(
    post,
    path = "/api/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "查询执行成功", body = ApiResponse<QueryResult>),
        (status = 400, description = "参数校验错误"),
        (status = 404, description = "连接未找到"),
        (status = 500, description = "连接或查询失败")
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    req.validate()?;
    let start = Instant::now();
    let scanned = state
        .dispatcher
        .execute(&req.connection, &req.value, req.skip_filter)
        .await?;
    let result = QueryResult::new(
        scanned.rows,
        scanned.skipped,
        start.elapsed().as_millis() as u64,
    );
    Ok(Json(
        ApiResponse::ok_with_service(result, state.config.service_name.as_str())
            .with_request_id(request_id.as_str()),
    ))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connections: state.registry.connection_count().await,
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 已注册连接数
    pub connections: usize,
}
