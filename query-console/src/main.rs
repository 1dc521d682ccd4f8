//! 数据库固定查询控制台
//!
//! 提供以下功能：
//! - 按名称登记数据库连接串，并持久化到 JSON 文件
//! - 在选定连接上执行两条预设查询之一（最近记录 / 按值过滤）
//! - HTML 页面与 JSON API 两种访问方式

mod dispatcher;
mod handlers;
mod pages;
mod registry;
mod routes;
mod state;
mod statements;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{body::Body, http::Request, middleware, routing::get, Json, Router};
use common::config::{AppConfig, LogFormat};
use common::middleware::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "query-console";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "查询控制台 API",
        version = "0.1.0",
        description = "数据库连接登记与固定查询执行"
    ),
    paths(
        handlers::list_connections,
        handlers::register_connection,
        handlers::execute_query,
        handlers::health_check,
    ),
    components(schemas(
        common::models::RegisterConnectionRequest,
        common::models::ConnectionListing,
        common::models::QueryRequest,
        common::models::QueryResult,
        common::models::QueryResultRow,
        handlers::HealthResponse,
    )),
    tags(
        (name = "connections", description = "连接登记端点"),
        (name = "query", description = "查询执行端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;

    // 初始化日志追踪
    init_tracing(config.log_format);

    if config.admin_password.is_none() {
        warn!("未设置 ADMIN_PASSWORD，管理端点将拒绝所有请求");
    }

    // 创建应用状态
    let state = AppState::new(config.clone())
        .await
        .context("初始化应用状态失败")?;
    info!(
        connections = state.registry.connection_count().await,
        file = %state.registry.path().display(),
        "连接登记表已加载"
    );

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app).await.context("服务运行失败")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn create_router(state: AppState) -> Router {
    // Path only: form routes carry the admin secret in the query string.
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!("http", method = %req.method(), path = %req.uri().path())
    });

    Router::new()
        .merge(routes::router(state.gate.clone()))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
