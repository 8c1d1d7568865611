use axum::{
    routing::{get, put},
    Router,
};
use seller_billing::{api, create_pool, AppConfig, DashboardService, InvalidationBus};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    // 失效消息: 记录写操作影响的查询键
    let bus = InvalidationBus::default();
    let mut invalidations = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(key) = invalidations.recv().await {
            tracing::debug!("Query key {:?} invalidated", key);
        }
    });

    let state = api::AppState {
        dashboard: Arc::new(DashboardService::new(pool.clone(), config.report.clone())),
        pool,
        bus,
    };

    // 仪表盘与报表
    let dashboard_routes = Router::new()
        .route("/api/dashboard/stats", get(api::dashboard_stats))
        .route("/api/dashboard/charts", get(api::dashboard_charts))
        .route("/api/reports/monthly", get(api::report_json))
        .route("/api/reports/monthly.csv", get(api::report_csv));

    // 增删改查
    let crud_routes = Router::new()
        .route("/api/sellers", get(api::list_sellers).post(api::create_seller))
        .route(
            "/api/sellers/:id",
            put(api::update_seller).delete(api::delete_seller),
        )
        .route(
            "/api/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route(
            "/api/categories/:id",
            put(api::update_category).delete(api::delete_category),
        )
        .route("/api/orders", get(api::list_orders).post(api::create_order))
        .route(
            "/api/orders/:id",
            get(api::get_order)
                .put(api::update_order)
                .delete(api::delete_order),
        )
        .route("/api/returns", get(api::list_returns).post(api::create_return))
        .route(
            "/api/returns/:id",
            put(api::update_return).delete(api::delete_return),
        )
        .route(
            "/api/settings",
            get(api::get_settings).put(api::update_settings),
        );

    let app = Router::new()
        .route("/health", get(api::health_check))
        .merge(dashboard_routes)
        .merge(crud_routes)
        .with_state(state)
        .layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/dashboard/stats       - Month-to-date summary cards");
    info!("  GET  /api/dashboard/charts      - Orders over time, pieces, supplier revenue");
    info!("  GET  /api/reports/monthly[.csv] - Monthly billing report");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
