//! Exchange service bootstrap: wires the engine behind a minimal Axum JSON
//! HTTP surface (SPEC_FULL.md §7). This binary stands in for the external
//! session layer only to the extent of accepting an already-authenticated
//! `actor` via a header; it performs no authentication of its own.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use engine::history::{days_in_month, parse_month};
use engine::notify::threshold::ThresholdNotifier;
use engine::notify::trade::TradeNotifier;
use engine::trade_log::TradeLog;
use engine::{EngineError, OrderManager};
use tower_http::cors::CorsLayer;
use tracing::info;

mod config;
mod types;
mod udp;

use config::Config;
use types::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    info!(?config, "starting exchange-service");

    let trade_log = TradeLog::new(config.trade_log_path());
    let multicast_sink = udp::UdpMulticastSink::bind(config.multicast_group, config.multicast_interface)
        .expect("failed to bind multicast threshold-alert socket");
    let unicast_sink = udp::UdpUnicastSink::bind().expect("failed to bind trade-notification socket");

    let threshold_notifier = ThresholdNotifier::new(Arc::new(multicast_sink));
    let trade_notifier = TradeNotifier::new(Box::new(unicast_sink));
    let engine = Arc::new(
        OrderManager::new(trade_log, threshold_notifier, trade_notifier, config.bootstrap_reference_price)
            .expect("failed to initialize order manager"),
    );

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/orders/limit", post(insert_limit_order))
        .route("/orders/market", post(insert_market_order))
        .route("/orders/stop", post(insert_stop_order))
        .route("/orders/cancel", post(cancel_order))
        .route("/price-history", get(get_price_history))
        .route("/alerts", post(register_price_alert))
        .route("/session/login", post(session_login))
        .route("/session/logout", post(session_logout))
        .layer(CorsLayer::permissive())
        .with_state(engine);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind HTTP listener");

    info!(addr = %config.bind_addr, "exchange-service listening");
    axum::serve(listener, app).await.expect("HTTP server exited unexpectedly");
}

type SharedEngine = Arc<OrderManager>;

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "service": "exchange-service" }))
}

/// Runs a blocking `OrderManager` call off the async executor. The engine's
/// critical section is a plain `std::sync::Mutex`, not an async lock.
async fn run_blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("engine task panicked")
}

fn require_actor(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MissingActor)
}

async fn insert_limit_order(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(req): Json<InsertLimitOrderRequest>,
) -> Result<Json<OrderIdResponse>, AppError> {
    let actor = require_actor(&headers)?;
    let engine = engine.clone();
    let result = run_blocking(move || engine.submit_limit(&actor, req.side, req.size, req.price)).await;
    Ok(Json(order_id_response(result)))
}

async fn insert_market_order(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(req): Json<InsertMarketOrderRequest>,
) -> Result<Json<OrderIdResponse>, AppError> {
    let actor = require_actor(&headers)?;
    let engine = engine.clone();
    let result = run_blocking(move || engine.submit_market(&actor, req.side, req.size)).await;
    Ok(Json(order_id_response(result)))
}

async fn insert_stop_order(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(req): Json<InsertStopOrderRequest>,
) -> Result<Json<OrderIdResponse>, AppError> {
    let actor = require_actor(&headers)?;
    let engine = engine.clone();
    let result = run_blocking(move || engine.submit_stop(&actor, req.side, req.size, req.price)).await;
    Ok(Json(order_id_response(result)))
}

fn order_id_response(result: Result<engine::types::OrderId, EngineError>) -> OrderIdResponse {
    match result {
        Ok(id) => OrderIdResponse { order_id: id.0 as i64 },
        Err(_) => OrderIdResponse::rejected(),
    }
}

async fn cancel_order(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<CodeResponse>, AppError> {
    let actor = require_actor(&headers)?;
    let Ok(order_id) = u64::try_from(req.order_id) else {
        return Ok(Json(CodeResponse::rejected("orderId must be a non-negative integer")));
    };

    let engine = engine.clone();
    let result =
        run_blocking(move || engine.cancel(&actor, engine::types::OrderId(order_id))).await;

    Ok(Json(match result {
        Ok(()) => CodeResponse::ok(),
        Err(e) => CodeResponse::rejected(e.to_string()),
    }))
}

async fn register_price_alert(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(req): Json<RegisterPriceAlertRequest>,
) -> Result<Json<CodeResponse>, AppError> {
    let actor = require_actor(&headers)?;
    let engine = engine.clone();
    let result = run_blocking(move || engine.register_threshold(&actor, req.threshold_price)).await;

    Ok(Json(match result {
        Ok(()) => CodeResponse::ok(),
        Err(e) => CodeResponse::rejected(e.to_string()),
    }))
}

async fn get_price_history(
    State(engine): State<SharedEngine>,
    Query(query): Query<GetPriceHistoryQuery>,
) -> Json<PriceHistoryResponse> {
    let month = query.month.clone();
    let (month_num, year) = match parse_month(&month) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Json(PriceHistoryResponse::Err {
                error_message: e.to_string(),
            })
        }
    };

    let engine = engine.clone();
    let history = run_blocking(move || engine.price_history(&month)).await;

    match history {
        Ok(days) => Json(PriceHistoryResponse::Ok {
            month: query.month,
            total_days: days_in_month(month_num, year),
            price_history: days.into_iter().map(OhlcDayWire::from).collect(),
        }),
        Err(e) => Json(PriceHistoryResponse::Err {
            error_message: e.to_string(),
        }),
    }
}

/// Stand-in for the external session layer's login hook: registers where
/// trade-execution datagrams for this actor should be delivered.
async fn session_login(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
    Json(req): Json<RegisterSessionRequest>,
) -> Result<Json<CodeResponse>, AppError> {
    let actor = require_actor(&headers)?;
    let addr: SocketAddr = req
        .addr
        .parse()
        .map_err(|_| AppError::InvalidAddr)?;
    engine.register_trade_endpoint(&actor, addr);
    Ok(Json(CodeResponse::ok()))
}

/// Stand-in for the external session layer's logout hook.
async fn session_logout(
    State(engine): State<SharedEngine>,
    headers: HeaderMap,
) -> Result<Json<CodeResponse>, AppError> {
    let actor = require_actor(&headers)?;
    engine.unregister_trade_endpoint(&actor);
    Ok(Json(CodeResponse::ok()))
}

#[derive(Debug)]
enum AppError {
    MissingActor,
    InvalidAddr,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::MissingActor => "missing X-Actor header",
            AppError::InvalidAddr => "addr must be a valid host:port",
        };
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "errorMessage": message }))).into_response()
    }
}
