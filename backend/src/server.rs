//! HTTP service exposing the calculator.
//!
//! Routes:
//! - `GET /` liveness text
//! - `POST /execute` evaluates the request body, one result per line
//! - `POST /colorize` renders the request body as highlighted HTML
//! - `POST /currencies` updates exchange rates from a JSON object

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use calc_core::{evaluate_source, render_html, CurrencyRates, UnitCatalog};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// Application State
pub struct AppState {
    /// Evaluations hold the read lock for their whole run, so a rate update
    /// never lands halfway through a document.
    catalog: RwLock<UnitCatalog>,
}

impl AppState {
    pub fn new(catalog: UnitCatalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/execute", post(execute))
        .route("/colorize", post(colorize))
        .route("/currencies", post(update_currencies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, catalog: UnitCatalog) -> std::io::Result<()> {
    let app = router(Arc::new(AppState::new(catalog)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await
}

async fn root() -> &'static str {
    "calc server is running"
}

async fn execute(State(state): State<Arc<AppState>>, body: String) -> Response {
    let catalog = state.catalog.read().unwrap_or_else(PoisonError::into_inner);

    match evaluate_source(&body, &catalog) {
        Ok(document) => document.execution_result().into_response(),
        Err(err) => {
            warn!("execute rejected: {}", err);
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response()
        }
    }
}

async fn colorize(body: String) -> Html<String> {
    Html(render_html(&body))
}

async fn update_currencies(
    State(state): State<Arc<AppState>>,
    Json(rates): Json<CurrencyRates>,
) -> (StatusCode, Json<Value>) {
    let mut catalog = state.catalog.write().unwrap_or_else(PoisonError::into_inner);

    match catalog.set_currency_rates(&rates) {
        Ok(()) => {
            info!("updated {} currency rates", rates.0.len());
            (StatusCode::OK, Json(json!({ "ok": true })))
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        ),
    }
}
