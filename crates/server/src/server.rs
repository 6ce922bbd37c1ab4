use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use std::sync::Arc;

use crate::{
    auth::{self, Credentials},
    categories, dashboard, export, records, user,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub credentials: Arc<Credentials>,
}

impl ServerState {
    pub fn new(engine: Engine, credentials: Credentials) -> Self {
        Self {
            engine: Arc::new(engine),
            credentials: Arc::new(credentials),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the full HTTP surface. Everything except registration, login and
/// the health probe sits behind [`auth::require_identity`].
pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/user/profile", get(user::profile))
        .route("/user/settings", put(user::update_settings))
        .route("/categories", get(categories::list))
        .route("/income", get(records::list_income).post(records::create_income))
        .route(
            "/income/{id}",
            get(records::get_income)
                .put(records::update_income)
                .delete(records::delete_income),
        )
        .route(
            "/expense",
            get(records::list_expense).post(records::create_expense),
        )
        .route(
            "/expense/{id}",
            get(records::get_expense)
                .put(records::update_expense)
                .delete(records::delete_expense),
        )
        .route("/dashboard", get(dashboard::summary))
        .route("/export/pdf", get(export::report_pdf))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_identity,
        ));

    Router::new()
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
