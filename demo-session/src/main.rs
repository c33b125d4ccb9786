mod handlers;
mod server;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use session_kit_axum::{
    CookieCodec, InMemorySessionStore, SessionConfig, SessionManager, ensure_session,
    require_auth, session_middleware,
};

use handlers::{index, login, logout, logout_everywhere, protected, refresh, whoami};
use server::{init_tracing, spawn_http_server};

fn load_codec() -> Result<CookieCodec, Box<dyn std::error::Error>> {
    match std::env::var("SESSION_SECRET") {
        Ok(secret) => Ok(CookieCodec::new(secret.as_bytes())?),
        Err(_) => {
            tracing::warn!(
                "SESSION_SECRET not set; using a random secret, sessions will not survive a restart"
            );
            let secret = CookieCodec::generate_secret()?;
            Ok(CookieCodec::new(secret.as_bytes())?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_session");

    let config = SessionConfig::from_env();
    let store = Arc::new(InMemorySessionStore::with_cleanup_interval(
        config.cleanup_interval,
    ));
    let manager = Arc::new(
        SessionManager::builder()
            .config(config)
            .store(store.clone())
            .cookie_codec(Arc::new(load_codec()?))
            .default_fingerprint()
            .build()?,
    );

    let app = Router::new()
        .route(
            "/",
            get(index).route_layer(from_fn_with_state(manager.clone(), ensure_session)),
        )
        .route(
            "/whoami",
            get(whoami).route_layer(from_fn_with_state(manager.clone(), session_middleware)),
        )
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route(
            "/protected",
            get(protected).route_layer(from_fn_with_state(manager.clone(), require_auth)),
        )
        .route(
            "/logout-everywhere",
            post(logout_everywhere).route_layer(from_fn_with_state(manager.clone(), require_auth)),
        )
        .with_state(manager.clone());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let server = spawn_http_server(port, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server task failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
        }
    }

    manager.shutdown().await;
    store.close().await;
    Ok(())
}
