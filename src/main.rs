use anyhow::Context;
use ctstudio_api::{
    auth::AuthService,
    config::{init_tracing, load_config},
    db,
    events::{process_events, EventSender},
    handlers::AppServices,
    mailer::ContactMailer,
    payments::StripeClient,
    AppState,
};
use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(&config.log_level);

    let db = Arc::new(
        db::establish_connection(&config)
            .await
            .context("failed to connect to the database")?,
    );
    if config.auto_migrate {
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let (event_sender, event_receiver) = EventSender::channel(1024);
    tokio::spawn(process_events(event_receiver));

    let stripe = match &config.stripe_secret_key {
        Some(key) => Some(Arc::new(StripeClient::new(
            key.clone(),
            config.stripe_api_base.clone(),
        ))),
        None => {
            warn!("STRIPE_SECRET_KEY not set, checkout is disabled");
            None
        }
    };
    let mailer = match &config.resend_api_key {
        Some(key) => Some(Arc::new(ContactMailer::new(
            key.clone(),
            config.resend_api_base.clone(),
            config.contact_recipient.clone(),
        ))),
        None => {
            warn!("RESEND_API_KEY not set, contact form is disabled");
            None
        }
    };

    let auth = Arc::new(AuthService::new(&config));
    let services = AppServices::new(
        db.clone(),
        event_sender.clone(),
        stripe,
        mailer,
        config.clone(),
    );

    let state = AppState {
        db,
        config: config.clone(),
        auth,
        services,
        event_sender,
    };

    let app = ctstudio_api::app_router(state).layer(cors_layer(&config.cors_allowed_origins));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, environment = %config.environment, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

fn cors_layer(allowed_origins: &Option<String>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    match allowed_origins {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            layer.allow_origin(AllowOrigin::list(parsed))
        }
        None => layer.allow_origin(Any),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
