//! Konoha Events application composition root
//!
//! Wires the document store and notification service into the waitlist
//! domain and composes its router with the shared infrastructure routes.

use axum::Router;
use konoha_common::Config;
use konoha_docstore::{DocumentStoreFactory, StoreConfig};
use konoha_notifications::{NotificationConfig, NotificationServiceFactory};
use konoha_waitlist::{
    CapacityPolicy, RegistrationGuard, WaitlistRepositories, WaitlistService, WaitlistState,
};

/// Create the main application router with all routes and middleware
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let store = DocumentStoreFactory::create(&StoreConfig {
        provider: config.store_provider.clone(),
        database_url: config.database_url.clone(),
    })
    .await?;

    let notifier = NotificationServiceFactory::create(
        &NotificationConfig {
            provider: config.notification_provider.clone(),
        },
        store.clone(),
    )?;

    let policy: CapacityPolicy = config
        .capacity_policy
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    tracing::info!(capacity_policy = ?policy, "Registration guard configured");

    let service = WaitlistService::new(
        WaitlistRepositories::new(store),
        notifier,
        RegistrationGuard::new(policy),
    );

    Ok(build_router(service))
}

/// Compose the waitlist router around an already wired service
pub fn build_router(service: WaitlistService) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Konoha Events Waitlist API v0.0.1-SNAPSHOT" }),
        )
        .merge(konoha_waitlist::routes().with_state(WaitlistState::new(service)))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
