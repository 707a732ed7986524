//! Composition root: configuration, tracing, store, provider, router.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use podcast_billing::adapters::http::{build_app, SubscriptionAppState};
use podcast_billing::adapters::{
    PostgresSubscriptionRepository, PostgresUserAccessRepository, StripeBillingAdapter,
    StripeConfig,
};
use podcast_billing::application::handlers::subscription::{
    HandleBillingWebhookHandler, ReconcileSubscriptionHandler, SubscriptionStatusService,
};
use podcast_billing::config::AppConfig;
use podcast_billing::domain::subscription::StripeWebhookVerifier;
use podcast_billing::ports::{BillingProvider, SubscriptionRepository, UserAccessRepository};
use podcast_billing::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    telemetry::init(&config.server);

    let pool = config
        .database
        .connect()
        .await
        .context("connecting to PostgreSQL")?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        tracing::info!("Database migrations applied");
    }

    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let users: Arc<dyn UserAccessRepository> =
        Arc::new(PostgresUserAccessRepository::new(pool));

    let stripe_config = StripeConfig::new(config.payment.stripe_api_key.clone())
        .with_base_url(config.payment.api_base_url.clone())
        .with_timeout(config.payment.request_timeout());
    let billing: Arc<dyn BillingProvider> = Arc::new(
        StripeBillingAdapter::new(stripe_config).context("building Stripe client")?,
    );

    let verifier = StripeWebhookVerifier::with_tolerance(
        config.payment.stripe_webhook_secret.expose_secret().clone(),
        config.payment.signature_tolerance_secs as i64,
    );
    let reconciler = Arc::new(ReconcileSubscriptionHandler::new(
        subscriptions.clone(),
        users.clone(),
    ));

    let state = SubscriptionAppState {
        webhook_handler: Arc::new(HandleBillingWebhookHandler::new(
            verifier, billing, reconciler,
        )),
        status_service: SubscriptionStatusService::new(users, subscriptions),
    };

    let app = build_app(state, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!(
        %addr,
        stripe_test_mode = config.payment.is_test_mode(),
        "Podcast billing listening"
    );

    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
