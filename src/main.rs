use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use support_intake::application::{
    ApplicationManager, ApplicationRouteState, StepValidator, application_routes,
};
use support_intake::config::IntakeConfig;
use support_intake::error::ConfigError;
use support_intake::services::{
    HttpRegistrationService, OpenAiSuggestionService, RegistrationService,
    SimulatedRegistrationService, SuggestionConfig, SuggestionService,
    UnconfiguredSuggestionService,
};
use support_intake::store::{LibSqlStore, MemoryStore, SnapshotStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = IntakeConfig::from_env()?;

    // Initialize tracing. The guard flushes the file writer on exit.
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::Logging(e.to_string()))?;
            let appender = tracing_appender::rolling::daily(dir, "support-intake.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    eprintln!("📝 Support Intake v{}", env!("CARGO_PKG_VERSION"));

    // ── Snapshot store ──────────────────────────────────────────────────
    let store: Arc<dyn SnapshotStore> =
        match LibSqlStore::new_local(&config.db_path, config.namespace.clone()).await {
            Ok(store) => {
                eprintln!("   Database: {}", config.db_path.display());
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot store unavailable; progress will not survive a restart");
                eprintln!("   Database: unavailable, using in-memory snapshots");
                Arc::new(MemoryStore::new())
            }
        };

    // ── Collaborators ───────────────────────────────────────────────────
    let suggestions: Arc<dyn SuggestionService> = match SuggestionConfig::from_env() {
        Some(suggestion_config) => {
            let service = OpenAiSuggestionService::new(suggestion_config);
            eprintln!("   Suggestions: {}", service.model());
            Arc::new(service)
        }
        None => {
            eprintln!("   Suggestions: disabled (OPENAI_API_KEY not set)");
            Arc::new(UnconfiguredSuggestionService)
        }
    };

    let registration: Arc<dyn RegistrationService> = match &config.submit_url {
        Some(url) => {
            let service = HttpRegistrationService::new(url.clone(), config.submit_timeout);
            eprintln!("   Registration: {}", service.endpoint());
            Arc::new(service)
        }
        None => {
            eprintln!(
                "   Registration: simulated ({} ms)",
                config.simulated_submit_delay.as_millis()
            );
            Arc::new(SimulatedRegistrationService::new(
                config.simulated_submit_delay,
            ))
        }
    };

    // ── Application ─────────────────────────────────────────────────────
    let manager = Arc::new(
        ApplicationManager::restore(store, suggestions, registration, StepValidator::default())
            .await,
    );
    let app = application_routes(ApplicationRouteState { manager });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("   API: http://{addr}/api/application\n");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
