mod bootstrap;
mod wiring;

use anyhow::Result;
use wikiwatch_core::settings::Settings;
use wikiwatch_runtime::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("wikiwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.bot_config().map_err(|e| {
        tracing::error!(error = %e, "could not load configuration");
        e
    })?;
    if settings.save_config {
        let path = settings.config_file();
        config.save_to(&path).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "could not save configuration");
            e
        })?;
        tracing::info!(path = %path.display(), "configuration saved");
        return Ok(());
    }

    config.validate().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        e
    })?;

    let enabled = config.component_set();
    tracing::info!("Components: {}", enabled);

    let collaborators = wiring::collaborators(&config, &enabled);
    let orchestrator = match Orchestrator::new(&enabled, collaborators) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!(error = %e, "fatal: cannot start");
            return Err(e.into());
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C; run until the main component stops");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl+C received");
    };

    match orchestrator.run(shutdown).await {
        Ok(report) => {
            if let Some(watcher) = report.watcher() {
                tracing::info!(
                    attempts = watcher.attempts,
                    failures = watcher.failures,
                    "watcher summary"
                );
            }
            tracing::info!(main = %report.assignment.main, "wikiwatch stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "fatal: component failed");
            Err(e.into())
        }
    }
}
