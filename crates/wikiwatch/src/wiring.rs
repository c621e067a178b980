//! Builds the runtime collaborators for the enabled components.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use wikiwatch_core::settings::BotConfig;
use wikiwatch_core::{ComponentName, ComponentSet};
use wikiwatch_feed::{EventParser, FeedPipeline};
use wikiwatch_runtime::{
    Collaborators, Frontend, IrcFeedConnector, IrcFrontend, TaskRegistry, WatcherSupervisor,
};

/// One collaborator per enabled component that has what it needs in `config`.
///
/// [`BotConfig::validate`] reports missing sections before this is called.
pub fn collaborators(config: &BotConfig, enabled: &ComponentSet) -> Collaborators {
    let mut collaborators = Collaborators::default();

    if enabled.contains(ComponentName::Frontend) {
        if let Some(frontend) = &config.frontend {
            collaborators.frontend = Some(Frontend::new(
                Box::new(IrcFrontend::new(frontend)),
                frontend.notify_targets().to_vec(),
            ));
        }
    }

    if enabled.contains(ComponentName::Watcher) {
        if let Some(watcher) = &config.watcher {
            let pipeline = FeedPipeline::new(EventParser::new(config.article_path.clone()));
            collaborators.watcher = Some(WatcherSupervisor::new(
                Arc::new(IrcFeedConnector::new(watcher.clone())),
                pipeline,
                Duration::from_secs(config.watcher_backoff_secs),
            ));
        }
    }

    if enabled.contains(ComponentName::Scheduler) {
        let registry = TaskRegistry::new();
        if registry.is_empty() {
            info!("no scheduled tasks registered");
        }
        collaborators.scheduler = Some(Box::new(registry));
    }

    collaborators
}
