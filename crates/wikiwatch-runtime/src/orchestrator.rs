//! Decides where each enabled component runs and drives them to shutdown.
//!
//! Planning is a pure function of the enabled [`ComponentSet`]: the
//! highest-priority component (front-end, then scheduler, then watcher) runs
//! on the caller's task and the others run as background tasks. When the main
//! component returns, or the shutdown future resolves, every component is
//! asked to stop and the background tasks are joined.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wikiwatch_core::{ComponentName, ComponentSet, WikiwatchError};

use crate::error::RuntimeError;
use crate::frontend::{Frontend, FrontendExit};
use crate::scheduler::{run_scheduler, SchedulerReport};
use crate::shutdown::{stop_channel, StopSignal};
use crate::supervisor::{SupervisorReport, WatcherSupervisor};
use crate::transport::TaskScheduler;

/// Capacity of the watcher → front-end notification channel.
pub const NOTIFICATION_BUFFER: usize = 64;

/// How long background components get to wind down after a stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

// ── Planning ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Main,
    Background,
}

/// Where each enabled component runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadAssignment {
    pub main: ComponentName,
    /// Background components in start order.
    pub background: Vec<ComponentName>,
    /// Whether the watcher sends its notifications to the front-end.
    pub watcher_forwards: bool,
}

impl ThreadAssignment {
    /// Apply the priority table to `enabled`.
    ///
    /// # Errors
    /// [`WikiwatchError::NoComponents`] when `enabled` is empty.
    pub fn plan(enabled: &ComponentSet) -> Result<Self, WikiwatchError> {
        let watcher = enabled.contains(ComponentName::Watcher);
        let scheduler = enabled.contains(ComponentName::Scheduler);

        let assignment = if enabled.contains(ComponentName::Frontend) {
            let mut background = Vec::new();
            if scheduler {
                background.push(ComponentName::Scheduler);
            }
            if watcher {
                background.push(ComponentName::Watcher);
            }
            Self {
                main: ComponentName::Frontend,
                background,
                watcher_forwards: watcher,
            }
        } else if scheduler {
            Self {
                main: ComponentName::Scheduler,
                background: if watcher { vec![ComponentName::Watcher] } else { vec![] },
                watcher_forwards: false,
            }
        } else if watcher {
            Self {
                main: ComponentName::Watcher,
                background: vec![],
                watcher_forwards: false,
            }
        } else {
            return Err(WikiwatchError::NoComponents);
        };
        Ok(assignment)
    }

    pub fn placement(&self, name: ComponentName) -> Option<Placement> {
        if self.main == name {
            Some(Placement::Main)
        } else if self.background.contains(&name) {
            Some(Placement::Background)
        } else {
            None
        }
    }
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Ready-to-run components, one slot per [`ComponentName`].
///
/// Slots for components that are not enabled are ignored.
#[derive(Default)]
pub struct Collaborators {
    pub frontend: Option<Frontend>,
    pub watcher: Option<WatcherSupervisor>,
    pub scheduler: Option<Box<dyn TaskScheduler>>,
}

enum MainComponent {
    Frontend(Frontend),
    Scheduler(Box<dyn TaskScheduler>),
    Watcher(WatcherSupervisor),
}

/// What a component reported when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentReport {
    Frontend(FrontendExit),
    Scheduler(SchedulerReport),
    Watcher(SupervisorReport),
}

/// Summary of a completed [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub assignment: ThreadAssignment,
    pub main: ComponentReport,
    /// Reports of background components that stopped in time.
    pub background: Vec<ComponentReport>,
}

impl RunReport {
    pub fn watcher(&self) -> Option<SupervisorReport> {
        self.reports().find_map(|r| match r {
            ComponentReport::Watcher(report) => Some(*report),
            _ => None,
        })
    }

    pub fn scheduler(&self) -> Option<SchedulerReport> {
        self.reports().find_map(|r| match r {
            ComponentReport::Scheduler(report) => Some(*report),
            _ => None,
        })
    }

    fn reports(&self) -> impl Iterator<Item = &ComponentReport> {
        std::iter::once(&self.main).chain(self.background.iter())
    }
}

/// Sends the component's name when dropped, so a background task that
/// returns or panics is noticed while the main component is still running.
struct ExitNotice {
    name: ComponentName,
    tx: mpsc::UnboundedSender<ComponentName>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.tx.send(self.name);
    }
}

struct BackgroundTask {
    name: ComponentName,
    handle: JoinHandle<ComponentReport>,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct Orchestrator {
    assignment: ThreadAssignment,
    main: MainComponent,
    background_scheduler: Option<Box<dyn TaskScheduler>>,
    background_watcher: Option<WatcherSupervisor>,
}

impl Orchestrator {
    /// Plan `enabled` and take the collaborators each placed component needs.
    ///
    /// # Errors
    /// [`RuntimeError::Config`] for an empty set and
    /// [`RuntimeError::MissingCollaborator`] when an enabled component has no
    /// collaborator.
    pub fn new(
        enabled: &ComponentSet,
        collaborators: Collaborators,
    ) -> Result<Self, RuntimeError> {
        let assignment = ThreadAssignment::plan(enabled)?;
        let Collaborators {
            mut frontend,
            mut watcher,
            mut scheduler,
        } = collaborators;

        let main = match assignment.main {
            ComponentName::Frontend => {
                MainComponent::Frontend(require(frontend.take(), ComponentName::Frontend)?)
            }
            ComponentName::Scheduler => {
                MainComponent::Scheduler(require(scheduler.take(), ComponentName::Scheduler)?)
            }
            ComponentName::Watcher => {
                MainComponent::Watcher(require(watcher.take(), ComponentName::Watcher)?)
            }
        };
        let background_scheduler = match assignment.placement(ComponentName::Scheduler) {
            Some(Placement::Background) => {
                Some(require(scheduler.take(), ComponentName::Scheduler)?)
            }
            _ => None,
        };
        let background_watcher = match assignment.placement(ComponentName::Watcher) {
            Some(Placement::Background) => Some(require(watcher.take(), ComponentName::Watcher)?),
            _ => None,
        };

        info!(
            main = %assignment.main,
            background = ?assignment.background,
            watcher_forwards = assignment.watcher_forwards,
            "component placement planned"
        );
        Ok(Self {
            assignment,
            main,
            background_scheduler,
            background_watcher,
        })
    }

    pub fn assignment(&self) -> &ThreadAssignment {
        &self.assignment
    }

    /// Run until the main component returns or `shutdown` resolves.
    ///
    /// A front-end main component is connected before any background
    /// component starts.
    ///
    /// # Errors
    /// A front-end transport failure, or a background component exiting while
    /// the main one is still running. Watcher failures never surface here.
    pub async fn run<F>(self, shutdown: F) -> Result<RunReport, RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let Self {
            assignment,
            mut main,
            background_scheduler,
            background_watcher,
        } = self;

        tokio::pin!(shutdown);

        // The front-end registers before anything can forward to it.
        if let MainComponent::Frontend(frontend) = &mut main {
            let connected = tokio::select! {
                result = frontend.connect() => Some(result),
                _ = &mut shutdown => None,
            };
            match connected {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    error!(error = %e, "front-end could not connect");
                    frontend.close().await;
                    return Err(RuntimeError::Frontend(e));
                }
                None => {
                    info!("shutdown requested while the front-end was connecting");
                    frontend.close().await;
                    return Ok(RunReport {
                        assignment,
                        main: ComponentReport::Frontend(FrontendExit::Stopped),
                        background: Vec::new(),
                    });
                }
            }
        }

        let (stop_handle, stop) = stop_channel();
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
        let (forward_tx, forward_rx) = if assignment.watcher_forwards {
            let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let mut background = Vec::new();
        if let Some(mut scheduler) = background_scheduler {
            background.push(spawn_background(ComponentName::Scheduler, &exit_tx, {
                let stop = stop.clone();
                async move {
                    ComponentReport::Scheduler(run_scheduler(scheduler.as_mut(), stop).await)
                }
            }));
        }
        if let Some(mut supervisor) = background_watcher {
            if let Some(tx) = forward_tx {
                supervisor = supervisor.with_forwarding(tx);
            }
            background.push(spawn_background(ComponentName::Watcher, &exit_tx, {
                let stop = stop.clone();
                async move { ComponentReport::Watcher(supervisor.run(stop).await) }
            }));
        }

        info!(component = %assignment.main, "running main component");
        let outcome = {
            let main_run = run_main(&mut main, forward_rx, stop);
            tokio::pin!(main_run);
            tokio::select! {
                result = &mut main_run => result,
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    stop_handle.stop();
                    main_run.await
                }
                Some(name) = exit_rx.recv() => {
                    error!(component = %name, "background component exited unexpectedly");
                    stop_handle.stop();
                    let _ = main_run.await;
                    Err(RuntimeError::ComponentExited(name))
                }
            }
        };

        stop_handle.stop();
        let background = join_background(background).await;
        if let MainComponent::Frontend(frontend) = &mut main {
            frontend.close().await;
        }
        drop(exit_tx);

        let main = outcome?;
        info!(main = ?main, background = ?background, "all components stopped");
        Ok(RunReport {
            assignment,
            main,
            background,
        })
    }
}

fn require<T>(slot: Option<T>, name: ComponentName) -> Result<T, RuntimeError> {
    slot.ok_or(RuntimeError::MissingCollaborator(name))
}

fn spawn_background<F>(
    name: ComponentName,
    exit_tx: &mpsc::UnboundedSender<ComponentName>,
    run: F,
) -> BackgroundTask
where
    F: Future<Output = ComponentReport> + Send + 'static,
{
    info!(component = %name, "starting background component");
    let notice = ExitNotice {
        name,
        tx: exit_tx.clone(),
    };
    let handle = tokio::spawn(async move {
        let _notice = notice;
        run.await
    });
    BackgroundTask { name, handle }
}

async fn run_main(
    main: &mut MainComponent,
    notifications: Option<mpsc::Receiver<String>>,
    stop: StopSignal,
) -> Result<ComponentReport, RuntimeError> {
    match main {
        MainComponent::Frontend(frontend) => frontend
            .run(notifications, stop)
            .await
            .map(ComponentReport::Frontend)
            .map_err(RuntimeError::Frontend),
        MainComponent::Scheduler(scheduler) => Ok(ComponentReport::Scheduler(
            run_scheduler(scheduler.as_mut(), stop).await,
        )),
        MainComponent::Watcher(supervisor) => {
            Ok(ComponentReport::Watcher(supervisor.run(stop).await))
        }
    }
}

async fn join_background(tasks: Vec<BackgroundTask>) -> Vec<ComponentReport> {
    let mut reports = Vec::new();
    for BackgroundTask { name, mut handle } in tasks {
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(Ok(report)) => {
                debug!(component = %name, "background component stopped");
                reports.push(report);
            }
            Ok(Err(e)) => error!(component = %name, error = %e, "background component failed"),
            Err(_) => {
                warn!(component = %name, "background component did not stop in time; aborting");
                handle.abort();
            }
        }
    }
    reports
}

// ── Tests ─────────────────────────────────────────────────────────────────────
