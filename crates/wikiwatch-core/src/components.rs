//! The three independently-runnable bot components and the set of them that
//! is enabled for a run.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── ComponentName ─────────────────────────────────────────────────────────────

/// One of the runnable components.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentName {
    /// Interactive chat front-end; the delivery target for notifications.
    Frontend,
    /// Passive recent-changes feed watcher.
    Watcher,
    /// Minute-tick task scheduler.
    Scheduler,
}

impl ComponentName {
    /// Lowercase name as used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentName::Frontend => "frontend",
            ComponentName::Watcher => "watcher",
            ComponentName::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ComponentSet ──────────────────────────────────────────────────────────────

/// The enabled components, read once at startup.
///
/// Duplicates collapse; iteration order is the enum declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet(BTreeSet<ComponentName>);

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: ComponentName) -> bool {
        self.0.insert(name)
    }

    pub fn contains(&self, name: ComponentName) -> bool {
        self.0.contains(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentName> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ComponentName> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ComponentName::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
