//! In-process navigator for native hosts.
//!
//! Desktop shells render routes themselves; this navigator records the command
//! history and exposes the current route so the shell (or a test) can react.
//! The log is bounded; once full, the oldest commands are dropped.

use bridge_traits::{
    error::Result,
    navigation::{NavigationTarget, Navigator},
};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Commands kept by [`HistoryNavigator::new`].
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Navigator that keeps an ordered, bounded log of navigation commands.
#[derive(Debug)]
pub struct HistoryNavigator {
    state: Mutex<HistoryState>,
    limit: usize,
}

#[derive(Debug, Default)]
struct HistoryState {
    current: Option<String>,
    history: VecDeque<NavigationTarget>,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` commands (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            limit: limit.max(1),
        }
    }

    /// Start at a given route, as if the user had loaded it directly.
    pub fn starting_at(route: impl Into<String>) -> Self {
        let navigator = Self::default();
        navigator.lock().current = Some(route.into());
        navigator
    }

    /// Retained commands, oldest first.
    pub fn history(&self) -> Vec<NavigationTarget> {
        self.lock().history.iter().cloned().collect()
    }

    /// Most recent command, if any.
    pub fn last(&self) -> Option<NavigationTarget> {
        self.lock().history.back().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        // A poisoned log is still a valid log.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, target: NavigationTarget) -> Result<()> {
        debug!(target = %target, "Navigating");
        let mut state = self.lock();
        state.current = Some(target.location().to_string());
        if state.history.len() == self.limit {
            state.history.pop_front();
        }
        state.history.push_back(target);
        Ok(())
    }

    fn current_route(&self) -> Option<String> {
        self.lock().current.clone()
    }
}
