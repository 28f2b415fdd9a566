//! Mount lifetime tracking.
//!
//! A [`MountScope`] lives as long as one top-level mount of the route guard.
//! Dropping it cancels the scope, and a verification still outstanding for
//! that mount is abandoned instead of applied.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::types::MountId;

#[derive(Debug)]
pub struct MountScope {
    id: MountId,
    token: CancellationToken,
    verification_claimed: AtomicBool,
}

impl MountScope {
    pub fn new() -> Self {
        Self {
            id: MountId::new(),
            token: CancellationToken::new(),
            verification_claimed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> MountId {
        self.id
    }

    /// End the mount early. Equivalent to dropping the scope.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the mount ends.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Token that is cancelled together with this mount, for host tasks
    /// bound to the same lifetime.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Returns `true` exactly once per mount: the caller that gets it owns
    /// the mount's single verification request.
    pub(crate) fn claim_verification(&self) -> bool {
        !self.verification_claimed.swap(true, Ordering::AcqRel)
    }
}

impl Default for MountScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MountScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_is_claimed_once() {
        let scope = MountScope::new();
        assert!(scope.claim_verification());
        assert!(!scope.claim_verification());
    }

    #[test]
    fn test_drop_cancels_child_tokens() {
        let scope = MountScope::new();
        let child = scope.child_token();
        assert!(!child.is_cancelled());

        drop(scope);
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_after_cancel() {
        let scope = MountScope::new();
        scope.cancel();
        scope.cancelled().await;
        assert!(scope.is_cancelled());
    }
}
