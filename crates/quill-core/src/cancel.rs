use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Signals that a long-running walk was cooperatively cancelled.
///
/// Cancellation is a normal control-flow outcome for callers (the computation
/// simply did not finish); it must never leave a partially-committed cache
/// entry behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("computation cancelled")]
pub struct Cancelled;

/// Shared cooperative cancellation flag.
///
/// Long-running resolution walks (on-demand package member enumeration and
/// the like) call [`CancelToken::check`] periodically and abort cleanly.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_fails_only_after_cancel() {
        let token = CancelToken::new();
        assert_eq!(token.check(), Ok(()));
        token.cancel();
        assert_eq!(token.check(), Err(Cancelled));
    }
}
