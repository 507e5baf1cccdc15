//! Platform abstraction for the form runtime.
//!
//! The runtime never drives itself: it tells the host that deferred work is
//! waiting, and the host decides when to run its next update pass and commit.

/// Receives wake-up requests from the form runtime.
///
/// Implementations must be safe to share across threads even though the
/// runtime itself only runs on the thread that owns the form tree.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run another update pass followed by a commit.
    fn schedule_frame(&self);
}
