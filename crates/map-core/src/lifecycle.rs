//! Lifecycle
//!
//! Phase bookkeeping for the frame scheduler. Construction is two-phase so a
//! host can load assets asynchronously; requests that arrive in between are
//! recorded here and resolved when construction finishes.

use map_events::LifecyclePhase;

use crate::error::SceneError;
use crate::scheduler::Viewport;

/// What the scheduler should do with a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDisposition {
    /// Not started yet; remember the size for start.
    Store,
    /// Construction in progress; applied when it finishes.
    Queued,
    /// Running; apply now.
    Apply,
    /// Stopped or failed; nothing to resize.
    Ignored,
}

/// What the scheduler should do with a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDisposition {
    /// Tear the running scene down.
    Teardown,
    /// Construction will be abandoned when it finishes.
    CancelConstruction,
    /// Nothing to do.
    AlreadyInactive,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lifecycle {
    phase: LifecyclePhase,
    pending_resize: Option<Viewport>,
    stop_requested: bool,
    failure: Option<String>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn pending_resize(&self) -> Option<Viewport> {
        self.pending_resize
    }

    /// Enter `Constructing`. A scene can be restarted after it stopped or
    /// failed, but never while one is live.
    pub fn begin_construction(&mut self) -> Result<(), SceneError> {
        match self.phase {
            LifecyclePhase::Idle | LifecyclePhase::Stopped | LifecyclePhase::Failed => {
                self.phase = LifecyclePhase::Constructing;
                self.pending_resize = None;
                self.stop_requested = false;
                self.failure = None;
                Ok(())
            }
            phase => Err(SceneError::InvalidTransition {
                action: "start",
                phase,
            }),
        }
    }

    pub fn request_resize(&mut self, viewport: Viewport) -> ResizeDisposition {
        match self.phase {
            LifecyclePhase::Idle => ResizeDisposition::Store,
            LifecyclePhase::Constructing => {
                self.pending_resize = Some(viewport);
                ResizeDisposition::Queued
            }
            LifecyclePhase::Running => ResizeDisposition::Apply,
            LifecyclePhase::Stopped | LifecyclePhase::Failed => ResizeDisposition::Ignored,
        }
    }

    pub fn request_stop(&mut self) -> StopDisposition {
        match self.phase {
            LifecyclePhase::Running => {
                self.phase = LifecyclePhase::Stopped;
                StopDisposition::Teardown
            }
            LifecyclePhase::Constructing => {
                self.stop_requested = true;
                StopDisposition::CancelConstruction
            }
            _ => StopDisposition::AlreadyInactive,
        }
    }

    /// Leave `Constructing`. Returns the last queued resize on success, or
    /// [`SceneError::Cancelled`] if a stop arrived meanwhile.
    pub fn finish_construction(&mut self) -> Result<Option<Viewport>, SceneError> {
        if self.phase != LifecyclePhase::Constructing {
            return Err(SceneError::InvalidTransition {
                action: "finish construction",
                phase: self.phase,
            });
        }

        let queued = self.pending_resize.take();
        if self.stop_requested {
            self.stop_requested = false;
            self.phase = LifecyclePhase::Stopped;
            return Err(SceneError::Cancelled);
        }

        self.phase = LifecyclePhase::Running;
        Ok(queued)
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.phase = LifecyclePhase::Failed;
        self.pending_resize = None;
        self.stop_requested = false;
        self.failure = Some(reason.into());
    }
}
