//! Update-cycle arbitration: the reentrancy guard that keeps N representations
//! of one color from updating each other forever.
//!
//! The arbiter is a two-state machine, idle or propagating with a source tag.
//! Acquisition is scoped: [`UpdateArbiter::try_begin`] hands back an RAII
//! [`UpdateSession`] whose `Drop` releases the arbiter on every exit path,
//! including unwinds. A second acquisition attempt while a session is active
//! is rejected rather than queued; the caller is expected to skip its update
//! entirely, because the in-flight propagation fans out to all
//! representations anyway.
//!
//! The model is cooperative and single-threaded: every entry point runs
//! synchronously on the host's event dispatcher, so a `Cell` is all the
//! state the guard needs. Handlers must check-and-skip; nothing blocks.

use std::cell::Cell;
use std::fmt;

/// Identifies which representation initiated an update, and tags the flush
/// path so cached writes never run mid-propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    RgbBytes,
    RgbFloat,
    Hsv,
    Lab,
    Hex,
    Wheel,
    Brush,
    Palette,
    Group,
    Sampler,
    Flush,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::RgbBytes => "rgb-bytes",
            Source::RgbFloat => "rgb-float",
            Source::Hsv => "hsv",
            Source::Lab => "lab",
            Source::Hex => "hex",
            Source::Wheel => "wheel",
            Source::Brush => "brush",
            Source::Palette => "palette",
            Source::Group => "group",
            Source::Sampler => "sampler",
            Source::Flush => "flush",
        };
        f.write_str(name)
    }
}

/// Process-wide (per session context) reentrancy guard.
///
/// Owned by the session context and shared by handle (`Rc`) between the
/// sync engine and the write cache, rather than living as a module-level
/// global flag.
#[derive(Debug, Default)]
pub struct UpdateArbiter {
    active: Cell<Option<Source>>,
}

impl UpdateArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to start an update session for `source`.
    ///
    /// Returns `None` without any state change while another session is
    /// active; the caller skips its update. On success the returned guard
    /// releases the arbiter when dropped.
    pub fn try_begin(&self, source: Source) -> Option<UpdateSession<'_>> {
        if let Some(active) = self.active.get() {
            tracing::trace!(%source, %active, "update session rejected");
            return None;
        }
        self.active.set(Some(source));
        Some(UpdateSession {
            arbiter: self,
            source,
        })
    }

    /// The source of the in-flight session, if any.
    pub fn active(&self) -> Option<Source> {
        self.active.get()
    }

    /// True while any session is active.
    pub fn is_busy(&self) -> bool {
        self.active.get().is_some()
    }

    /// True while a session from a source other than `source` is active.
    ///
    /// Cooperating writers (the stroke tool loop re-entering for its own
    /// representation) use this instead of [`Self::is_busy`] so they do not
    /// trip over their own guard.
    pub fn busy_with_other(&self, source: Source) -> bool {
        matches!(self.active.get(), Some(active) if active != source)
    }
}

/// Scoped update session; releases the arbiter on drop.
#[derive(Debug)]
pub struct UpdateSession<'a> {
    arbiter: &'a UpdateArbiter,
    source: Source,
}

impl UpdateSession<'_> {
    /// The representation that started this session.
    pub fn source(&self) -> Source {
        self.source
    }
}

impl Drop for UpdateSession<'_> {
    fn drop(&mut self) {
        self.arbiter.active.set(None);
    }
}
