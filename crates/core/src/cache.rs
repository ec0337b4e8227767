//! Write-coalescing cache between the engine and host properties.
//!
//! Rapid slider movement produces many color updates per second; pushing
//! each one through the host property layer is the expensive part, not the
//! conversion math. The cache keeps only the most recent value per
//! `(target, path)` and commits the whole batch in one flush, with a single
//! coalesced refresh per distinct target.
//!
//! The cache owns no timers. The host calls [`WriteCache::tick`] from its
//! event loop with the current instant; deadlines are plain data.

use crate::arbiter::{Source, UpdateArbiter};
use crate::color::LinearRgb;
use crate::config::SyncConfig;
use crate::host::{ColorSpaceTag, PropertySink};
use std::collections::{BTreeSet, HashMap};
use std::mem;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// When staged writes are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Arm a flush for the next tick after every stage.
    Immediate,
    /// Arm a flush `debounce` after the most recent stage; each new stage
    /// pushes the deadline back.
    Debounced,
    /// Hold everything until an explicit [`WriteCache::request_flush`]
    /// (typically the end of a stroke).
    OnRelease,
}

/// What a flush attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The batch was committed.
    Flushed(FlushReport),
    /// Another update session holds the arbiter; nothing was written.
    Busy,
    /// No staged writes (or, from `tick`, no due deadline).
    Empty,
    /// A deadline is armed but not yet due.
    Scheduled,
    /// The deadline was due but the arbiter was busy; re-armed with backoff.
    Deferred,
}

/// Summary of one committed flush.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Entries written successfully.
    pub written: usize,
    /// Entries the sink rejected. They are dropped, not retried.
    pub failed: usize,
    /// Distinct targets refreshed, in sorted order.
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct StagedWrite {
    color: LinearRgb,
    space: ColorSpaceTag,
}

/// Last-write-wins buffer of pending host property writes.
pub struct WriteCache {
    arbiter: Rc<UpdateArbiter>,
    entries: HashMap<(String, String), StagedWrite>,
    policy: FlushPolicy,
    deadline: Option<Instant>,
    debounce: Duration,
    backoff: Duration,
}

impl WriteCache {
    /// The arbiter must be the engine's own; flushing under a private guard
    /// would let a flush interleave with a propagation.
    pub fn new(arbiter: Rc<UpdateArbiter>, policy: FlushPolicy, config: &SyncConfig) -> Self {
        Self {
            arbiter,
            entries: HashMap::new(),
            policy,
            deadline: None,
            debounce: config.debounce(),
            backoff: config.flush_backoff(),
        }
    }

    /// Stages a write, replacing any pending value for the same
    /// `(target, path)`. Arms the flush deadline per the active policy.
    pub fn stage(
        &mut self,
        target: impl Into<String>,
        path: impl Into<String>,
        color: LinearRgb,
        space: ColorSpaceTag,
        now: Instant,
    ) {
        self.entries
            .insert((target.into(), path.into()), StagedWrite { color, space });
        match self.policy {
            FlushPolicy::Immediate => self.deadline = Some(now),
            FlushPolicy::Debounced => self.deadline = Some(now + self.debounce),
            FlushPolicy::OnRelease => {}
        }
    }

    /// Arms an immediate flush regardless of policy. Used at stroke release
    /// and before anything that must observe committed host state.
    pub fn request_flush(&mut self, now: Instant) {
        if !self.entries.is_empty() {
            self.deadline = Some(now);
        }
    }

    /// Drives the deadline. Call from the host event loop.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn PropertySink) -> FlushOutcome {
        match self.deadline {
            Some(due) if now >= due => match self.flush(sink) {
                FlushOutcome::Busy => {
                    self.deadline = Some(now + self.backoff);
                    FlushOutcome::Deferred
                }
                outcome => {
                    self.deadline = None;
                    outcome
                }
            },
            Some(_) => FlushOutcome::Scheduled,
            None => FlushOutcome::Empty,
        }
    }

    /// Commits every staged write under a `Flush` arbiter session.
    ///
    /// Individual sink failures are logged and counted but never abort the
    /// batch; attempted entries are always cleared so a persistently failing
    /// property cannot wedge the cache.
    pub fn flush(&mut self, sink: &mut dyn PropertySink) -> FlushOutcome {
        if self.entries.is_empty() {
            return FlushOutcome::Empty;
        }
        let arbiter = Rc::clone(&self.arbiter);
        let Some(_session) = arbiter.try_begin(Source::Flush) else {
            return FlushOutcome::Busy;
        };

        let entries = mem::take(&mut self.entries);
        let mut report = FlushReport::default();
        let mut targets: BTreeSet<String> = BTreeSet::new();

        for ((target, path), write) in entries {
            if sink.set_property(&target, &path, write.color, write.space) {
                report.written += 1;
            } else {
                tracing::warn!(%target, %path, "property write rejected by host");
                report.failed += 1;
            }
            targets.insert(target);
        }
        for target in &targets {
            sink.refresh_target(target);
        }
        report.targets = targets.into_iter().collect();

        tracing::debug!(
            written = report.written,
            failed = report.failed,
            targets = report.targets.len(),
            "flushed write cache"
        );
        FlushOutcome::Flushed(report)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FlushPolicy) {
        self.policy = policy;
    }

    /// The armed flush deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
