//! Detection of brush-color changes made outside the synchronized UI.
//!
//! The host offers no change notification for its brush color; a user can
//! alt-click-sample or switch tool presets and the engine would never hear
//! about it. The watcher polls the paint context and reports a change only
//! when the color moved beyond an epsilon, so the poll loop stays quiet
//! while nothing happens.

use crate::color::LinearRgb;
use crate::host::PaintContext;

/// Polls the host brush color and reports movements beyond `epsilon`.
pub struct ExternalColorWatcher {
    last: Option<LinearRgb>,
    epsilon: f64,
}

impl ExternalColorWatcher {
    pub fn new(epsilon: f64) -> Self {
        Self {
            last: None,
            epsilon,
        }
    }

    /// Returns the new brush color when it moved more than `epsilon` on any
    /// channel since the last poll, `None` otherwise. The first poll with a
    /// readable color always reports, seeding the baseline.
    pub fn poll(&mut self, ctx: &dyn PaintContext) -> Option<LinearRgb> {
        let current = ctx.brush_color()?;
        let changed = match self.last {
            Some(last) => {
                (current.r - last.r).abs() > self.epsilon
                    || (current.g - last.g).abs() > self.epsilon
                    || (current.b - last.b).abs() > self.epsilon
            }
            None => true,
        };
        if changed {
            self.last = Some(current);
            Some(current)
        } else {
            None
        }
    }

    /// Adopts `color` as the baseline without reporting it. Called after the
    /// engine itself writes the brush, so its own write does not echo back
    /// as an external change.
    pub fn mark_synced(&mut self, color: LinearRgb) {
        self.last = Some(color);
    }

    /// Forgets the baseline; the next readable poll reports unconditionally.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<LinearRgb> {
        self.last
    }
}
