//! Press/drag/release gesture state for interactive color picking.
//!
//! A drag on the wheel or a slider is one logical edit, not a stream of
//! independent ones. The stroke captures the color at press so a cancel
//! (Escape mid-drag) can restore it, and arms the write-cache flush at
//! release so host writes commit once per gesture instead of per drag event.

use crate::arbiter::Source;
use crate::cache::WriteCache;
use crate::color::LinearRgb;
use crate::sync::{ColorInput, Mode, SyncEngine};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
enum StrokeState {
    Idle,
    Active { original: LinearRgb },
}

/// One in-progress picking gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStroke {
    state: StrokeState,
}

impl ColorStroke {
    pub fn new() -> Self {
        Self {
            state: StrokeState::Idle,
        }
    }

    /// Begins a gesture, capturing the current color for a possible cancel.
    ///
    /// Rejected when a different source holds the arbiter (a flush or
    /// another handler mid-update) or a gesture is already active.
    pub fn press(&mut self, engine: &SyncEngine) -> bool {
        if self.is_active() || engine.arbiter().busy_with_other(Source::Brush) {
            return false;
        }
        self.state = StrokeState::Active {
            original: engine.canonical(),
        };
        true
    }

    /// Propagates one drag sample as an absolute update. No-op when no
    /// gesture is active.
    pub fn drag(&mut self, engine: &mut SyncEngine, input: ColorInput) -> bool {
        if !self.is_active() {
            return false;
        }
        engine.propagate(Source::Brush, input, Mode::Absolute)
    }

    /// Ends the gesture and arms the cache flush so deferred host writes
    /// commit now.
    pub fn release(&mut self, cache: &mut WriteCache, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = StrokeState::Idle;
        cache.request_flush(now);
        true
    }

    /// Aborts the gesture and restores the press-time color.
    pub fn cancel(&mut self, engine: &mut SyncEngine) -> bool {
        let StrokeState::Active { original } = self.state else {
            return false;
        };
        self.state = StrokeState::Idle;
        engine.propagate(Source::Brush, ColorInput::Linear(original), Mode::Absolute)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, StrokeState::Active { .. })
    }

    /// Color captured at press, while the gesture is active.
    pub fn original(&self) -> Option<LinearRgb> {
        match self.state {
            StrokeState::Active { original } => Some(original),
            StrokeState::Idle => None,
        }
    }
}

impl Default for ColorStroke {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FlushPolicy;
    use crate::color::Srgb;
    use crate::config::SyncConfig;

    fn engine_and_cache() -> (SyncEngine, WriteCache) {
        let config = SyncConfig::default();
        let engine = SyncEngine::with_config(config.clone());
        let cache = WriteCache::new(engine.arbiter(), FlushPolicy::OnRelease, &config);
        (engine, cache)
    }

    #[test]
    fn press_drag_release_updates_color_and_arms_flush() {
        let (mut engine, mut cache) = engine_and_cache();
        let mut stroke = ColorStroke::new();

        assert!(stroke.press(&engine));
        assert!(stroke.drag(
            &mut engine,
            ColorInput::Rgb(Srgb {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            }),
        ));
        assert_eq!(engine.hex(), "#FF0000");

        let now = Instant::now();
        cache.stage(
            "layer1",
            "fill",
            engine.canonical(),
            crate::host::ColorSpaceTag::Linear,
            now,
        );
        assert!(stroke.release(&mut cache, now));
        assert!(!stroke.is_active());
        assert_eq!(cache.deadline(), Some(now), "release arms the flush");
    }

    #[test]
    fn drag_without_press_is_a_no_op() {
        let (mut engine, _cache) = engine_and_cache();
        let mut stroke = ColorStroke::new();
        let before = engine.hex().to_string();
        assert!(!stroke.drag(
            &mut engine,
            ColorInput::Hex("#123456".into()),
        ));
        assert_eq!(engine.hex(), before);
    }

    #[test]
    fn cancel_restores_the_press_time_color() {
        let (mut engine, _cache) = engine_and_cache();
        let original = engine.canonical();
        let mut stroke = ColorStroke::new();

        assert!(stroke.press(&engine));
        stroke.drag(
            &mut engine,
            ColorInput::Hex("#00FF00".into()),
        );
        assert_ne!(engine.canonical(), original);

        assert!(stroke.cancel(&mut engine));
        assert!(!stroke.is_active());
        assert_eq!(engine.canonical(), original);
    }

    #[test]
    fn press_is_rejected_while_another_source_holds_the_arbiter() {
        let (engine, _cache) = engine_and_cache();
        let arbiter = engine.arbiter();
        let _session = arbiter.try_begin(Source::Lab).unwrap();

        let mut stroke = ColorStroke::new();
        assert!(!stroke.press(&engine));
        assert!(!stroke.is_active());
    }

    #[test]
    fn double_press_is_rejected() {
        let (engine, _cache) = engine_and_cache();
        let mut stroke = ColorStroke::new();
        assert!(stroke.press(&engine));
        assert!(!stroke.press(&engine));
    }

    #[test]
    fn release_without_press_does_nothing() {
        let (_engine, mut cache) = engine_and_cache();
        let mut stroke = ColorStroke::new();
        assert!(!stroke.release(&mut cache, Instant::now()));
        assert_eq!(cache.deadline(), None);
    }

    #[test]
    fn original_is_exposed_only_while_active() {
        let (engine, _cache) = engine_and_cache();
        let mut stroke = ColorStroke::new();
        assert_eq!(stroke.original(), None);
        stroke.press(&engine);
        assert_eq!(stroke.original(), Some(engine.canonical()));
    }
}
