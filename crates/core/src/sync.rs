//! Multi-representation synchronization: one canonical color, N caches.
//!
//! A color change arrives from one representation (a slider, a hex field,
//! the wheel, the sampler), is decoded to canonical linear RGB, and fans
//! out to every other representation's cache within one synchronous call
//! under an exclusive [`UpdateArbiter`] session. Callers therefore observe
//! either "fully updated" or "not updated at all", never a partially
//! propagated state.
//!
//! Handlers that fail to acquire a session skip their update entirely; the
//! in-flight propagation reaches all representations anyway. This
//! check-and-skip discipline is what prevents infinite update recursion,
//! and it is mandatory for every new representation handler.

use crate::arbiter::{Source, UpdateArbiter};
use crate::color::{
    hex_to_srgb_lenient, hsv_to_srgb, lab_to_srgb, linear_to_srgb, srgb_to_hsv, srgb_to_lab,
    srgb_to_linear, Hsv, Lab, LinearRgb, Srgb,
};
use crate::config::SyncConfig;
use crate::host::{PaintContext, SampleBlock};
use std::cell::RefCell;
use std::rc::Rc;

/// A representation-native color value arriving at the engine.
///
/// Display-unit conversion (degrees, percent) happens here and nowhere
/// else; all cached state is normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorInput {
    /// Canonical linear RGB.
    Linear(LinearRgb),
    /// Normalized display sRGB. In relative mode the components are a
    /// signed delta.
    Rgb(Srgb),
    /// 8-bit byte triple. Bytes have no signed delta form, so this input
    /// is always treated as absolute.
    RgbBytes([u8; 3]),
    /// `#RRGGBB` text; malformed input degrades to black. Absolute only.
    Hex(String),
    /// Boundary display units: hue in degrees, saturation/value in percent.
    HsvDegrees { h: f64, s: f64, v: f64 },
    /// Native LAB ranges.
    Lab(Lab),
}

/// Whether an input replaces the current color or nudges it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Absolute,
    /// Add a signed delta in the input's native normalized space, then
    /// clamp per channel.
    Relative,
}

/// The synchronization engine: canonical color plus one cache per
/// representation, all kept equal by [`SyncEngine::propagate`].
pub struct SyncEngine {
    arbiter: Rc<UpdateArbiter>,
    config: SyncConfig,
    paint_ctx: Option<Rc<RefCell<dyn PaintContext>>>,

    canonical: LinearRgb,
    rgb_bytes: [u8; 3],
    rgb_float: Srgb,
    hsv: Hsv,
    lab: Lab,
    hex: String,
    wheel: [f64; 4],
    brush: LinearRgb,
    palette: LinearRgb,
    group: LinearRgb,
    sample_stats: Option<SampleBlock>,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self::with_arbiter(Rc::new(UpdateArbiter::new()), config)
    }

    /// Builds an engine sharing `arbiter` with other components (the write
    /// cache must use the same guard).
    pub fn with_arbiter(arbiter: Rc<UpdateArbiter>, config: SyncConfig) -> Self {
        let display = hex_to_srgb_lenient(&config.default_color);
        let mut engine = Self {
            arbiter,
            config,
            paint_ctx: None,
            canonical: LinearRgb::BLACK,
            rgb_bytes: [0; 3],
            rgb_float: Srgb::BLACK,
            hsv: Hsv {
                h: 0.0,
                s: 0.0,
                v: 0.0,
            },
            lab: Lab {
                l: 0.0,
                a: 0.0,
                b: 0.0,
            },
            hex: String::new(),
            wheel: [0.0, 0.0, 0.0, 1.0],
            brush: LinearRgb::BLACK,
            palette: LinearRgb::BLACK,
            group: LinearRgb::BLACK,
            sample_stats: None,
        };
        engine.fan_out(srgb_to_linear(display), display, None, None);
        engine
    }

    /// Handle to the shared reentrancy guard, for wiring up collaborators.
    pub fn arbiter(&self) -> Rc<UpdateArbiter> {
        Rc::clone(&self.arbiter)
    }

    /// Attaches the brush/tool color sink; every successful propagation
    /// writes the canonical color through it.
    pub fn attach_paint_context(&mut self, ctx: Rc<RefCell<dyn PaintContext>>) {
        self.paint_ctx = Some(ctx);
    }

    /// Decodes `input` and fans the resulting color out to every other
    /// representation.
    ///
    /// Returns `false`, with no observable side effect, when another
    /// update session is already active, or when a LAB input moved less
    /// than the anti-jitter epsilon. Never panics; malformed hex degrades
    /// to black and still fans out.
    pub fn propagate(&mut self, source: Source, input: ColorInput, mode: Mode) -> bool {
        let arbiter = Rc::clone(&self.arbiter);
        let Some(_session) = arbiter.try_begin(source) else {
            return false;
        };

        let mut hsv_native = None;
        let mut lab_native = None;

        let (linear, display) = match input {
            ColorInput::Linear(value) => {
                let linear = match mode {
                    Mode::Absolute => value.clamped(),
                    Mode::Relative => LinearRgb {
                        r: self.canonical.r + value.r,
                        g: self.canonical.g + value.g,
                        b: self.canonical.b + value.b,
                    }
                    .clamped(),
                };
                (linear, linear_to_srgb(linear))
            }
            ColorInput::Rgb(value) => {
                let display = match mode {
                    Mode::Absolute => value.clamped(),
                    Mode::Relative => Srgb {
                        r: self.rgb_float.r + value.r,
                        g: self.rgb_float.g + value.g,
                        b: self.rgb_float.b + value.b,
                    }
                    .clamped(),
                };
                (srgb_to_linear(display), display)
            }
            ColorInput::RgbBytes(bytes) => {
                let display = Srgb::from_bytes(bytes);
                (srgb_to_linear(display), display)
            }
            ColorInput::Hex(text) => {
                let display = hex_to_srgb_lenient(&text);
                (srgb_to_linear(display), display)
            }
            ColorInput::HsvDegrees { h, s, v } => {
                let hsv = match mode {
                    Mode::Absolute => Hsv {
                        h: (h / 360.0).rem_euclid(1.0),
                        s: (s / 100.0).clamp(0.0, 1.0),
                        v: (v / 100.0).clamp(0.0, 1.0),
                    },
                    Mode::Relative => Hsv {
                        h: (self.hsv.h + h / 360.0).rem_euclid(1.0),
                        s: (self.hsv.s + s / 100.0).clamp(0.0, 1.0),
                        v: (self.hsv.v + v / 100.0).clamp(0.0, 1.0),
                    },
                };
                let display = hsv_to_srgb(hsv);
                hsv_native = Some(hsv);
                (srgb_to_linear(display), display)
            }
            ColorInput::Lab(value) => {
                let snap = self.config.lab_snap_threshold;
                let lab = match mode {
                    Mode::Absolute => {
                        // Near-zero slider positions are intent for "exactly
                        // zero"; snapping them kills residual chroma.
                        let snap_channel = |c: f64| if c.abs() < snap { 0.0 } else { c };
                        Lab {
                            l: snap_channel(value.l).clamp(0.0, 100.0),
                            a: snap_channel(value.a).clamp(-128.0, 127.0),
                            b: snap_channel(value.b).clamp(-128.0, 127.0),
                        }
                    }
                    Mode::Relative => Lab {
                        l: (self.lab.l + value.l).clamp(0.0, 100.0),
                        a: (self.lab.a + value.a).clamp(-128.0, 127.0),
                        b: (self.lab.b + value.b).clamp(-128.0, 127.0),
                    },
                };
                let eps = self.config.lab_jitter_epsilon;
                let unchanged = (lab.l - self.lab.l).abs() < eps
                    && (lab.a - self.lab.a).abs() < eps
                    && (lab.b - self.lab.b).abs() < eps;
                if unchanged {
                    // Anti-jitter: a slow slider drag produces sub-epsilon
                    // wiggle that must not trigger downstream writes.
                    return false;
                }
                let display = lab_to_srgb(lab);
                lab_native = Some(lab);
                (srgb_to_linear(display), display)
            }
        };

        self.fan_out(linear, display, hsv_native, lab_native);
        true
    }

    /// Feeds a sampled pixel block in: the mean becomes an absolute
    /// `Sampler` update, the statistics are cached for display only.
    pub fn apply_samples(&mut self, block: &SampleBlock) -> bool {
        let propagated = self.propagate(
            Source::Sampler,
            ColorInput::Linear(block.mean),
            Mode::Absolute,
        );
        if propagated {
            self.sample_stats = Some(block.clone());
        }
        propagated
    }

    /// Rewrites every cache from the new canonical color.
    ///
    /// `hsv` / `lab` carry the decoded native value when the update came
    /// from that representation, so the source's cache keeps exactly what
    /// was set rather than a re-derived (and possibly degenerate) value.
    fn fan_out(&mut self, linear: LinearRgb, display: Srgb, hsv: Option<Hsv>, lab: Option<Lab>) {
        self.canonical = linear;
        self.rgb_float = display;
        self.rgb_bytes = display.to_bytes();
        self.hsv = hsv.unwrap_or_else(|| srgb_to_hsv(display));
        self.lab = lab.unwrap_or_else(|| srgb_to_lab(display));
        self.hex = display.to_hex();
        self.wheel = [display.r, display.g, display.b, self.wheel[3]];
        self.brush = linear;
        self.palette = linear;
        self.group = linear;

        if let Some(ctx) = &self.paint_ctx {
            if !ctx.borrow_mut().set_brush_color(linear) {
                tracing::debug!("host rejected brush color write");
            }
        }
    }

    // -- Accessors (display units at the boundary, normalized inside) --

    /// Canonical linear color.
    pub fn canonical(&self) -> LinearRgb {
        self.canonical
    }

    pub fn rgb_bytes(&self) -> [u8; 3] {
        self.rgb_bytes
    }

    pub fn rgb_float(&self) -> Srgb {
        self.rgb_float
    }

    /// HSV in display units: hue in degrees [0, 360), saturation and value
    /// in percent [0, 100].
    pub fn hsv_degrees(&self) -> (f64, f64, f64) {
        (self.hsv.h * 360.0, self.hsv.s * 100.0, self.hsv.v * 100.0)
    }

    /// HSV normalized to [0, 1] per component.
    pub fn hsv(&self) -> Hsv {
        self.hsv
    }

    pub fn lab(&self) -> Lab {
        self.lab
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Color-wheel RGBA; alpha is preserved across fan-outs.
    pub fn wheel(&self) -> [f64; 4] {
        self.wheel
    }

    pub fn brush_color(&self) -> LinearRgb {
        self.brush
    }

    pub fn palette_color(&self) -> LinearRgb {
        self.palette
    }

    pub fn group_color(&self) -> LinearRgb {
        self.group
    }

    /// Statistics of the last successfully applied sample block.
    pub fn sample_stats(&self) -> Option<&SampleBlock> {
        self.sample_stats.as_ref()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}
