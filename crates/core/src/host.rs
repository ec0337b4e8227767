//! Boundary contracts to the host application.
//!
//! The core never talks to a scene graph, a brush, or a framebuffer
//! directly; it goes through these traits. Implementations live in the
//! host-integration layer, and tests substitute recording fakes.

use crate::color::LinearRgb;
use serde::{Deserialize, Serialize};

/// Declared color space of an external property write.
///
/// The caller always passes linear values; `GammaPassthrough` tells the
/// external store that it performs its own gamma re-encoding on write,
/// `Linear` that the value is stored exactly as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpaceTag {
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "GAMMA_PASSTHROUGH")]
    GammaPassthrough,
}

/// Write/read access to color-bearing properties of external objects.
///
/// `set_property` returns `false` on failure without raising; the flush
/// boundary logs and counts failures but never aborts a batch on one.
pub trait PropertySink {
    /// Writes a color to `(target, path)`. Returns `false` on failure.
    fn set_property(
        &mut self,
        target: &str,
        path: &str,
        color: LinearRgb,
        space: ColorSpaceTag,
    ) -> bool;

    /// Reads a color back, `None` on an inaccessible property.
    fn get_property(&self, target: &str, path: &str, space: ColorSpaceTag) -> Option<LinearRgb>;

    /// One coalesced refresh per touched target after a flush, instead of
    /// one per written entry. Default: nothing to refresh.
    fn refresh_target(&mut self, _target: &str) {}
}

/// Polymorphic paint-context provider: one implementation per host
/// version/mode, replacing per-version dispatch tables.
pub trait PaintContext {
    /// Current brush color, `None` when no paint context is available.
    fn brush_color(&self) -> Option<LinearRgb>;

    /// Pushes a color to the brush. Returns `false` if the host rejected it.
    fn set_brush_color(&mut self, color: LinearRgb) -> bool;
}

/// An NxN block of sampled pixels with its summary statistics.
///
/// Produced by the external screen/image sampler; the mean drives an
/// absolute propagation, the rest is cached for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBlock {
    pub samples: Vec<LinearRgb>,
    pub mean: LinearRgb,
    pub median: LinearRgb,
    pub min: LinearRgb,
    pub max: LinearRgb,
}

impl SampleBlock {
    /// Computes the per-channel statistics for a block of samples.
    ///
    /// Returns `None` for an empty block ("no color produced"); the caller
    /// leaves all representations unchanged for that tick.
    pub fn from_samples(samples: Vec<LinearRgb>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let channel = |f: fn(&LinearRgb) -> f64| -> Vec<f64> { samples.iter().map(f).collect() };
        let mut r = channel(|c| c.r);
        let mut g = channel(|c| c.g);
        let mut b = channel(|c| c.b);

        let n = samples.len() as f64;
        let mean = LinearRgb {
            r: r.iter().sum::<f64>() / n,
            g: g.iter().sum::<f64>() / n,
            b: b.iter().sum::<f64>() / n,
        };

        let median_of = |v: &mut Vec<f64>| -> f64 {
            v.sort_by(|a, b| a.total_cmp(b));
            v[v.len() / 2]
        };
        let median = LinearRgb {
            r: median_of(&mut r),
            g: median_of(&mut g),
            b: median_of(&mut b),
        };

        // Channel vectors are sorted now; min/max fall out of the ends.
        let min = LinearRgb {
            r: r[0],
            g: g[0],
            b: b[0],
        };
        let max = LinearRgb {
            r: r[r.len() - 1],
            g: g[g.len() - 1],
            b: b[b.len() - 1],
        };

        Some(SampleBlock {
            samples,
            mean,
            median,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lin(r: f64, g: f64, b: f64) -> LinearRgb {
        LinearRgb { r, g, b }
    }

    #[test]
    fn color_space_tag_uses_boundary_strings() {
        assert_eq!(
            serde_json::to_string(&ColorSpaceTag::Linear).unwrap(),
            "\"LINEAR\""
        );
        assert_eq!(
            serde_json::to_string(&ColorSpaceTag::GammaPassthrough).unwrap(),
            "\"GAMMA_PASSTHROUGH\""
        );
        let tag: ColorSpaceTag = serde_json::from_str("\"LINEAR\"").unwrap();
        assert_eq!(tag, ColorSpaceTag::Linear);
    }

    #[test]
    fn empty_sample_block_produces_no_color() {
        assert!(SampleBlock::from_samples(vec![]).is_none());
    }

    #[test]
    fn single_sample_block_is_its_own_statistics() {
        let block = SampleBlock::from_samples(vec![lin(0.2, 0.4, 0.6)]).unwrap();
        assert_eq!(block.mean, lin(0.2, 0.4, 0.6));
        assert_eq!(block.median, lin(0.2, 0.4, 0.6));
        assert_eq!(block.min, lin(0.2, 0.4, 0.6));
        assert_eq!(block.max, lin(0.2, 0.4, 0.6));
    }

    #[test]
    fn sample_block_statistics_are_per_channel() {
        let block = SampleBlock::from_samples(vec![
            lin(0.0, 1.0, 0.5),
            lin(1.0, 0.0, 0.5),
            lin(0.5, 0.5, 0.5),
        ])
        .unwrap();
        assert!((block.mean.r - 0.5).abs() < 1e-12);
        assert!((block.mean.g - 0.5).abs() < 1e-12);
        assert_eq!(block.min, lin(0.0, 0.0, 0.5));
        assert_eq!(block.max, lin(1.0, 1.0, 0.5));
        assert_eq!(block.median, lin(0.5, 0.5, 0.5));
    }

    #[test]
    fn refresh_target_default_is_a_no_op() {
        struct NullSink;
        impl PropertySink for NullSink {
            fn set_property(
                &mut self,
                _target: &str,
                _path: &str,
                _color: LinearRgb,
                _space: ColorSpaceTag,
            ) -> bool {
                true
            }
            fn get_property(
                &self,
                _target: &str,
                _path: &str,
                _space: ColorSpaceTag,
            ) -> Option<LinearRgb> {
                None
            }
        }
        NullSink.refresh_target("anything");
    }
}
