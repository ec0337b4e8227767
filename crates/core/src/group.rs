//! Grouping of scanned document colors by near-equality.
//!
//! A scan of the host document yields one entry per color-bearing property.
//! Entries whose colors agree within a tolerance are bucketed together so
//! the user can recolor every member of a group in one action.
//!
//! Grouping is first-fit against each group's first member, so it depends
//! on scan order. That is intentional: the scan walks the document in a
//! stable order, and first-fit keeps the representative predictable.

use crate::cache::WriteCache;
use crate::color::{channel_distance, linear_to_srgb, LinearRgb};
use crate::host::ColorSpaceTag;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One color-bearing property found by a document scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    /// Human-readable label for UI lists.
    pub label: String,
    /// Host object the property lives on.
    pub target: String,
    /// Property path on the target.
    pub path: String,
    /// Color space the property is stored in.
    pub space: ColorSpaceTag,
    /// Current value, canonical linear.
    pub color: LinearRgb,
}

/// A bucket of entries sharing (approximately) one color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorGroup {
    /// Color of the first member; the value compared against when bucketing.
    pub representative: LinearRgb,
    /// Display hex of the representative.
    pub hex: String,
    pub members: Vec<ScanEntry>,
}

/// Buckets `entries` by first-fit: each entry joins the first existing group
/// whose representative is within `tolerance` on every channel (strict
/// Chebyshev distance), or starts a new group.
///
/// Groups are returned largest-first; ties keep discovery order (the sort is
/// stable), so equal-sized groups stay in the order their representatives
/// were first seen.
pub fn group_by_color(entries: &[ScanEntry], tolerance: f64) -> Vec<ColorGroup> {
    let mut groups: Vec<ColorGroup> = Vec::new();
    for entry in entries {
        match groups
            .iter_mut()
            .find(|g| channel_distance(g.representative, entry.color) < tolerance)
        {
            Some(group) => group.members.push(entry.clone()),
            None => {
                let display = linear_to_srgb(entry.color);
                groups.push(ColorGroup {
                    representative: entry.color,
                    hex: display.to_hex(),
                    members: vec![entry.clone()],
                });
            }
        }
    }
    groups.sort_by(|a, b| b.members.len().cmp(&a.members.len()));
    tracing::debug!(
        entries = entries.len(),
        groups = groups.len(),
        "grouped scan entries"
    );
    groups
}

/// Stages `color` for every member of `group` in one pass. The writes
/// coalesce and flush per the cache's policy, so recoloring a hundred
/// members costs one flush.
pub fn stage_group(cache: &mut WriteCache, group: &ColorGroup, color: LinearRgb, now: Instant) {
    for member in &group.members {
        cache.stage(
            member.target.clone(),
            member.path.clone(),
            color,
            member.space,
            now,
        );
    }
}
