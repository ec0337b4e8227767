#![deny(unsafe_code)]
//! Core types for the color synchronization engine.
//!
//! Provides the conversion pipeline (`Srgb`, `LinearRgb`, `Xyz`, `Lab`,
//! `Hsv` and the functions between them), the `UpdateArbiter` reentrancy
//! guard, the `SyncEngine` fan-out hub, the `WriteCache` host write
//! coalescer, color grouping, and the host-integration traits
//! (`PropertySink`, `PaintContext`).

pub mod arbiter;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod group;
pub mod host;
pub mod stroke;
pub mod sync;
pub mod watcher;

pub use arbiter::{Source, UpdateArbiter, UpdateSession};
pub use cache::{FlushOutcome, FlushPolicy, FlushReport, WriteCache};
pub use color::{Hsv, Lab, LinearRgb, Srgb, Xyz};
pub use config::SyncConfig;
pub use error::SyncError;
pub use group::{group_by_color, ColorGroup, ScanEntry};
pub use host::{ColorSpaceTag, PaintContext, PropertySink, SampleBlock};
pub use stroke::ColorStroke;
pub use sync::{ColorInput, Mode, SyncEngine};
pub use watcher::ExternalColorWatcher;
