//! Frame timing, re-exported from `zxcore-core`.
//!
//! The teacher library's generic `VFrameTs<V>`/`VFrameTsCounter<V, C>` pair
//! (parameterized over an abstract [VideoFrame][crate::video::VideoFrame]
//! type) is simplified here to the concrete, non-generic [FrameClock]:
//! every supported model's timing is one of a small, closed set of
//! constants, not a type-level abstraction over arbitrary frame shapes.
pub use zxcore_core::clock::{FrameClock, TimingSpec, CONTENTION_PATTERN, TIMING_128K, TIMING_48K, TIMING_PLUS3};

use crate::memory::Model;

/// The [TimingSpec] for a given [Model].
pub fn timing_for(model: Model) -> TimingSpec {
    match model {
        Model::Zx48 => TIMING_48K,
        Model::Zx128 | Model::Plus2 => TIMING_128K,
        Model::Plus2A | Model::Plus3 => TIMING_PLUS3,
    }
}
