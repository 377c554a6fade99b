//! Random branching skeletons
//!
//! A skeleton is an arena of [`Segment`]s. Each segment owns an optional
//! continuation and any number of side branches, and keeps a plain
//! back-reference to the segment it grew from.

pub mod generator;
pub mod params;
pub mod segment;

pub use generator::{SkeletonGenerator, DEFAULT_SEGMENT_LIMIT};
pub use params::SegmentParameters;
pub use segment::{Preorder, Segment, SegmentId, SegmentTree};
