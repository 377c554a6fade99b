use thiserror::Error;

use crate::skeleton::SegmentId;

/// A generation parameter set that cannot produce a well-formed skeleton
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("inverted {field} range: min {min} > max {max}")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("segment length must not be negative, got min {0}")]
    NegativeLength(f32),

    #[error("{field} must not be negative, got {value}")]
    NegativeFactor { field: &'static str, value: f32 },

    #[error("segment_factor {0} is above 1; it compounds at every level, so chains would never shrink")]
    GrowingSegmentFactor(f32),

    #[error("branch counts {min}..{max} never shrink with branch_factor {factor}")]
    EndlessBranching { min: u32, max: u32, factor: f32 },

    #[error("skeleton exceeds the limit of {0} segments")]
    SegmentLimit(usize),
}

/// A segment arena that is not a single rooted tree, or holds unusable segment values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("skeleton has no segments")]
    MissingRoot,

    #[error("root segment {root} points back to {previous}")]
    RootHasPrevious { root: SegmentId, previous: SegmentId },

    #[error("segment {parent} references missing segment {child}")]
    DanglingReference { parent: SegmentId, child: SegmentId },

    #[error("segment {child} is owned by {parent} but points back to {previous:?}")]
    BrokenBackReference {
        parent: SegmentId,
        child: SegmentId,
        previous: Option<SegmentId>,
    },

    #[error("cycle detected: segment {0} is reached twice")]
    CycleDetected(SegmentId),

    #[error("segment {0} is not reachable from the root")]
    Unreachable(SegmentId),

    #[error("segment {0} does not exist")]
    UnknownSegment(SegmentId),

    #[error("segment {0} already has a continuation")]
    NextOccupied(SegmentId),

    #[error("segment {id} has non-finite {field}: {value}")]
    NonFiniteSegment {
        id: SegmentId,
        field: &'static str,
        value: f32,
    },

    #[error("segment {id} has negative length {length}")]
    NegativeLength { id: SegmentId, length: f32 },
}

/// Failure loading a YAML document
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid segment parameters: {0}")]
    Parameters(#[from] ParameterError),

    #[error("invalid skeleton: {0}")]
    Structure(#[from] StructureError),

    #[error("mesh rings need at least 3 sides, got {0}")]
    RingTooSmall(usize),
}

/// Failure reported at the renderer boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("{vertices} vertices but {colors} colors")]
    AttributeMismatch { vertices: usize, colors: usize },

    #[error("element {index} out of range for {vertices} vertices")]
    ElementOutOfRange { index: u32, vertices: usize },

    #[error("renderer failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type TreeResult<T> = Result<T, TreeError>;
