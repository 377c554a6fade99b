use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Ranges and shrink factors for growing one segment and everything below it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentParameters {
    /// Segment length range
    pub min_length: f32,
    pub max_length: f32,
    /// Tilt range (radians)
    pub min_angle: f32,
    pub max_angle: f32,
    /// Branch count range
    pub min_branches: u32,
    pub max_branches: u32,
    /// Segments still to grow along this chain, including the current one
    pub remaining_segments: i32,
    /// Multiplier for the length range of derived parameters
    pub length_factor: f32,
    /// Multiplier for the angle range of derived parameters
    pub angle_factor: f32,
    /// Multiplier for `remaining_segments` of derived parameters (before the decrement).
    ///
    /// Must not exceed 1. The factor applies again at every level, so even a short
    /// chain such as `remaining_segments: 2` with a factor of 1.4 is refused.
    pub segment_factor: f32,
    /// Multiplier for the branch count range of derived parameters
    pub branch_factor: f32,
}

impl Default for SegmentParameters {
    fn default() -> Self {
        Self {
            min_length: 1.0,
            max_length: 1.0,
            min_angle: 0.0,
            max_angle: 0.0,
            min_branches: 0,
            max_branches: 0,
            remaining_segments: 0,
            length_factor: 1.0,
            angle_factor: 1.0,
            segment_factor: 1.0,
            branch_factor: 1.0,
        }
    }
}

impl SegmentParameters {
    /// Parameters shared by every branch and by the continuation of a segment.
    ///
    /// Factors carry over unchanged, so ranges keep shrinking level after level.
    pub fn derive_branch(&self) -> Self {
        Self {
            min_length: self.min_length * self.length_factor,
            max_length: self.max_length * self.length_factor,
            min_angle: self.min_angle * self.angle_factor,
            max_angle: self.max_angle * self.angle_factor,
            min_branches: (self.min_branches as f32 * self.branch_factor).floor() as u32,
            max_branches: (self.max_branches as f32 * self.branch_factor).floor() as u32,
            remaining_segments: ((self.remaining_segments as f32 * self.segment_factor).floor() as i32).saturating_sub(1),
            ..*self
        }
    }

    /// Whether a segment grown from these parameters can sprout at least one branch
    pub fn can_branch(&self) -> bool {
        // The sampled count is floor(min + u * (max - min)) with u < 1
        self.min_branches >= 1 || self.max_branches >= 2
    }

    /// Reject parameter sets that would grow malformed geometry or never stop growing
    pub fn validate(&self) -> Result<(), ParameterError> {
        let reals = [
            ("min_length", self.min_length),
            ("max_length", self.max_length),
            ("min_angle", self.min_angle),
            ("max_angle", self.max_angle),
            ("length_factor", self.length_factor),
            ("angle_factor", self.angle_factor),
            ("segment_factor", self.segment_factor),
            ("branch_factor", self.branch_factor),
        ];
        if let Some(&(field, value)) = reals.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ParameterError::NonFinite { field, value });
        }

        if self.min_length < 0.0 {
            return Err(ParameterError::NegativeLength(self.min_length));
        }
        check_range("length", self.min_length.into(), self.max_length.into())?;
        check_range("angle", self.min_angle.into(), self.max_angle.into())?;
        check_range("branches", self.min_branches.into(), self.max_branches.into())?;

        if let Some(&(field, value)) = reals[4..].iter().find(|(_, v)| *v < 0.0) {
            return Err(ParameterError::NegativeFactor { field, value });
        }
        if self.segment_factor > 1.0 {
            return Err(ParameterError::GrowingSegmentFactor(self.segment_factor));
        }
        if self.can_branch() && self.branch_factor >= 1.0 {
            return Err(ParameterError::EndlessBranching {
                min: self.min_branches,
                max: self.max_branches,
                factor: self.branch_factor,
            });
        }

        Ok(())
    }
}

fn check_range(field: &'static str, min: f64, max: f64) -> Result<(), ParameterError> {
    if min > max {
        Err(ParameterError::InvertedRange { field, min, max })
    } else {
        Ok(())
    }
}
