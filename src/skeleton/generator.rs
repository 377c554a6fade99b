use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::params::SegmentParameters;
use super::segment::{Segment, SegmentId, SegmentTree};
use crate::error::ParameterError;

/// Hard cap on the number of segments a single skeleton may grow
pub const DEFAULT_SEGMENT_LIMIT: usize = 100_000;

/// Grows random segment skeletons from a parameter set
#[derive(Debug, Clone)]
pub struct SkeletonGenerator {
    pub params: SegmentParameters,
    seed: u64,
    segment_limit: usize,
}

impl SkeletonGenerator {
    pub fn new(params: SegmentParameters) -> Self {
        Self {
            params,
            seed: 42,
            segment_limit: DEFAULT_SEGMENT_LIMIT,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_segment_limit(mut self, limit: usize) -> Self {
        self.segment_limit = limit;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grow a skeleton from the configured seed. Same seed, same tree.
    pub fn grow(&self) -> Result<SegmentTree, ParameterError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.grow_with(&mut rng)
    }

    /// Grow a skeleton drawing every random value from `rng`
    pub fn grow_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SegmentTree, ParameterError> {
        self.params.validate()?;

        let mut grower = Grower {
            tree: SegmentTree::empty(),
            rng,
            limit: self.segment_limit,
        };
        grower.grow(self.params)?;

        let tree = grower.tree;
        log::debug!(
            "grew skeleton of {} segments, height {}",
            tree.len(),
            tree.max_height(tree.root())
        );
        Ok(tree)
    }
}

struct Grower<'r, R: ?Sized> {
    tree: SegmentTree,
    rng: &'r mut R,
    limit: usize,
}

/// How a pending segment hangs off the segment that spawned it
#[derive(Clone, Copy)]
enum Link {
    Root,
    Branch(SegmentId),
    Next(SegmentId),
}

impl<R: Rng + ?Sized> Grower<'_, R> {
    /// Grow the whole skeleton below `params` with an explicit work stack.
    ///
    /// Each segment's branches are grown depth-first before its continuation,
    /// so ids and draws come out in the same order as a recursive walk.
    fn grow(&mut self, params: SegmentParameters) -> Result<(), ParameterError> {
        let mut pending = vec![(Link::Root, params)];

        while let Some((link, params)) = pending.pop() {
            let parent = match link {
                Link::Root => None,
                Link::Branch(parent) | Link::Next(parent) => Some(parent),
            };
            let id = self.generate(parent, &params)?;
            match link {
                Link::Root => {}
                Link::Branch(parent) => self.tree.attach_branch(parent, id),
                Link::Next(parent) => self.tree.attach_next(parent, id),
            }

            let branch_count = self.draw_branch_count(&params);
            let continues = params.remaining_segments > 1;
            // Every queued entry becomes a segment
            let queued = pending.len() + branch_count as usize + usize::from(continues);
            if self.tree.len() + queued > self.limit {
                return Err(ParameterError::SegmentLimit(self.limit));
            }

            let child_params = params.derive_branch();
            if continues {
                pending.push((Link::Next(id), child_params));
            }
            for _ in 0..branch_count {
                pending.push((Link::Branch(id), child_params));
            }
        }

        Ok(())
    }

    /// Draw one segment stemming from `parent` and store it unlinked
    fn generate(&mut self, parent: Option<SegmentId>, params: &SegmentParameters) -> Result<SegmentId, ParameterError> {
        if self.tree.len() >= self.limit {
            return Err(ParameterError::SegmentLimit(self.limit));
        }

        // Draw order is part of the reproducibility contract
        let length = random_range(&mut *self.rng, params.min_length, params.max_length);
        let angle = random_range(&mut *self.rng, params.min_angle, params.max_angle);
        let direction = self.rng.gen::<f32>() * TAU;

        Ok(self
            .tree
            .insert_detached(parent, Segment::new(length, angle, direction)))
    }

    /// Truncating a real sample: max_branches only comes up when min == max
    fn draw_branch_count(&mut self, params: &SegmentParameters) -> u32 {
        random_range(&mut *self.rng, params.min_branches as f32, params.max_branches as f32).floor() as u32
    }
}

/// Uniform sample from `[min, max)`, collapsing to `min` when the range is empty
fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}
