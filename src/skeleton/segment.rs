use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StructureError};

/// Index of a segment inside its [`SegmentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

impl SegmentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One cylindrical growth unit of a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Segment {
    /// Segment this one grew from. Navigation only, never ownership.
    pub previous: Option<SegmentId>,
    /// Continuation of the same branch
    pub next: Option<SegmentId>,
    /// Roots of the side branches forking from this segment's base
    pub branches: Vec<SegmentId>,
    /// Extrusion distance along the local up axis
    pub length: f32,
    /// Tilt (radians) relative to the parent frame
    pub angle: f32,
    /// Rotation (radians) around the parent's up axis selecting the tilt plane
    pub direction: f32,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            previous: None,
            next: None,
            branches: Vec::new(),
            length: 1.0,
            angle: 0.0,
            direction: 0.0,
        }
    }
}

impl Segment {
    pub fn new(length: f32, angle: f32, direction: f32) -> Self {
        Self {
            length,
            angle,
            direction,
            ..Default::default()
        }
    }

    /// Owned children: the continuation first, then branches in order
    pub fn children(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.next.into_iter().chain(self.branches.iter().copied())
    }

    pub fn is_leaf(&self) -> bool {
        self.next.is_none() && self.branches.is_empty()
    }

    /// Reject values that would emit NaN or inside-out geometry
    fn check(&self, id: SegmentId) -> Result<(), StructureError> {
        let values = [
            ("length", self.length),
            ("angle", self.angle),
            ("direction", self.direction),
        ];
        if let Some(&(field, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(StructureError::NonFiniteSegment { id, field, value });
        }
        if self.length < 0.0 {
            return Err(StructureError::NegativeLength { id, length: self.length });
        }
        Ok(())
    }
}

/// Arena holding a skeleton of segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentTree {
    #[serde(default = "root_id")]
    root: SegmentId,
    segments: Vec<Segment>,
}

fn root_id() -> SegmentId {
    SegmentId(0)
}

impl SegmentTree {
    /// Start a skeleton from a single root segment
    pub fn with_root(mut root: Segment) -> Self {
        root.previous = None;
        root.next = None;
        root.branches.clear();
        Self {
            root: root_id(),
            segments: vec![root],
        }
    }

    /// Arena with no segments yet; the first inserted segment becomes the root
    pub(crate) fn empty() -> Self {
        Self {
            root: root_id(),
            segments: Vec::new(),
        }
    }

    /// Parse a hand-written skeleton and check that it forms a single rooted tree
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let tree: SegmentTree = serde_yaml::from_str(yaml)?;
        tree.validate()?;
        Ok(tree)
    }

    pub fn root(&self) -> SegmentId {
        self.root
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments in arena order
    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (SegmentId(i as u32), s))
    }

    /// Store a segment whose only link is its back-reference.
    /// The caller is responsible for attaching it to `previous`.
    pub(crate) fn insert_detached(&mut self, previous: Option<SegmentId>, mut segment: Segment) -> SegmentId {
        let id = SegmentId(self.segments.len() as u32);
        segment.previous = previous;
        segment.next = None;
        segment.branches.clear();
        self.segments.push(segment);
        id
    }

    pub(crate) fn attach_branch(&mut self, parent: SegmentId, branch: SegmentId) {
        self.segments[parent.index()].branches.push(branch);
    }

    pub(crate) fn attach_next(&mut self, parent: SegmentId, next: SegmentId) {
        self.segments[parent.index()].next = Some(next);
    }

    fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment, StructureError> {
        self.segments
            .get_mut(id.index())
            .ok_or(StructureError::UnknownSegment(id))
    }

    /// Fork a new side branch from `parent`
    pub fn add_branch(&mut self, parent: SegmentId, segment: Segment) -> Result<SegmentId, StructureError> {
        self.segment_mut(parent)?;
        let id = self.insert_detached(Some(parent), segment);
        self.segment_mut(parent)?.branches.push(id);
        Ok(id)
    }

    /// Continue the branch `parent` belongs to
    pub fn add_next(&mut self, parent: SegmentId, segment: Segment) -> Result<SegmentId, StructureError> {
        if self.segment_mut(parent)?.next.is_some() {
            return Err(StructureError::NextOccupied(parent));
        }
        let id = self.insert_detached(Some(parent), segment);
        self.segment_mut(parent)?.next = Some(id);
        Ok(id)
    }

    /// Follow back-references up to the segment that started the tree
    pub fn root_of(&self, id: SegmentId) -> SegmentId {
        let mut current = id;
        // A well-formed tree is never deeper than its segment count
        for _ in 0..self.segments.len() {
            match self.get(current).and_then(|s| s.previous) {
                Some(previous) => current = previous,
                None => break,
            }
        }
        current
    }

    /// Longest run of segments from `id` down to a leaf.
    ///
    /// A leaf counts as 1. A continuation adds one level, a branch does not:
    /// branches fork from the base of their parent and share its height.
    pub fn max_height(&self, id: SegmentId) -> u32 {
        if self.get(id).is_none() {
            return 0;
        }
        let mut heights = vec![0; self.segments.len()];
        self.fill_heights(id, &mut heights);
        heights[id.index()]
    }

    /// [`max_height`](Self::max_height) of every segment, indexed by arena slot.
    /// Expects a validated tree.
    pub fn heights(&self) -> Vec<u32> {
        let mut heights = vec![0; self.segments.len()];
        if self.get(self.root).is_some() {
            self.fill_heights(self.root, &mut heights);
        }
        heights
    }

    /// Children come after their parent in preorder, so walking it backwards
    /// settles every child before the segment that owns it.
    fn fill_heights(&self, top: SegmentId, heights: &mut [u32]) {
        let order: Vec<_> = self.preorder(top).collect();
        for id in order.into_iter().rev() {
            let Some(segment) = self.get(id) else {
                continue;
            };
            let height_of = |child: SegmentId| heights.get(child.index()).copied().unwrap_or(0);
            let along = segment.next.map_or(1, |next| height_of(next) + 1);
            let height = segment.branches.iter().map(|&b| height_of(b)).fold(along, u32::max);
            heights[id.index()] = height;
        }
    }

    /// Number of segments in the subtree rooted at `id`
    pub fn subtree_len(&self, id: SegmentId) -> usize {
        self.preorder(id).count()
    }

    /// Segments below `id` in flattening order: the segment, its continuation
    /// chain, then each branch subtree
    pub fn preorder(&self, id: SegmentId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Check that the arena is one tree rooted at `root` and that every
    /// segment has finite values and a non-negative length
    pub fn validate(&self) -> Result<(), StructureError> {
        let root = self.get(self.root).ok_or(StructureError::MissingRoot)?;
        if let Some(previous) = root.previous {
            return Err(StructureError::RootHasPrevious {
                root: self.root,
                previous,
            });
        }

        let mut visited = vec![false; self.segments.len()];
        visited[self.root.index()] = true;
        let mut stack = vec![self.root];

        while let Some(parent) = stack.pop() {
            for child in self.segments[parent.index()].children() {
                let Some(segment) = self.get(child) else {
                    return Err(StructureError::DanglingReference { parent, child });
                };
                if visited[child.index()] {
                    return Err(StructureError::CycleDetected(child));
                }
                if segment.previous != Some(parent) {
                    return Err(StructureError::BrokenBackReference {
                        parent,
                        child,
                        previous: segment.previous,
                    });
                }
                visited[child.index()] = true;
                stack.push(child);
            }
        }

        if let Some(orphan) = visited.iter().position(|seen| !seen) {
            return Err(StructureError::Unreachable(SegmentId(orphan as u32)));
        }

        for (id, segment) in self.iter() {
            segment.check(id)?;
        }
        Ok(())
    }
}

impl Index<SegmentId> for SegmentTree {
    type Output = Segment;

    fn index(&self, id: SegmentId) -> &Segment {
        &self.segments[id.index()]
    }
}

pub struct Preorder<'a> {
    tree: &'a SegmentTree,
    stack: Vec<SegmentId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = SegmentId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Some(segment) = self.tree.get(id) {
            // Pushed last so the continuation is visited before any branch
            self.stack.extend(segment.branches.iter().rev().copied());
            self.stack.extend(segment.next);
        }
        Some(id)
    }
}
