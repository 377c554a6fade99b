use serde::{Deserialize, Serialize};

use super::strip::{ring_template, FlatMesh};
use crate::error::{ConfigError, StructureError};
use crate::math::{Mat4, Vec3};
use crate::skeleton::{SegmentId, SegmentTree};

/// Parameters for turning a skeleton into a tube mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshParams {
    /// Vertices per ring
    pub ring_sides: usize,
    /// Ring girth is `taper^d`, `d` being how far a segment sits below the tallest height
    pub taper: f32,
    /// Ring gray is `shade^level`
    pub shade: f32,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            ring_sides: 6,
            taper: 0.6,
            shade: 0.8,
        }
    }
}

impl MeshParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_sides < 3 {
            return Err(ConfigError::RingTooSmall(self.ring_sides));
        }
        Ok(())
    }
}

/// Walks a skeleton depth-first and emits one ring per segment
pub struct MeshFlattener {
    params: MeshParams,
    template: Vec<Vec3>,
}

/// Pending work in the flattening walk
enum Step {
    Segment {
        id: SegmentId,
        frame: Mat4,
        base_ring: u32,
        level: u32,
    },
    Break(u32),
}

/// State threaded through one flattening pass
struct Walk<'a> {
    tree: &'a SegmentTree,
    heights: Vec<u32>,
    tallest: u32,
    mesh: FlatMesh,
}

impl MeshFlattener {
    pub fn new(params: MeshParams) -> Self {
        Self {
            template: ring_template(params.ring_sides),
            params,
        }
    }

    pub fn params(&self) -> &MeshParams {
        &self.params
    }

    /// Flatten the whole tree into strip buffers.
    ///
    /// The buffers start with the untransformed template ring, which the
    /// root segment stitches onto.
    pub fn flatten(&self, tree: &SegmentTree) -> Result<FlatMesh, StructureError> {
        tree.validate()?;

        let heights = tree.heights();
        let root = tree.root();
        let mut walk = Walk {
            tree,
            tallest: heights[root.index()],
            heights,
            mesh: FlatMesh::new(),
        };

        let base_ring = walk.mesh.push_ring(self.template.iter().copied(), 1.0);
        self.emit(&mut walk, root, base_ring);

        log::debug!(
            "flattened {} segments into {} vertices and {} elements",
            tree.len(),
            walk.mesh.vertex_count(),
            walk.mesh.element_count()
        );
        Ok(walk.mesh)
    }

    /// Depth-first walk with an explicit stack. A segment's continuation is
    /// emitted in full before any of its branches.
    fn emit(&self, walk: &mut Walk<'_>, root: SegmentId, base_ring: u32) {
        let mut pending = vec![Step::Segment {
            id: root,
            frame: Mat4::identity(),
            base_ring,
            level: 0,
        }];

        while let Some(step) = pending.pop() {
            let (id, frame, base_ring, level) = match step {
                Step::Break(index) => {
                    walk.mesh.break_strip(index);
                    continue;
                }
                Step::Segment {
                    id,
                    frame,
                    base_ring,
                    level,
                } => (id, frame, base_ring, level),
            };
            let segment = &walk.tree[id];

            let bend_axis = Vec3::UP.cross(&Vec3::horizontal(segment.direction));
            let tip = frame
                .rotate(segment.angle, bend_axis)
                .translate(Vec3::new(0.0, segment.length, 0.0));

            // Root-relative, so rings thin out towards the shorter subtrees
            let girth = self.girth(walk.tallest.saturating_sub(walk.heights[id.index()]));
            let gray = self.params.shade.powi(level as i32);

            let ring = walk.mesh.push_ring(
                self.template
                    .iter()
                    .map(|point| tip.transform_point(point.scale_xz(girth))),
                gray,
            );
            walk.mesh.stitch_rings(base_ring, ring, self.template.len() as u32);

            // Branches fork from this segment's base ring, not its tip
            for &branch in segment.branches.iter().rev() {
                pending.push(Step::Segment {
                    id: branch,
                    frame,
                    base_ring,
                    level,
                });
                pending.push(Step::Break(base_ring));
            }
            if let Some(next) = segment.next {
                pending.push(Step::Segment {
                    id: next,
                    frame: tip,
                    base_ring: ring,
                    level: level + 1,
                });
            }
        }
    }

    fn girth(&self, depth: u32) -> f32 {
        self.params.taper.powi(depth as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Segment, SegmentParameters, SkeletonGenerator};

    const SIDES: usize = 6;

    fn straight(segments: usize) -> SegmentTree {
        let mut tree = SegmentTree::with_root(Segment::new(1.0, 0.0, 0.0));
        let mut tip = tree.root();
        for _ in 1..segments {
            tip = tree.add_next(tip, Segment::new(1.0, 0.0, 0.0)).unwrap();
        }
        tree
    }

    fn flatten(tree: &SegmentTree) -> FlatMesh {
        MeshFlattener::new(MeshParams::default()).flatten(tree).unwrap()
    }

    fn ring_center(mesh: &FlatMesh, start: usize) -> Vec3 {
        mesh.positions[start..start + SIDES]
            .iter()
            .fold(Vec3::ZERO, |acc, &p| acc + p)
            .scale(1.0 / SIDES as f32)
    }

    fn ring_radius(mesh: &FlatMesh, start: usize) -> f32 {
        mesh.positions[start].distance(&ring_center(mesh, start))
    }

    #[test]
    fn test_three_segment_chain_counts() {
        let mesh = flatten(&straight(3));
        // Base ring plus one ring per segment
        assert_eq!(mesh.vertex_count(), SIDES * 4);
        assert_eq!(mesh.colors.len(), SIDES * 4);
        assert_eq!(mesh.element_count(), 3 * (2 * SIDES + 3));
    }

    #[test]
    fn test_chain_elements_link_consecutive_rings() {
        let mesh = flatten(&straight(2));
        let expected: Vec<u32> = vec![
            0, 6, 1, 7, 2, 8, 3, 9, 4, 10, 5, 11, 0, 6, 6,
            6, 12, 7, 13, 8, 14, 9, 15, 10, 16, 11, 17, 6, 12, 12,
        ];
        assert_eq!(mesh.elements, expected);
    }

    #[test]
    fn test_trunk_colors_darken_per_level() {
        let mesh = flatten(&straight(3));
        let grays: Vec<f32> = (0..4).map(|ring| mesh.colors[ring * SIDES][0]).collect();
        let expected = [1.0, 1.0, 0.8, 0.64];
        for (gray, want) in grays.iter().zip(expected) {
            assert!((gray - want).abs() < 1e-6, "{:?}", grays);
        }
        for color in &mesh.colors {
            assert_eq!(color[3], 1.0);
            assert_eq!(color[0], color[1]);
            assert_eq!(color[1], color[2]);
        }
    }

    #[test]
    fn test_straight_chain_stacks_rings() {
        let mesh = flatten(&straight(3));
        for ring in 0..4 {
            let center = ring_center(&mesh, ring * SIDES);
            assert!(center.distance(&Vec3::new(0.0, ring as f32, 0.0)) < 1e-5);
        }
    }

    #[test]
    fn test_taper_is_measured_from_tallest_height() {
        let mesh = flatten(&straight(3));
        // Inherited behavior: taper^(H_root - H_seg) leaves the leaf at 0.36, not full girth.
        // Heights are 3, 2, 1 from root to tip
        assert!((ring_radius(&mesh, SIDES) - 1.0).abs() < 1e-5);
        assert!((ring_radius(&mesh, 2 * SIDES) - 0.6).abs() < 1e-5);
        assert!((ring_radius(&mesh, 3 * SIDES) - 0.36).abs() < 1e-5);
    }

    #[test]
    fn test_single_segment_keeps_full_girth() {
        let mesh = flatten(&straight(1));
        assert!((ring_radius(&mesh, SIDES) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_angle_tilts_towards_direction() {
        let tree = SegmentTree::with_root(Segment::new(1.0, std::f32::consts::FRAC_PI_2, 0.0));
        let mesh = flatten(&tree);
        let center = ring_center(&mesh, SIDES);
        assert!(center.distance(&Vec3::RIGHT) < 1e-5, "{:?}", center);

        let tree = SegmentTree::with_root(Segment::new(
            2.0,
            std::f32::consts::FRAC_PI_2,
            std::f32::consts::FRAC_PI_2,
        ));
        let mesh = flatten(&tree);
        let center = ring_center(&mesh, SIDES);
        assert!(center.distance(&Vec3::new(0.0, 0.0, 2.0)) < 1e-5, "{:?}", center);
    }

    #[test]
    fn test_branch_forks_from_base_ring() {
        let mut tree = SegmentTree::with_root(Segment::new(2.0, 0.0, 0.0));
        let root = tree.root();
        tree.add_next(root, Segment::new(1.0, 0.0, 0.0)).unwrap();
        tree.add_branch(root, Segment::new(1.0, 0.0, 0.0)).unwrap();

        let mesh = flatten(&tree);
        assert_eq!(mesh.vertex_count(), SIDES * 4);
        // Two stitched segments, a strip break, then the branch
        let per_segment = 2 * SIDES + 3;
        assert_eq!(mesh.element_count(), 3 * per_segment + 2);

        let branch_elements = &mesh.elements[2 * per_segment..];
        assert_eq!(&branch_elements[..4], &[0, 0, 0, 18]);

        // Root ring at y = 2, trunk tip at y = 3, branch tip at y = 1
        let branch = ring_center(&mesh, 3 * SIDES);
        assert!(branch.distance(&Vec3::new(0.0, 1.0, 0.0)) < 1e-5);
        // Branches share their parent's color level
        assert_eq!(mesh.colors[3 * SIDES][0], 1.0);
        assert!((mesh.colors[2 * SIDES][0] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_nested_branch_uses_parent_frame() {
        let mut tree = SegmentTree::with_root(Segment::new(1.0, 0.0, 0.0));
        let root = tree.root();
        let trunk = tree.add_next(root, Segment::new(1.0, 0.0, 0.0)).unwrap();
        tree.add_branch(trunk, Segment::new(0.5, 0.0, 0.0)).unwrap();

        let mesh = flatten(&tree);
        // The branch grows from the trunk's base, at the root tip (y = 1)
        let branch = ring_center(&mesh, 3 * SIDES);
        assert!(branch.distance(&Vec3::new(0.0, 1.5, 0.0)) < 1e-5);
        // Stitched to the root's ring
        let per_segment = 2 * SIDES + 3;
        assert_eq!(&mesh.elements[2 * per_segment..2 * per_segment + 4], &[6, 6, 6, 18]);
        assert!((mesh.colors[3 * SIDES][0] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_counts_for_generated_trees() {
        let params = SegmentParameters {
            min_length: 0.5,
            max_length: 1.5,
            min_angle: 0.2,
            max_angle: 0.9,
            min_branches: 1,
            max_branches: 3,
            remaining_segments: 4,
            length_factor: 0.8,
            angle_factor: 1.0,
            segment_factor: 0.9,
            branch_factor: 0.5,
        };
        for seed in 0..10 {
            let tree = SkeletonGenerator::new(params).with_seed(seed).grow().unwrap();
            let mesh = flatten(&tree);

            let segments = tree.preorder(tree.root()).count();
            let branch_edges: usize = tree.iter().map(|(_, s)| s.branches.len()).sum();
            assert_eq!(segments, tree.len());
            assert_eq!(mesh.vertex_count(), SIDES * (segments + 1));
            assert_eq!(mesh.colors.len(), mesh.vertex_count());
            assert_eq!(
                mesh.element_count(),
                segments * (2 * SIDES + 3) + 2 * branch_edges
            );
            let vertices = mesh.vertex_count() as u32;
            assert!(mesh.elements.iter().all(|&e| e < vertices));
        }
    }

    #[test]
    fn test_flatten_is_repeatable() {
        let params = SegmentParameters {
            min_angle: 0.1,
            max_angle: 0.5,
            min_branches: 1,
            max_branches: 2,
            remaining_segments: 3,
            branch_factor: 0.5,
            ..Default::default()
        };
        let tree = SkeletonGenerator::new(params).with_seed(5).grow().unwrap();
        let flattener = MeshFlattener::new(MeshParams::default());
        let first = flattener.flatten(&tree).unwrap();
        let second = flattener.flatten(&tree).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.vertex_data(), second.vertex_data());
    }

    #[test]
    fn test_generated_straight_chain_end_to_end() {
        let params = SegmentParameters {
            min_length: 1.0,
            max_length: 1.0,
            min_angle: 0.0,
            max_angle: 0.0,
            min_branches: 0,
            max_branches: 0,
            remaining_segments: 3,
            ..Default::default()
        };
        let tree = SkeletonGenerator::new(params).with_seed(11).grow().unwrap();
        assert_eq!(tree.len(), 3);

        let mesh = flatten(&tree);
        assert_eq!(mesh.vertex_count() - SIDES, 18);
        assert_eq!(mesh.colors.len() - SIDES, 18);
        assert_eq!(mesh.element_count(), 45);
        assert_eq!(mesh.vertex_data().len(), 3 * mesh.vertex_count());
        assert_eq!(mesh.color_data().len(), 4 * mesh.vertex_count());
    }

    #[test]
    fn test_custom_ring_and_shading() {
        let params = MeshParams {
            ring_sides: 8,
            taper: 0.5,
            shade: 0.5,
        };
        let mesh = MeshFlattener::new(params).flatten(&straight(2)).unwrap();
        assert_eq!(mesh.vertex_count(), 8 * 3);
        assert_eq!(mesh.element_count(), 2 * (2 * 8 + 3));
        assert_eq!(mesh.colors[16][0], 0.5);
    }

    #[test]
    fn test_long_chain_flattens() {
        let tree = straight(20_000);
        let mesh = flatten(&tree);
        assert_eq!(mesh.vertex_count(), SIDES * 20_001);
        assert_eq!(mesh.element_count(), 20_000 * (2 * SIDES + 3));
        let tip = ring_center(&mesh, 20_000 * SIDES);
        assert!((tip.y - 20_000.0).abs() < 1e-2, "{:?}", tip);
    }

    #[test]
    fn test_sibling_branches_each_break_the_strip() {
        let mut tree = SegmentTree::with_root(Segment::new(1.0, 0.0, 0.0));
        let root = tree.root();
        tree.add_branch(root, Segment::new(1.0, 0.0, 0.0)).unwrap();
        tree.add_branch(root, Segment::new(1.0, 0.0, 0.0)).unwrap();

        let mesh = flatten(&tree);
        let per_segment = 2 * SIDES + 3;
        // First branch right after the root, then the second one after the first
        assert_eq!(&mesh.elements[per_segment..per_segment + 4], &[0, 0, 0, 12]);
        let second = 2 * per_segment + 2;
        assert_eq!(&mesh.elements[second..second + 4], &[0, 0, 0, 18]);
    }

    #[test]
    fn test_negative_length_segment_rejected() {
        let tree = SegmentTree::with_root(Segment::new(-3.0, 0.0, 0.0));
        let result = MeshFlattener::new(MeshParams::default()).flatten(&tree);
        assert!(matches!(result, Err(StructureError::NegativeLength { .. })));
    }

    #[test]
    fn test_malformed_tree_rejected() {
        let yaml = r#"
segments:
  - { next: 1 }
  - { previous: 0, next: 0 }
"#;
        let tree: SegmentTree = serde_yaml::from_str(yaml).unwrap();
        let result = MeshFlattener::new(MeshParams::default()).flatten(&tree);
        assert!(matches!(result, Err(StructureError::CycleDetected(_))));
    }

    #[test]
    fn test_ring_too_small() {
        let params = MeshParams {
            ring_sides: 2,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::RingTooSmall(2))));
        assert!(MeshParams::default().validate().is_ok());
    }
}
