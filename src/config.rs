use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TreeResult};
use crate::mesh::{FlatMesh, MeshFlattener, MeshParams};
use crate::skeleton::{SegmentParameters, SegmentTree, SkeletonGenerator};

/// Everything needed to grow and flatten one tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    pub seed: u64,
    pub segments: SegmentParameters,
    pub mesh: MeshParams,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            segments: SegmentParameters::default(),
            mesh: MeshParams::default(),
        }
    }
}

impl TreeConfig {
    /// Parse from YAML string. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: TreeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segments.validate()?;
        self.mesh.validate()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn generator(&self) -> SkeletonGenerator {
        SkeletonGenerator::new(self.segments).with_seed(self.seed)
    }

    pub fn flattener(&self) -> MeshFlattener {
        MeshFlattener::new(self.mesh)
    }

    /// Grow a skeleton and flatten it in one go
    pub fn build(&self) -> TreeResult<(SegmentTree, FlatMesh)> {
        let tree = self.generator().grow()?;
        let mesh = self.flattener().flatten(&tree)?;
        Ok((tree, mesh))
    }
}
