use serde::{Deserialize, Serialize};

/// Upper bound on the number of bones walked when following an IK or
/// spline-IK chain towards its root. Stops runaway walks over malformed
/// parent links; it carries no further meaning.
pub const DEFAULT_MAX_CHAIN_LINKS: usize = 255;

/// Settings for a relation build pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Maximum number of bones visited per solver chain walk.
    pub max_chain_links: usize,
    /// Emit the chain map of every rig at `debug` level after the solver pass.
    pub dump_chain_map: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_chain_links: DEFAULT_MAX_CHAIN_LINKS,
            dump_chain_map: false,
        }
    }
}
