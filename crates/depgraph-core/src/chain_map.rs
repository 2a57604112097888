//! Root/chain map for pose bones.
//!
//! Records, for every bone that takes part in an IK or spline-IK chain, the
//! root bones of the chains it belongs to. Relations between two bones that
//! share a chain root depend on the cheaper "ready" state of the source bone
//! instead of its "done" state; a solver may otherwise need a bone's result
//! before that bone's own parent is done.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Maps a pose-bone name to the set of chain roots it has been registered
/// under. A bone may belong to several chains.
#[derive(Debug, Clone, Default)]
pub struct ChainMap {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl ChainMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `bone` belongs to the chain rooted at `root`.
    pub fn add_bone(&mut self, bone: &str, root: &str) {
        self.map
            .entry(bone.to_string())
            .or_default()
            .insert(root.to_string());
    }

    /// True iff the root sets of the two bones intersect.
    ///
    /// A bone missing from the map has no common root with anything; that is
    /// an expected outcome, not an error.
    pub fn has_common_root(&self, bone1: &str, bone2: &str) -> bool {
        let Some(roots1) = self.map.get(bone1) else {
            tracing::debug!("chain map: bone '{bone1}' not found ({bone1} => {bone2})\n{self}");
            return false;
        };
        let Some(roots2) = self.map.get(bone2) else {
            tracing::debug!("chain map: bone '{bone2}' not found ({bone1} => {bone2})\n{self}");
            return false;
        };
        !roots1.is_disjoint(roots2)
    }

    /// The chain roots `bone` has been registered under.
    pub fn roots_of(&self, bone: &str) -> Option<&BTreeSet<String>> {
        self.map.get(bone)
    }

    /// Returns true if the bone has been registered under any root.
    pub fn contains(&self, bone: &str) -> bool {
        self.map.contains_key(bone)
    }

    /// Number of registered bones.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Display for ChainMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Root PChan Map:")?;
        for (bone, roots) in &self.map {
            write!(f, "  {bone} : {{ ")?;
            for root in roots {
                write!(f, "{root}, ")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
