//! Cycle diagnostics over a built relation set.
//!
//! Builders are expected to never emit a cycle for the patterns they know
//! about. [`find_cycles`] checks that after the fact, treating every key as an
//! opaque node. It is a diagnostic, not a scheduler: no execution order is
//! produced.

use crate::key::NodeKey;
use crate::relation::{Relation, RelationGraph};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Keys that could not be ordered, and the relations among them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Keys on a cycle or downstream of one, sorted.
    pub cyclic_keys: Vec<NodeKey>,
    /// Relations whose both ends are in `cyclic_keys`.
    pub relations: Vec<Relation>,
}

impl CycleReport {
    pub fn is_acyclic(&self) -> bool {
        self.cyclic_keys.is_empty()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_acyclic() {
            return write!(f, "no cycles");
        }
        writeln!(f, "{} keys left unordered:", self.cyclic_keys.len())?;
        for rel in &self.relations {
            writeln!(f, "  {} -> {} ({})", rel.from, rel.to, rel.label)?;
        }
        Ok(())
    }
}

/// Run Kahn's algorithm over the relation set. Whatever keys keep a non-zero
/// in-degree are reported.
pub fn find_cycles(graph: &RelationGraph) -> CycleReport {
    // Compute in-degree and adjacency for each key.
    let mut in_degree: BTreeMap<&NodeKey, usize> = BTreeMap::new();
    let mut outputs: BTreeMap<&NodeKey, Vec<&NodeKey>> = BTreeMap::new();
    for rel in graph.relations() {
        in_degree.entry(&rel.from).or_insert(0);
        *in_degree.entry(&rel.to).or_insert(0) += 1;
        outputs.entry(&rel.from).or_default().push(&rel.to);
    }

    // Seed the queue with all zero-in-degree keys.
    let mut queue: VecDeque<&NodeKey> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(&key, _)| key)
        .collect();

    while let Some(key) = queue.pop_front() {
        for &dest in outputs.get(key).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(dest) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(dest);
                }
            }
        }
    }

    let cyclic_keys: Vec<NodeKey> = in_degree
        .into_iter()
        .filter(|&(_, deg)| deg > 0)
        .map(|(key, _)| key.clone())
        .collect();
    if cyclic_keys.is_empty() {
        return CycleReport::default();
    }

    let relations: Vec<Relation> = graph
        .relations()
        .iter()
        .filter(|rel| {
            cyclic_keys.binary_search(&rel.from).is_ok()
                && cyclic_keys.binary_search(&rel.to).is_ok()
        })
        .cloned()
        .collect();
    tracing::debug!(
        keys = cyclic_keys.len(),
        relations = relations.len(),
        "relation cycles found"
    );

    CycleReport {
        cyclic_keys,
        relations,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdRef;
    use crate::key::{ComponentKey, ComponentKind, TimeSourceKey};
    use crate::relation::RelationKind;

    fn comp(component: ComponentKind) -> NodeKey {
        ComponentKey::new(IdRef::Scene, component).into()
    }

    #[test]
    fn empty_graph_is_acyclic() {
        let report = find_cycles(&RelationGraph::new());
        assert!(report.is_acyclic());
        assert_eq!(report.to_string(), "no cycles");
    }

    #[test]
    fn chain_is_acyclic() {
        let mut graph = RelationGraph::new();
        graph.add_relation(
            TimeSourceKey,
            comp(ComponentKind::Animation),
            RelationKind::Time,
            "a",
        );
        graph.add_relation(
            comp(ComponentKind::Animation),
            comp(ComponentKind::Transform),
            RelationKind::Standard,
            "b",
        );
        // Duplicate relations count twice on both sides.
        graph.add_relation(
            comp(ComponentKind::Animation),
            comp(ComponentKind::Transform),
            RelationKind::Standard,
            "b",
        );
        assert!(find_cycles(&graph).is_acyclic());
    }

    #[test]
    fn cycle_and_its_tail_are_reported() {
        let mut graph = RelationGraph::new();
        let a = comp(ComponentKind::Transform);
        let b = comp(ComponentKind::Geometry);
        let tail = comp(ComponentKind::Parameters);
        graph.add_relation(TimeSourceKey, a.clone(), RelationKind::Time, "time");
        graph.add_relation(a.clone(), b.clone(), RelationKind::Standard, "forward");
        graph.add_relation(b.clone(), a.clone(), RelationKind::Standard, "back");
        graph.add_relation(b.clone(), tail.clone(), RelationKind::Standard, "tail");

        let report = find_cycles(&graph);
        assert!(!report.is_acyclic());
        assert_eq!(report.cyclic_keys.len(), 3);
        assert!(!report.cyclic_keys.contains(&TimeSourceKey.into()));
        assert_eq!(report.relations.len(), 3);
        assert!(report.to_string().contains("back"));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = RelationGraph::new();
        let a = comp(ComponentKind::Transform);
        graph.add_relation(a.clone(), a.clone(), RelationKind::Standard, "self");
        let report = find_cycles(&graph);
        assert_eq!(report.cyclic_keys, vec![a]);
    }
}
