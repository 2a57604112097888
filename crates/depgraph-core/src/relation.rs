use crate::key::NodeKey;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Relation types
// ---------------------------------------------------------------------------

/// Semantic tag of a relation. Used for diagnostics and edge-type specific
/// handling downstream; it never changes the ordering contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Standard,
    /// Ordering between operations of one entity.
    Operation,
    /// Ordering between components of one entity.
    ComponentOrder,
    Transform,
    GeometryEval,
    /// Time source into time-dependent evaluation.
    Time,
    /// Driver into the value it drives.
    Driver,
    /// Driver input into the driver.
    DriverTarget,
    /// Shared data-block evaluation into its users.
    Datablock,
}

/// A directed edge: `from` must be evaluated before `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from: NodeKey,
    pub to: NodeKey,
    pub kind: RelationKind,
    /// Human-readable description. Only used for diagnostics.
    pub label: String,
}

// ---------------------------------------------------------------------------
// RelationGraph
// ---------------------------------------------------------------------------

/// Append-only set of relations produced by a build pass.
///
/// Relations are stored as key pairs, not resolved node pointers, so the
/// order in which builders run never matters. Duplicate relations are kept;
/// reducing them is a downstream concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationGraph {
    relations: Vec<Relation>,
}

impl RelationGraph {
    /// Create a new, empty relation graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the relation `from -> to`.
    pub fn add_relation(
        &mut self,
        from: impl Into<NodeKey>,
        to: impl Into<NodeKey>,
        kind: RelationKind,
        label: impl Into<String>,
    ) {
        let relation = Relation {
            from: from.into(),
            to: to.into(),
            kind,
            label: label.into(),
        };
        tracing::trace!(
            "relation {} -> {} ({:?}, {})",
            relation.from,
            relation.to,
            relation.kind,
            relation.label
        );
        self.relations.push(relation);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All relations in insertion order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Total number of relations, duplicates included.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Returns true if no relation has been added.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Returns true if at least one relation `from -> to` exists.
    pub fn contains(&self, from: &NodeKey, to: &NodeKey) -> bool {
        self.relations.iter().any(|r| &r.from == from && &r.to == to)
    }

    /// Find the first relation `from -> to`.
    pub fn find(&self, from: &NodeKey, to: &NodeKey) -> Option<&Relation> {
        self.relations.iter().find(|r| &r.from == from && &r.to == to)
    }

    /// Relations leaving `key`.
    pub fn relations_from<'a>(&'a self, key: &'a NodeKey) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| &r.from == key)
    }

    /// Relations entering `key`.
    pub fn relations_to<'a>(&'a self, key: &'a NodeKey) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| &r.to == key)
    }

    /// Every distinct key mentioned by a relation, sorted.
    pub fn keys(&self) -> Vec<NodeKey> {
        let mut keys: Vec<NodeKey> = self
            .relations
            .iter()
            .flat_map(|r| [r.from.clone(), r.to.clone()])
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// The distinct `(from, to)` pairs, ignoring kind, label and duplicates.
    pub fn edge_set(&self) -> std::collections::BTreeSet<(NodeKey, NodeKey)> {
        self.relations
            .iter()
            .map(|r| (r.from.clone(), r.to.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectId;
    use crate::key::*;
    use slotmap::SlotMap;

    fn object() -> ObjectId {
        let mut sm: SlotMap<ObjectId, ()> = SlotMap::with_key();
        sm.insert(())
    }

    fn op(ob: ObjectId, opcode: OperationCode) -> NodeKey {
        OperationKey::new(ob, ComponentKind::Transform, opcode).into()
    }

    #[test]
    fn add_relation_appends() {
        let ob = object();
        let mut graph = RelationGraph::new();
        assert!(graph.is_empty());

        graph.add_relation(
            OperationKey::new(ob, ComponentKind::Transform, OperationCode::TransformLocal),
            OperationKey::new(ob, ComponentKind::Transform, OperationCode::TransformFinal),
            RelationKind::ComponentOrder,
            "Object Transform",
        );

        assert_eq!(graph.len(), 1);
        let local = op(ob, OperationCode::TransformLocal);
        let final_ = op(ob, OperationCode::TransformFinal);
        assert!(graph.contains(&local, &final_));
        assert!(!graph.contains(&final_, &local));
        assert_eq!(
            graph.find(&local, &final_).unwrap().label,
            "Object Transform"
        );
    }

    #[test]
    fn duplicate_relations_are_kept() {
        let ob = object();
        let mut graph = RelationGraph::new();
        for _ in 0..2 {
            graph.add_relation(TimeSourceKey, ComponentKey::new(ob, ComponentKind::Animation),
                RelationKind::Time, "[TimeSrc -> Animation]");
        }
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_set().len(), 1);
    }

    #[test]
    fn relations_from_and_to() {
        let ob = object();
        let mut graph = RelationGraph::new();
        let local = op(ob, OperationCode::TransformLocal);
        let parent = op(ob, OperationCode::TransformParent);
        let final_ = op(ob, OperationCode::TransformFinal);
        graph.add_relation(
            local.clone(),
            parent.clone(),
            RelationKind::ComponentOrder,
            "a",
        );
        graph.add_relation(
            parent.clone(),
            final_.clone(),
            RelationKind::ComponentOrder,
            "b",
        );

        assert_eq!(graph.relations_from(&parent).count(), 1);
        assert_eq!(graph.relations_to(&parent).count(), 1);
        assert_eq!(graph.relations_to(&local).count(), 0);
        assert_eq!(graph.keys(), {
            let mut v = vec![local, parent, final_];
            v.sort();
            v
        });
    }

    #[test]
    fn graph_serializes_to_json() {
        let ob = object();
        let mut graph = RelationGraph::new();
        graph.add_relation(
            TimeSourceKey,
            ComponentKey::new(ob, ComponentKind::Animation),
            RelationKind::Time,
            "[TimeSrc -> Animation]",
        );
        let json = serde_json::to_string(&graph).expect("serialize graph");
        assert!(json.contains("TimeSource"));
        let back: RelationGraph = serde_json::from_str(&json).expect("deserialize graph");
        assert_eq!(back.relations(), graph.relations());
    }
}
