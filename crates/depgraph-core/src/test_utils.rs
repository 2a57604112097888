//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::id::ObjectId;
use crate::key::NodeKey;
use crate::relation::RelationGraph;
use crate::scene::*;
use std::collections::{BTreeSet, VecDeque};

// ===========================================================================
// Scene constructors
// ===========================================================================

/// Animation data with an action, so the owner counts as animated.
pub fn animated() -> AnimData {
    AnimData {
        action: Some(Action {
            name: "Action".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Place an object without data.
pub fn add_empty(scene: &mut Scene, name: &str) -> ObjectId {
    scene.add_object(Object::new(name))
}

/// Place an object with its own, freshly created data block.
pub fn add_object_with_data(scene: &mut Scene, name: &str, kind: DataKind) -> ObjectId {
    let data = scene.add_data(DataBlock::new(name, kind));
    scene.add_object(Object {
        data: Some(data),
        ..Object::new(name)
    })
}

pub fn add_mesh(scene: &mut Scene, name: &str) -> ObjectId {
    add_object_with_data(scene, name, DataKind::Mesh)
}

/// Place an empty parented to `parent`.
pub fn add_child(scene: &mut Scene, name: &str, parent: ObjectId, kind: ParentKind) -> ObjectId {
    scene.add_object(Object {
        parent: Some(Parent { object: parent, kind }),
        ..Object::new(name)
    })
}

/// Place an armature object whose pose has one channel per `(bone, parent)`
/// pair, in the given order.
pub fn add_armature(scene: &mut Scene, name: &str, bones: &[(&str, Option<&str>)]) -> ObjectId {
    let data = scene.add_data(DataBlock::new(name, DataKind::Armature));
    let pose = Pose {
        channels: bones
            .iter()
            .map(|&(bone, parent)| PoseChannel::new(bone, parent))
            .collect(),
    };
    scene.add_object(Object {
        data: Some(data),
        pose: Some(pose),
        ..Object::new(name)
    })
}

// ===========================================================================
// Graph queries
// ===========================================================================

pub fn has_relation(
    graph: &RelationGraph,
    from: impl Into<NodeKey>,
    to: impl Into<NodeKey>,
) -> bool {
    graph.contains(&from.into(), &to.into())
}

/// Returns `true` if `to` can be reached from `from` by following relations.
pub fn reachable(graph: &RelationGraph, from: impl Into<NodeKey>, to: impl Into<NodeKey>) -> bool {
    let from = from.into();
    let to = to.into();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([from]);
    while let Some(key) = queue.pop_front() {
        if key == to {
            return true;
        }
        for rel in graph.relations_from(&key) {
            if seen.insert(rel.to.clone()) {
                queue.push_back(rel.to.clone());
            }
        }
    }
    false
}
