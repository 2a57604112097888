//! The relation builder.
//!
//! [`RelationBuilder`] walks a [`Scene`] and appends ordering relations to a
//! [`RelationGraph`]. Each entity kind has its own build routine (in the
//! submodules); they all funnel through [`RelationGraph::add_relation`] and
//! share only two pieces of transient state: the cycle guard for shading
//! entities and the per-rig chain map.
//!
//! Building never fails. A reference that cannot be resolved in the scene is
//! logged at `warn` level and the affected relation is skipped.

mod animation;
mod constraint;
mod geometry;
mod object;
mod particles;
mod rig;
mod rigidbody;
mod shading;

use crate::config::BuilderConfig;
use crate::id::{IdRef, ObjectId};
use crate::key::{ComponentKind, NodeKey, OperationCode, OperationKey};
use crate::modifier::ModifierRegistry;
use crate::relation::{RelationGraph, RelationKind};
use crate::scene::{Scene, SceneError};
use crate::visited::VisitedSet;

// ---------------------------------------------------------------------------
// RelationBuilder
// ---------------------------------------------------------------------------

/// Builds the relations of one scene into a caller-owned graph.
#[derive(Debug)]
pub struct RelationBuilder<'a> {
    scene: &'a Scene,
    graph: &'a mut RelationGraph,
    modifiers: &'a ModifierRegistry,
    config: BuilderConfig,
    visited: VisitedSet,
}

impl<'a> RelationBuilder<'a> {
    /// Create a builder with the default configuration.
    pub fn new(
        scene: &'a Scene,
        graph: &'a mut RelationGraph,
        modifiers: &'a ModifierRegistry,
    ) -> Self {
        Self {
            scene,
            graph,
            modifiers,
            config: BuilderConfig::default(),
            visited: VisitedSet::new(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The cycle guard. Empty whenever no shading builder is running.
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Build the relations of the whole scene: every placed object, then the
    /// rigid-body world, scene animation, world, compositor and grease pencil.
    pub fn build_scene(&mut self) {
        let scene = self.scene;
        let _span = tracing::debug_span!("build_scene", scene = %scene.name).entered();

        debug_assert!(
            self.visited.is_empty(),
            "cycle guard leaked from a previous pass"
        );
        self.visited.clear();
        let before = self.graph.len();

        for &ob in scene.bases() {
            self.build_object(ob);
        }

        if scene.rigid_body_world.is_some() {
            self.build_rigidbody();
        }
        if scene.anim.is_some() {
            self.build_animdata(IdRef::Scene);
        }
        if let Some(world) = scene.world {
            self.build_world(world);
        }
        if let Some(tree) = scene.compositor {
            self.build_compositor(tree);
        }
        if let Some(gpd) = scene.grease_pencil {
            self.build_gpencil(gpd);
        }

        tracing::debug!(
            objects = scene.bases().len(),
            relations = self.graph.len() - before,
            "scene relations built"
        );
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    fn add_relation(
        &mut self,
        from: impl Into<NodeKey>,
        to: impl Into<NodeKey>,
        kind: RelationKind,
        label: &str,
    ) {
        self.graph.add_relation(from, to, kind, label);
    }

    /// Run `build` with `id` marked as being built. Returns without running it
    /// if `id` is already marked. The mark is always cleared afterwards.
    fn guarded(&mut self, id: IdRef, build: impl FnOnce(&mut Self)) {
        if !self.visited.enter(id) {
            tracing::trace!(?id, "already being built, skipping");
            return;
        }
        build(self);
        self.visited.leave(id);
    }
}

/// Build the relations of `scene` into a fresh graph.
pub fn build_relations(
    scene: &Scene,
    modifiers: &ModifierRegistry,
    config: &BuilderConfig,
) -> RelationGraph {
    let mut graph = RelationGraph::new();
    RelationBuilder::new(scene, &mut graph, modifiers)
        .with_config(config.clone())
        .build_scene();
    graph
}

/// Turn a failed lookup into a `warn` diagnostic.
fn found<T>(result: Result<T, SceneError>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("{context}: {err}");
            None
        }
    }
}

fn transform_op(ob: ObjectId, opcode: OperationCode) -> OperationKey {
    OperationKey::new(ob, ComponentKind::Transform, opcode)
}

fn pose_op(ob: ObjectId, opcode: OperationCode) -> OperationKey {
    OperationKey::new(ob, ComponentKind::EvalPose, opcode)
}

// ===========================================================================
// Tests
// ===========================================================================
