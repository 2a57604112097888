//! Per-modifier dependency callbacks.
//!
//! Modifier types declare their extra relations through the
//! [`ModifierRelations`] trait. The geometry builder hands each callback a
//! [`NodeHandle`] wrapping the modifier's operation key, so a modifier can
//! only add relations that point into its own operation.

use crate::id::ObjectId;
use crate::key::{ComponentKey, ComponentKind, NodeKey, OperationKey};
use crate::relation::{RelationGraph, RelationKind};
use crate::scene::{Modifier, Scene};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Handle and context
// ---------------------------------------------------------------------------

/// Object components a modifier may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectComponent {
    Transform,
    Geometry,
    Pose,
}

impl ObjectComponent {
    fn kind(self) -> ComponentKind {
        match self {
            ObjectComponent::Transform => ComponentKind::Transform,
            ObjectComponent::Geometry => ComponentKind::Geometry,
            ObjectComponent::Pose => ComponentKind::EvalPose,
        }
    }
}

/// What a modifier callback may read.
#[derive(Debug, Clone, Copy)]
pub struct ModifierContext<'a> {
    pub scene: &'a Scene,
    /// The object owning the modifier stack.
    pub object: ObjectId,
    pub modifier: &'a Modifier,
}

/// Write access to the relation graph, restricted to relations that end in
/// one modifier operation.
#[derive(Debug)]
pub struct NodeHandle<'a> {
    key: OperationKey,
    graph: &'a mut RelationGraph,
}

impl<'a> NodeHandle<'a> {
    pub fn new(key: OperationKey, graph: &'a mut RelationGraph) -> Self {
        Self { key, graph }
    }

    /// The modifier operation this handle points into.
    pub fn key(&self) -> &OperationKey {
        &self.key
    }

    /// Make the modifier depend on a component of another object.
    pub fn add_object_relation(
        &mut self,
        object: ObjectId,
        component: ObjectComponent,
        label: &str,
    ) {
        self.graph.add_relation(
            ComponentKey::new(object, component.kind()),
            self.key.clone(),
            RelationKind::Standard,
            label,
        );
    }

    /// Make the modifier depend on a single bone of an armature object.
    pub fn add_bone_relation(&mut self, object: ObjectId, bone: &str, label: &str) {
        self.graph.add_relation(
            ComponentKey::bone(object, bone),
            self.key.clone(),
            RelationKind::Standard,
            label,
        );
    }

    /// Make the modifier depend on an arbitrary node.
    pub fn add_relation_from(&mut self, from: impl Into<NodeKey>, kind: RelationKind, label: &str) {
        self.graph.add_relation(from, self.key.clone(), kind, label);
    }
}

// ---------------------------------------------------------------------------
// ModifierRelations trait
// ---------------------------------------------------------------------------

/// Dependency information for one modifier type.
///
/// Both methods default to "no dependencies", so a type only overrides what
/// it needs.
pub trait ModifierRelations: std::fmt::Debug {
    /// The modifier type name this implementation is registered under.
    fn type_name(&self) -> &str;

    /// True if the modifier's result changes with time on its own.
    fn depends_on_time(&self, modifier: &Modifier) -> bool {
        let _ = modifier;
        false
    }

    /// Add the relations the modifier needs beyond its place in the stack.
    fn update_relations(&self, ctx: &ModifierContext<'_>, handle: &mut NodeHandle<'_>) {
        let _ = (ctx, handle);
    }
}

// ---------------------------------------------------------------------------
// Built-in modifier types
// ---------------------------------------------------------------------------

/// Deforms by another object (armature, lattice, curve).
#[derive(Debug)]
pub struct ObjectDeform {
    name: &'static str,
    components: &'static [ObjectComponent],
}

impl ModifierRelations for ObjectDeform {
    fn type_name(&self) -> &str {
        self.name
    }

    fn update_relations(&self, ctx: &ModifierContext<'_>, handle: &mut NodeHandle<'_>) {
        let Some(target) = ctx.modifier.object else {
            return;
        };
        for &component in self.components {
            handle.add_object_relation(target, component, self.name);
        }
    }
}

/// Hook: follows an object, or one bone of it.
#[derive(Debug)]
pub struct Hook;

impl ModifierRelations for Hook {
    fn type_name(&self) -> &str {
        "Hook"
    }

    fn update_relations(&self, ctx: &ModifierContext<'_>, handle: &mut NodeHandle<'_>) {
        let Some(target) = ctx.modifier.object else {
            return;
        };
        match ctx.modifier.bone.as_deref() {
            Some(bone) if !bone.is_empty() => match ctx.scene.pose_channel(target, bone) {
                Ok(_) => handle.add_bone_relation(target, bone, "Hook Modifier"),
                Err(err) => tracing::warn!("hook modifier '{}': {err}", ctx.modifier.name),
            },
            _ => handle.add_object_relation(target, ObjectComponent::Transform, "Hook Modifier"),
        }
    }
}

/// Shrinkwrap: projects onto the surface of a target and an optional
/// auxiliary target.
#[derive(Debug)]
pub struct Shrinkwrap;

impl ModifierRelations for Shrinkwrap {
    fn type_name(&self) -> &str {
        "Shrinkwrap"
    }

    fn update_relations(&self, ctx: &ModifierContext<'_>, handle: &mut NodeHandle<'_>) {
        for target in [ctx.modifier.object, ctx.modifier.auxiliary_object]
            .into_iter()
            .flatten()
        {
            handle.add_object_relation(target, ObjectComponent::Geometry, "Shrinkwrap Modifier");
            handle.add_object_relation(target, ObjectComponent::Transform, "Shrinkwrap Modifier");
        }
    }
}

/// A type whose result is a function of the current frame.
#[derive(Debug)]
pub struct TimeDependent(pub &'static str);

impl ModifierRelations for TimeDependent {
    fn type_name(&self) -> &str {
        self.0
    }

    fn depends_on_time(&self, _modifier: &Modifier) -> bool {
        true
    }
}

/// A type that reads nothing but its input geometry.
#[derive(Debug)]
pub struct NoDependencies(pub &'static str);

impl ModifierRelations for NoDependencies {
    fn type_name(&self) -> &str {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps modifier type names to their dependency callbacks. Unregistered types
/// contribute nothing beyond their stack position.
#[derive(Debug, Default)]
pub struct ModifierRegistry {
    types: HashMap<String, Box<dyn ModifierRelations>>,
}

impl ModifierRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in modifier types.
    pub fn with_builtin() -> Self {
        use ObjectComponent::{Geometry, Transform};

        let mut registry = Self::new();
        registry.register(Box::new(ObjectDeform {
            name: "Armature",
            components: &[Transform],
        }));
        registry.register(Box::new(ObjectDeform {
            name: "Lattice",
            components: &[Geometry, Transform],
        }));
        registry.register(Box::new(ObjectDeform {
            name: "Curve",
            components: &[Geometry, Transform],
        }));
        registry.register(Box::new(Hook));
        registry.register(Box::new(Shrinkwrap));
        for name in [
            "Wave",
            "Build",
            "Cloth",
            "Ocean",
            "Explode",
            "ParticleSystem",
            "DynamicPaint",
            "Fluid",
            "Softbody",
        ] {
            registry.register(Box::new(TimeDependent(name)));
        }
        for name in ["Smooth", "Subsurf", "Mirror", "Decimate", "Triangulate"] {
            registry.register(Box::new(NoDependencies(name)));
        }
        registry
    }

    /// Register callbacks, replacing any previous entry for the same type.
    pub fn register(&mut self, relations: Box<dyn ModifierRelations>) {
        self.types.insert(relations.type_name().to_string(), relations);
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn ModifierRelations> {
        self.types.get(type_name).map(|r| r.as_ref())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
