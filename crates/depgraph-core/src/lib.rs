//! Depgraph Core -- the relation builder of a scene dependency graph.
//!
//! This crate turns a read-only [`scene::Scene`] (objects, armatures,
//! constraints, modifiers, drivers, materials, particle and rigid-body
//! simulations) into a [`relation::RelationGraph`]: ordering relations
//! between fine-grained evaluation operations. Scheduling and evaluating
//! those operations is left to the consumer of the graph.
//!
//! # Build Pass
//!
//! One call to [`builder::RelationBuilder::build_scene`] walks the scene:
//!
//! 1. **Objects** -- Every placed object in base order: transform pipeline,
//!    parent, constraints, animation and drivers, then its data (geometry
//!    and modifier stack, pose with IK solvers, lamp, camera), particle
//!    systems and grease pencil.
//! 2. **Rigid body world** -- Rebuild and step operations and participants.
//! 3. **Scene** -- Scene animation, world, compositor and grease pencil.
//!
//! Relations are key pairs, so call order across entities never matters.
//! References that cannot be resolved are logged with `tracing` and skipped.
//!
//! ```rust,ignore
//! let mut scene = Scene::new("Scene");
//! scene.add_object(Object::new("Cube"));
//! let modifiers = ModifierRegistry::with_builtin();
//! let graph = build_relations(&scene, &modifiers, &BuilderConfig::default());
//! assert!(validation::find_cycles(&graph).is_acyclic());
//! ```
//!
//! # Key Types
//!
//! - [`key::NodeKey`] -- Component, operation, property-path and time-source
//!   keys addressing graph nodes.
//! - [`relation::RelationGraph`] -- Append-only list of typed, labelled
//!   relations.
//! - [`builder::RelationBuilder`] -- The per-pass builder and its cycle guard.
//! - [`chain_map::ChainMap`] -- Bone to IK chain root map of one rig.
//! - [`modifier::ModifierRegistry`] -- Per-type modifier callbacks.
//! - [`validation`] -- Cycle diagnostics over a built graph.

pub mod builder;
pub mod chain_map;
pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod id;
pub mod key;
pub mod modifier;
pub mod path;
pub mod relation;
pub mod scene;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod validation;
pub mod visited;

pub use builder::{build_relations, RelationBuilder};
pub use config::BuilderConfig;
pub use key::{ComponentKey, ComponentKind, NodeKey, OperationCode, OperationKey};
pub use modifier::ModifierRegistry;
pub use relation::{Relation, RelationGraph, RelationKind};
pub use scene::Scene;
