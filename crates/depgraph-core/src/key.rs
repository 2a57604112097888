//! Typed addressing of relation-graph nodes.
//!
//! A key names a node without pointing at it. The builder freely references
//! nodes that have not been created yet; a later finalization step resolves
//! every key to exactly one node. Equality of keys is plain field equality,
//! so the same entity and the same fields always produce the same node.

use crate::id::IdRef;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Component and operation kinds
// ---------------------------------------------------------------------------

/// Coarse-grained aspect of an entity that groups operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ComponentKind {
    /// Generic parameters (drivers, camera settings).
    Parameters,
    /// Action / NLA evaluation.
    Animation,
    /// Object-level transform pipeline.
    Transform,
    /// Geometry evaluation (modifier stack, object data).
    Geometry,
    /// Whole-pose evaluation of an armature object.
    EvalPose,
    /// A single pose bone. Always addressed with the bone name.
    Bone,
    /// Particle-system evaluation.
    EvalParticles,
}

/// Identifies one schedulable unit of work inside a component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum OperationCode {
    /// Named placeholder operation ("Eval Init", "Geometry Eval", ...).
    Placeholder,
    Driver,

    // -- Object transform --
    TransformLocal,
    TransformParent,
    TransformConstraints,
    TransformFinal,
    TransformRigidBody,
    /// Transitional coarse object evaluation.
    ObjectUberEval,

    // -- Rigid body world --
    RigidBodyRebuild,
    RigidBodySim,

    // -- Geometry --
    GeometryModifier,
    /// Transitional coarse geometry evaluation.
    GeometryUberEval,

    // -- Pose --
    PoseInit,
    PoseDone,
    PoseIkSolver,
    PoseSplineIkSolver,

    // -- Bone --
    BoneLocal,
    BonePoseParent,
    BoneConstraints,
    /// Bone transform before any IK solver ran.
    BoneReady,
    /// Fully resolved bone transform.
    BoneDone,

    // -- Particles --
    ParticleSystemEval,
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Addresses a component of an entity, optionally narrowed by a
/// sub-identifier such as a bone name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentKey {
    pub id: IdRef,
    pub component: ComponentKind,
    pub name: Option<String>,
}

impl ComponentKey {
    pub fn new(id: impl Into<IdRef>, component: ComponentKind) -> Self {
        Self {
            id: id.into(),
            component,
            name: None,
        }
    }

    /// The component of a single pose bone.
    pub fn bone(id: impl Into<IdRef>, bone: &str) -> Self {
        Self {
            id: id.into(),
            component: ComponentKind::Bone,
            name: Some(bone.to_string()),
        }
    }
}

/// Addresses one operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub id: IdRef,
    pub component: ComponentKind,
    /// Sub-identifier of the owning component (bone name, solver root).
    pub component_name: Option<String>,
    pub opcode: OperationCode,
    /// Distinguishes several operations sharing an opcode (modifier name,
    /// driver path, placeholder label).
    pub name: Option<String>,
}

impl OperationKey {
    pub fn new(id: impl Into<IdRef>, component: ComponentKind, opcode: OperationCode) -> Self {
        Self {
            id: id.into(),
            component,
            component_name: None,
            opcode,
            name: None,
        }
    }

    /// An operation distinguished by name inside an unnamed component.
    pub fn named(
        id: impl Into<IdRef>,
        component: ComponentKind,
        opcode: OperationCode,
        name: &str,
    ) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(id, component, opcode)
        }
    }

    /// An operation inside a named component (a bone, or a pose solver keyed
    /// by its chain root).
    pub fn in_component(
        id: impl Into<IdRef>,
        component: ComponentKind,
        component_name: &str,
        opcode: OperationCode,
    ) -> Self {
        Self {
            component_name: Some(component_name.to_string()),
            ..Self::new(id, component, opcode)
        }
    }

    /// Shorthand for an operation of a pose bone.
    pub fn bone(id: impl Into<IdRef>, bone: &str, opcode: OperationCode) -> Self {
        Self::in_component(id, ComponentKind::Bone, bone, opcode)
    }

    /// The component this operation lives in.
    pub fn component_key(&self) -> ComponentKey {
        ComponentKey {
            id: self.id,
            component: self.component,
            name: self.component_name.clone(),
        }
    }
}

/// A deferred reference to whatever operation evaluates a property path.
/// Resolved outside the relation builder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RnaPathKey {
    pub id: IdRef,
    pub path: String,
}

impl RnaPathKey {
    pub fn new(id: impl Into<IdRef>, path: &str) -> Self {
        Self {
            id: id.into(),
            path: path.to_string(),
        }
    }
}

/// Any node the builder can name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKey {
    /// The global time source. There is exactly one.
    TimeSource,
    Component(ComponentKey),
    Operation(OperationKey),
    RnaPath(RnaPathKey),
}

impl From<ComponentKey> for NodeKey {
    fn from(key: ComponentKey) -> Self {
        NodeKey::Component(key)
    }
}

impl From<OperationKey> for NodeKey {
    fn from(key: OperationKey) -> Self {
        NodeKey::Operation(key)
    }
}

impl From<RnaPathKey> for NodeKey {
    fn from(key: RnaPathKey) -> Self {
        NodeKey::RnaPath(key)
    }
}

/// Marker for the global time source, so call sites read like the other keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeSourceKey;

impl From<TimeSourceKey> for NodeKey {
    fn from(_: TimeSourceKey) -> Self {
        NodeKey::TimeSource
    }
}

impl NodeKey {
    /// The entity this key belongs to, if any.
    pub fn id(&self) -> Option<IdRef> {
        match self {
            NodeKey::TimeSource => None,
            NodeKey::Component(k) => Some(k.id),
            NodeKey::Operation(k) => Some(k.id),
            NodeKey::RnaPath(k) => Some(k.id),
        }
    }

    /// The operation key, if this key addresses an operation.
    pub fn as_operation(&self) -> Option<&OperationKey> {
        match self {
            NodeKey::Operation(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::TimeSource => write!(f, "TimeSource"),
            NodeKey::Component(k) => {
                write!(f, "{:?}/{:?}", k.id, k.component)?;
                if let Some(name) = &k.name {
                    write!(f, "[{name}]")?;
                }
                Ok(())
            }
            NodeKey::Operation(k) => {
                write!(f, "{:?}/{:?}", k.id, k.component)?;
                if let Some(name) = &k.component_name {
                    write!(f, "[{name}]")?;
                }
                write!(f, ".{:?}", k.opcode)?;
                if let Some(name) = &k.name {
                    write!(f, "({name})")?;
                }
                Ok(())
            }
            NodeKey::RnaPath(k) => write!(f, "{:?}:'{}'", k.id, k.path),
        }
    }
}
