//! Read-only scene model consumed by the relation builder.
//!
//! Entities live in one `SlotMap` per kind and reference each other through
//! typed ids. The builder only reads this model; nothing in it is mutated
//! during a build pass.

use crate::id::*;
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by scene lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("object not found: {0:?}")]
    ObjectNotFound(ObjectId),
    #[error("object data not found: {0:?}")]
    DataNotFound(DataId),
    #[error("shape key not found: {0:?}")]
    ShapeKeyNotFound(KeyId),
    #[error("material not found: {0:?}")]
    MaterialNotFound(MaterialId),
    #[error("texture not found: {0:?}")]
    TextureNotFound(TextureId),
    #[error("node tree not found: {0:?}")]
    NodeTreeNotFound(NodeTreeId),
    #[error("world not found: {0:?}")]
    WorldNotFound(WorldId),
    #[error("particle settings not found: {0:?}")]
    ParticleSettingsNotFound(ParticleSettingsId),
    #[error("grease pencil not found: {0:?}")]
    GreasePencilNotFound(GreasePencilId),
    #[error("object {0:?} has no pose")]
    NoPose(ObjectId),
    #[error("bone '{bone}' not found in pose of {object:?}")]
    BoneNotFound { object: ObjectId, bone: String },
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Animation attached to an entity: an action, NLA tracks and drivers.
#[derive(Debug, Clone, Default)]
pub struct AnimData {
    pub action: Option<Action>,
    pub nla_tracks: Vec<NlaTrack>,
    /// Driver F-curves.
    pub drivers: Vec<FCurve>,
}

impl AnimData {
    /// True when there is time-based animation (an action or NLA tracks).
    pub fn is_animated(&self) -> bool {
        self.action.is_some() || !self.nla_tracks.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Action {
    pub name: String,
    pub curves: Vec<FCurve>,
}

#[derive(Debug, Clone, Default)]
pub struct NlaTrack {
    pub name: String,
}

/// An animation curve on one property channel. Driver curves carry a
/// [`Driver`].
#[derive(Debug, Clone, Default)]
pub struct FCurve {
    pub rna_path: String,
    pub array_index: usize,
    pub driver: Option<Driver>,
}

impl FCurve {
    pub fn new(rna_path: &str, array_index: usize) -> Self {
        Self {
            rna_path: rna_path.to_string(),
            array_index,
            driver: None,
        }
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = Some(driver);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Driver {
    pub variables: Vec<DriverVariable>,
}

/// How a driver variable reads its targets. Decides how many targets are
/// in use and whether they reference a struct (object/bone) or a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableKind {
    /// Reads one property through an RNA path.
    #[default]
    SingleProp,
    /// Rotational difference between two objects or bones.
    RotationDiff,
    /// Distance between two objects or bones.
    LocationDiff,
    /// One transform channel of an object or bone.
    TransformChannel,
}

impl VariableKind {
    /// Number of targets this kind of variable reads.
    pub fn used_targets(self) -> usize {
        match self {
            VariableKind::SingleProp | VariableKind::TransformChannel => 1,
            VariableKind::RotationDiff | VariableKind::LocationDiff => 2,
        }
    }

    /// True when targets reference an object or bone directly rather than
    /// through a property path.
    pub fn is_struct_ref(self) -> bool {
        !matches!(self, VariableKind::SingleProp)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverVariable {
    pub name: String,
    pub kind: VariableKind,
    pub targets: Vec<DriverTarget>,
}

impl DriverVariable {
    /// Targets actually read by this variable.
    pub fn used_targets(&self) -> &[DriverTarget] {
        let n = self.kind.used_targets().min(self.targets.len());
        &self.targets[..n]
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverTarget {
    pub id: Option<IdRef>,
    pub rna_path: Option<String>,
    /// Bone of a struct-ref target on an armature object.
    pub bone: Option<String>,
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ConstraintTarget {
    pub object: Option<ObjectId>,
    /// Bone name or vertex group name.
    pub subtarget: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FollowTrackData {
    pub has_clip: bool,
    pub use_active_clip: bool,
    pub track: Option<String>,
    pub depth_object: Option<ObjectId>,
}

/// Inverse-kinematics settings.
#[derive(Debug, Clone, Default)]
pub struct IkData {
    pub target: Option<ObjectId>,
    pub subtarget: Option<String>,
    pub pole_target: Option<ObjectId>,
    pub pole_subtarget: Option<String>,
    /// Number of bones in the chain; 0 means up to the armature root.
    pub chain_len: usize,
    /// Whether the owning bone itself is part of the chain.
    pub use_tip: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SplineIkData {
    /// Curve object providing the path.
    pub target: Option<ObjectId>,
    /// Number of bones in the chain, owner included; 0 means up to the root.
    pub chain_len: usize,
}

#[derive(Debug, Clone, Default)]
pub enum ConstraintKind {
    /// Constraint type without dependency information.
    #[default]
    Unknown,
    CopyLocation,
    CopyRotation,
    CopyScale,
    CopyTransforms,
    ChildOf,
    TrackTo,
    DampedTrack,
    LockedTrack,
    StretchTo,
    LimitDistance,
    Transformation,
    LimitLocation,
    LimitRotation,
    LimitScale,
    FollowPath,
    ClampTo,
    Shrinkwrap,
    FollowTrack(FollowTrackData),
    CameraSolver,
    ObjectSolver,
    Kinematic(IkData),
    SplineIk(SplineIkData),
}

#[derive(Debug, Clone, Default)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub targets: Vec<ConstraintTarget>,
}

impl Constraint {
    pub fn new(name: &str, kind: ConstraintKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, object: ObjectId, subtarget: Option<&str>) -> Self {
        self.targets.push(ConstraintTarget {
            object: Some(object),
            subtarget: subtarget.map(str::to_string),
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PoseChannel {
    pub name: String,
    pub parent: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl PoseChannel {
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            constraints: Vec::new(),
        }
    }
}

/// Pose bones of an armature object, in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    pub channels: Vec<PoseChannel>,
}

impl Pose {
    pub fn channel(&self, name: &str) -> Option<&PoseChannel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut PoseChannel> {
        self.channels.iter_mut().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Modifiers, particles, physics
// ---------------------------------------------------------------------------

/// One entry of an object's modifier stack. Type-specific dependencies are
/// declared by the callbacks registered for `type_name`.
#[derive(Debug, Clone, Default)]
pub struct Modifier {
    pub name: String,
    pub type_name: String,
    pub object: Option<ObjectId>,
    pub auxiliary_object: Option<ObjectId>,
    /// Bone sub-target (hook modifiers on armatures).
    pub bone: Option<String>,
}

impl Modifier {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_object(mut self, object: ObjectId) -> Self {
        self.object = Some(object);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub name: String,
    pub settings: ParticleSettingsId,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ParticleSettings {
    pub name: String,
    pub anim: Option<AnimData>,
    /// Restricts effectors to these objects when set.
    pub effector_group: Option<Vec<ObjectId>>,
    pub boids: Option<BoidSettings>,
}

#[derive(Debug, Clone, Default)]
pub struct BoidSettings {
    pub states: Vec<BoidState>,
}

#[derive(Debug, Clone, Default)]
pub struct BoidState {
    pub name: String,
    pub rules: Vec<BoidRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoidRule {
    Goal(Option<ObjectId>),
    Avoid(Option<ObjectId>),
    FollowLeader(Option<ObjectId>),
    AvoidCollision,
    AverageSpeed,
    Fight,
    Flock,
    Separate,
}

impl BoidRule {
    /// The object this rule steers towards or away from.
    pub fn object(self) -> Option<ObjectId> {
        match self {
            BoidRule::Goal(ob) | BoidRule::Avoid(ob) | BoidRule::FollowLeader(ob) => ob,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceFieldKind {
    Force,
    Wind,
    Vortex,
    Magnetic,
    Harmonic,
    Charge,
    Turbulence,
    Drag,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RigidBodyConstraint {
    pub object1: Option<ObjectId>,
    pub object2: Option<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct RigidBodyWorld {
    /// Simulation participants.
    pub objects: Vec<ObjectId>,
    /// Objects carrying rigid-body constraints.
    pub constraints: Vec<ObjectId>,
}

// ---------------------------------------------------------------------------
// Object data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CurveData {
    /// Objects parented to this curve follow its path.
    pub path: bool,
    pub bevel_object: Option<ObjectId>,
    pub taper_object: Option<ObjectId>,
    /// Fonts only.
    pub text_on_curve: Option<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct LampData {
    pub node_tree: Option<NodeTreeId>,
    pub textures: Vec<Option<TextureId>>,
}

#[derive(Debug, Clone, Default)]
pub struct CameraData {
    pub dof_object: Option<ObjectId>,
}

/// Type-specific part of an object-data block.
#[derive(Debug, Clone)]
pub enum DataKind {
    Mesh,
    Curve(CurveData),
    Font(CurveData),
    Surface,
    MetaBall,
    Lattice,
    Armature,
    Lamp(LampData),
    Camera(CameraData),
}

impl DataKind {
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            DataKind::Mesh => ObjectKind::Mesh,
            DataKind::Curve(_) => ObjectKind::Curve,
            DataKind::Font(_) => ObjectKind::Font,
            DataKind::Surface => ObjectKind::Surface,
            DataKind::MetaBall => ObjectKind::MetaBall,
            DataKind::Lattice => ObjectKind::Lattice,
            DataKind::Armature => ObjectKind::Armature,
            DataKind::Lamp(_) => ObjectKind::Lamp,
            DataKind::Camera(_) => ObjectKind::Camera,
        }
    }
}

/// Kind of an object, as given by its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Empty,
    Mesh,
    Curve,
    Font,
    Surface,
    MetaBall,
    Lattice,
    Armature,
    Lamp,
    Camera,
}

/// Data shared by every object that references it.
#[derive(Debug, Clone)]
pub struct DataBlock {
    pub name: String,
    pub kind: DataKind,
    pub anim: Option<AnimData>,
    pub shape_key: Option<KeyId>,
    pub materials: Vec<Option<MaterialId>>,
}

impl DataBlock {
    pub fn new(name: &str, kind: DataKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            anim: None,
            shape_key: None,
            materials: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShapeKey {
    pub name: String,
    /// The data block these keys deform.
    pub from: DataId,
    pub anim: Option<AnimData>,
}

// ---------------------------------------------------------------------------
// Shading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: String,
    pub anim: Option<AnimData>,
    pub textures: Vec<Option<TextureId>>,
    pub node_tree: Option<NodeTreeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub name: String,
    pub anim: Option<AnimData>,
    pub node_tree: Option<NodeTreeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Material(MaterialId),
    Texture(TextureId),
    Group(NodeTreeId),
    Other,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    pub name: String,
    pub anim: Option<AnimData>,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct World {
    pub name: String,
    pub anim: Option<AnimData>,
    pub textures: Vec<Option<TextureId>>,
    pub node_tree: Option<NodeTreeId>,
}

#[derive(Debug, Clone, Default)]
pub struct GreasePencil {
    pub name: String,
    pub anim: Option<AnimData>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// How an object is attached to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentKind {
    /// Plain object parent (further refined by the parent's kind).
    Object,
    /// Armature deform.
    Armature,
    /// Single vertex parent.
    Vertex,
    /// Three-vertex parent.
    Vertex3,
    /// Parented to a named bone of an armature.
    Bone(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub object: ObjectId,
    pub kind: ParentKind,
}

#[derive(Debug, Clone, Default)]
pub struct Object {
    pub name: String,
    pub data: Option<DataId>,
    pub parent: Option<Parent>,
    pub constraints: Vec<Constraint>,
    pub anim: Option<AnimData>,
    pub modifiers: Vec<Modifier>,
    pub materials: Vec<Option<MaterialId>>,
    pub particle_systems: Vec<ParticleSystem>,
    /// Armature objects only.
    pub pose: Option<Pose>,
    pub grease_pencil: Option<GreasePencilId>,
    pub force_field: Option<ForceFieldKind>,
    pub rigid_body_constraint: Option<RigidBodyConstraint>,
}

impl Object {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A scene: entity tables plus the ordered list of objects placed in it.
#[derive(Debug, Default)]
pub struct Scene {
    pub name: String,
    objects: SlotMap<ObjectId, Object>,
    /// Objects in the scene, in build order.
    bases: Vec<ObjectId>,
    data: SlotMap<DataId, DataBlock>,
    shape_keys: SlotMap<KeyId, ShapeKey>,
    materials: SlotMap<MaterialId, Material>,
    textures: SlotMap<TextureId, Texture>,
    node_trees: SlotMap<NodeTreeId, NodeTree>,
    worlds: SlotMap<WorldId, World>,
    particle_settings: SlotMap<ParticleSettingsId, ParticleSettings>,
    grease_pencils: SlotMap<GreasePencilId, GreasePencil>,

    pub camera: Option<ObjectId>,
    pub world: Option<WorldId>,
    /// Compositing node tree.
    pub compositor: Option<NodeTreeId>,
    pub anim: Option<AnimData>,
    pub grease_pencil: Option<GreasePencilId>,
    pub rigid_body_world: Option<RigidBodyWorld>,
}

impl Scene {
    /// Create a new, empty scene.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Add an object and place it in the scene.
    pub fn add_object(&mut self, object: Object) -> ObjectId {
        let id = self.objects.insert(object);
        self.bases.push(id);
        id
    }

    /// Add an object that is referenced by others but not placed in the
    /// scene (e.g. a library object used as a constraint target).
    pub fn add_unplaced_object(&mut self, object: Object) -> ObjectId {
        self.objects.insert(object)
    }

    pub fn add_data(&mut self, data: DataBlock) -> DataId {
        self.data.insert(data)
    }

    pub fn add_shape_key(&mut self, key: ShapeKey) -> KeyId {
        let from = key.from;
        let id = self.shape_keys.insert(key);
        if let Some(data) = self.data.get_mut(from) {
            data.shape_key = Some(id);
        }
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    pub fn add_node_tree(&mut self, tree: NodeTree) -> NodeTreeId {
        self.node_trees.insert(tree)
    }

    pub fn add_world(&mut self, world: World) -> WorldId {
        self.worlds.insert(world)
    }

    pub fn add_particle_settings(&mut self, settings: ParticleSettings) -> ParticleSettingsId {
        self.particle_settings.insert(settings)
    }

    pub fn add_grease_pencil(&mut self, gpd: GreasePencil) -> GreasePencilId {
        self.grease_pencils.insert(gpd)
    }

    // -----------------------------------------------------------------------
    // Mutable access (scene setup only)
    // -----------------------------------------------------------------------

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id)
    }

    pub fn data_mut(&mut self, id: DataId) -> Option<&mut DataBlock> {
        self.data.get_mut(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn texture_mut(&mut self, id: TextureId) -> Option<&mut Texture> {
        self.textures.get_mut(id)
    }

    pub fn node_tree_mut(&mut self, id: NodeTreeId) -> Option<&mut NodeTree> {
        self.node_trees.get_mut(id)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Objects placed in the scene, in build order.
    pub fn bases(&self) -> &[ObjectId] {
        &self.bases
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object, SceneError> {
        self.objects.get(id).ok_or(SceneError::ObjectNotFound(id))
    }

    pub fn data(&self, id: DataId) -> Result<&DataBlock, SceneError> {
        self.data.get(id).ok_or(SceneError::DataNotFound(id))
    }

    pub fn shape_key(&self, id: KeyId) -> Result<&ShapeKey, SceneError> {
        self.shape_keys.get(id).ok_or(SceneError::ShapeKeyNotFound(id))
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material, SceneError> {
        self.materials.get(id).ok_or(SceneError::MaterialNotFound(id))
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture, SceneError> {
        self.textures.get(id).ok_or(SceneError::TextureNotFound(id))
    }

    pub fn node_tree(&self, id: NodeTreeId) -> Result<&NodeTree, SceneError> {
        self.node_trees.get(id).ok_or(SceneError::NodeTreeNotFound(id))
    }

    pub fn world(&self, id: WorldId) -> Result<&World, SceneError> {
        self.worlds.get(id).ok_or(SceneError::WorldNotFound(id))
    }

    pub fn particle_settings(
        &self,
        id: ParticleSettingsId,
    ) -> Result<&ParticleSettings, SceneError> {
        self.particle_settings
            .get(id)
            .ok_or(SceneError::ParticleSettingsNotFound(id))
    }

    pub fn grease_pencil(&self, id: GreasePencilId) -> Result<&GreasePencil, SceneError> {
        self.grease_pencils
            .get(id)
            .ok_or(SceneError::GreasePencilNotFound(id))
    }

    /// Find a placed object by name.
    pub fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.bases
            .iter()
            .copied()
            .find(|&id| self.objects.get(id).is_some_and(|ob| ob.name == name))
    }

    /// Kind of an object, derived from its data. Objects without data (or
    /// with dangling data) are empties.
    pub fn object_kind(&self, id: ObjectId) -> ObjectKind {
        self.objects
            .get(id)
            .and_then(|ob| ob.data)
            .and_then(|data| self.data.get(data))
            .map_or(ObjectKind::Empty, |data| data.kind.object_kind())
    }

    /// A bone of an object's pose.
    pub fn pose_channel(&self, object: ObjectId, bone: &str) -> Result<&PoseChannel, SceneError> {
        let pose = self
            .object(object)?
            .pose
            .as_ref()
            .ok_or(SceneError::NoPose(object))?;
        pose.channel(bone).ok_or_else(|| SceneError::BoneNotFound {
            object,
            bone: bone.to_string(),
        })
    }

    /// Animation data of any entity, if it has some.
    pub fn anim_data(&self, id: IdRef) -> Option<&AnimData> {
        match id {
            IdRef::Scene => self.anim.as_ref(),
            IdRef::Object(id) => self.objects.get(id)?.anim.as_ref(),
            IdRef::Data(id) => self.data.get(id)?.anim.as_ref(),
            IdRef::ShapeKey(id) => self.shape_keys.get(id)?.anim.as_ref(),
            IdRef::Material(id) => self.materials.get(id)?.anim.as_ref(),
            IdRef::Texture(id) => self.textures.get(id)?.anim.as_ref(),
            IdRef::NodeTree(id) => self.node_trees.get(id)?.anim.as_ref(),
            IdRef::World(id) => self.worlds.get(id)?.anim.as_ref(),
            IdRef::ParticleSettings(id) => self.particle_settings.get(id)?.anim.as_ref(),
            IdRef::GreasePencil(id) => self.grease_pencils.get(id)?.anim.as_ref(),
        }
    }

    /// Placed objects whose data is `data`.
    pub fn users_of_data(&self, data: DataId) -> impl Iterator<Item = ObjectId> + '_ {
        self.bases
            .iter()
            .copied()
            .filter(move |&id| self.objects.get(id).is_some_and(|ob| ob.data == Some(data)))
    }

    /// Effective material of every slot: the object's slot wins over the
    /// data's slot.
    pub fn object_materials(&self, id: ObjectId) -> Vec<MaterialId> {
        let Some(ob) = self.objects.get(id) else {
            return Vec::new();
        };
        let data_slots: &[Option<MaterialId>] = ob
            .data
            .and_then(|d| self.data.get(d))
            .map_or(&[], |d| d.materials.as_slice());
        let slots = ob.materials.len().max(data_slots.len());
        (0..slots)
            .filter_map(|i| {
                ob.materials
                    .get(i)
                    .copied()
                    .flatten()
                    .or_else(|| data_slots.get(i).copied().flatten())
            })
            .collect()
    }

    /// The basis ("motherball") of a metaball object's family.
    ///
    /// Metaballs named `Family`, `Family.001`, `Family.002` ... form one
    /// family; the member with the lowest number is the basis.
    pub fn metaball_basis(&self, id: ObjectId) -> Option<ObjectId> {
        let ob = self.objects.get(id)?;
        let (family, _) = split_family_name(&ob.name);
        self.bases
            .iter()
            .copied()
            .filter(|&other| self.object_kind(other) == ObjectKind::MetaBall)
            .filter_map(|other| {
                let (other_family, number) = split_family_name(&self.objects.get(other)?.name);
                (other_family == family).then_some((number, other))
            })
            .min_by_key(|(number, _)| *number)
            .map(|(_, other)| other)
    }
}

/// Split `Name.012` into (`Name`, 12). Names without a numeric suffix get 0.
fn split_family_name(name: &str) -> (&str, u32) {
    if let Some((family, suffix)) = name.rsplit_once('.')
        && !suffix.is_empty()
        && let Ok(number) = suffix.parse::<u32>()
    {
        return (family, number);
    }
    (name, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_object(scene: &mut Scene, name: &str) -> ObjectId {
        let data = scene.add_data(DataBlock::new(name, DataKind::Mesh));
        let mut ob = Object::new(name);
        ob.data = Some(data);
        scene.add_object(ob)
    }

    #[test]
    fn object_lookup_errors() {
        let mut scene = Scene::new("Scene");
        let ob = scene.add_object(Object::new("Empty"));
        assert_eq!(scene.object(ob).unwrap().name, "Empty");

        let mut other: SlotMap<ObjectId, ()> = SlotMap::with_key();
        other.insert(());
        let stale = other.insert(());
        assert_eq!(
            scene.object(stale).unwrap_err(),
            SceneError::ObjectNotFound(stale)
        );
    }

    #[test]
    fn object_kind_follows_data() {
        let mut scene = Scene::new("Scene");
        let empty = scene.add_object(Object::new("Empty"));
        let cube = mesh_object(&mut scene, "Cube");
        assert_eq!(scene.object_kind(empty), ObjectKind::Empty);
        assert_eq!(scene.object_kind(cube), ObjectKind::Mesh);
    }

    #[test]
    fn pose_channel_lookup() {
        let mut scene = Scene::new("Scene");
        let mut rig = Object::new("Rig");
        rig.pose = Some(Pose {
            channels: vec![
                PoseChannel::new("root", None),
                PoseChannel::new("hand", Some("root")),
            ],
        });
        let rig = scene.add_object(rig);
        let plain = scene.add_object(Object::new("Plain"));

        assert_eq!(
            scene.pose_channel(rig, "hand").unwrap().parent.as_deref(),
            Some("root")
        );
        assert!(matches!(
            scene.pose_channel(rig, "foot"),
            Err(SceneError::BoneNotFound { .. })
        ));
        assert_eq!(
            scene.pose_channel(plain, "hand").unwrap_err(),
            SceneError::NoPose(plain)
        );
    }

    #[test]
    fn shape_key_registers_on_data() {
        let mut scene = Scene::new("Scene");
        let data = scene.add_data(DataBlock::new("Mesh", DataKind::Mesh));
        let key = scene.add_shape_key(ShapeKey {
            name: "Key".into(),
            from: data,
            anim: None,
        });
        assert_eq!(scene.data(data).unwrap().shape_key, Some(key));
    }

    #[test]
    fn object_slot_overrides_data_slot() {
        let mut scene = Scene::new("Scene");
        let red = scene.add_material(Material { name: "Red".into(), ..Default::default() });
        let blue = scene.add_material(Material { name: "Blue".into(), ..Default::default() });
        let green = scene.add_material(Material { name: "Green".into(), ..Default::default() });
        let cube = mesh_object(&mut scene, "Cube");
        let data = scene.object(cube).unwrap().data.unwrap();
        scene.data_mut(data).unwrap().materials = vec![Some(red), Some(green)];
        scene.object_mut(cube).unwrap().materials = vec![Some(blue)];

        assert_eq!(scene.object_materials(cube), vec![blue, green]);
    }

    #[test]
    fn metaball_family_basis_is_lowest_number() {
        let mut scene = Scene::new("Scene");
        let mut add_ball = |scene: &mut Scene, name: &str| {
            let data = scene.add_data(DataBlock::new(name, DataKind::MetaBall));
            let mut ob = Object::new(name);
            ob.data = Some(data);
            scene.add_object(ob)
        };
        let b2 = add_ball(&mut scene, "Mball.002");
        let b0 = add_ball(&mut scene, "Mball");
        let b1 = add_ball(&mut scene, "Mball.001");
        let other = add_ball(&mut scene, "Other");

        assert_eq!(scene.metaball_basis(b2), Some(b0));
        assert_eq!(scene.metaball_basis(b1), Some(b0));
        assert_eq!(scene.metaball_basis(b0), Some(b0));
        assert_eq!(scene.metaball_basis(other), Some(other));
    }

    #[test]
    fn family_name_split() {
        assert_eq!(split_family_name("Ball.010"), ("Ball", 10));
        assert_eq!(split_family_name("Ball"), ("Ball", 0));
        assert_eq!(split_family_name("Ball.L"), ("Ball.L", 0));
    }

    #[test]
    fn used_driver_targets_follow_variable_kind() {
        let target = DriverTarget::default();
        let var = DriverVariable {
            name: "var".into(),
            kind: VariableKind::SingleProp,
            targets: vec![target.clone(), target.clone()],
        };
        assert_eq!(var.used_targets().len(), 1);

        let diff = DriverVariable {
            kind: VariableKind::LocationDiff,
            ..var.clone()
        };
        assert_eq!(diff.used_targets().len(), 2);
        assert!(diff.kind.is_struct_ref());
    }
}
