use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies an object placed in the scene.
    pub struct ObjectId;

    /// Identifies an object-data block (mesh, curve, armature, lamp, ...).
    pub struct DataId;

    /// Identifies a shape-key block attached to object data.
    pub struct KeyId;

    /// Identifies a material.
    pub struct MaterialId;

    /// Identifies a texture.
    pub struct TextureId;

    /// Identifies a shading or compositing node tree.
    pub struct NodeTreeId;

    /// Identifies a world (environment shading) block.
    pub struct WorldId;

    /// Identifies a particle-settings block shared by particle systems.
    pub struct ParticleSettingsId;

    /// Identifies a grease-pencil block.
    pub struct GreasePencilId;
}

/// Identity of one entity the relation graph can address. Two `IdRef`s are
/// equal iff they name the same entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum IdRef {
    /// The scene itself (rigid-body world, scene animation, compositor).
    Scene,
    Object(ObjectId),
    Data(DataId),
    ShapeKey(KeyId),
    Material(MaterialId),
    Texture(TextureId),
    NodeTree(NodeTreeId),
    World(WorldId),
    ParticleSettings(ParticleSettingsId),
    GreasePencil(GreasePencilId),
}

impl From<ObjectId> for IdRef {
    fn from(id: ObjectId) -> Self {
        IdRef::Object(id)
    }
}

impl From<DataId> for IdRef {
    fn from(id: DataId) -> Self {
        IdRef::Data(id)
    }
}

impl From<KeyId> for IdRef {
    fn from(id: KeyId) -> Self {
        IdRef::ShapeKey(id)
    }
}

impl From<MaterialId> for IdRef {
    fn from(id: MaterialId) -> Self {
        IdRef::Material(id)
    }
}

impl From<TextureId> for IdRef {
    fn from(id: TextureId) -> Self {
        IdRef::Texture(id)
    }
}

impl From<NodeTreeId> for IdRef {
    fn from(id: NodeTreeId) -> Self {
        IdRef::NodeTree(id)
    }
}

impl From<WorldId> for IdRef {
    fn from(id: WorldId) -> Self {
        IdRef::World(id)
    }
}

impl From<ParticleSettingsId> for IdRef {
    fn from(id: ParticleSettingsId) -> Self {
        IdRef::ParticleSettings(id)
    }
}

impl From<GreasePencilId> for IdRef {
    fn from(id: GreasePencilId) -> Self {
        IdRef::GreasePencil(id)
    }
}

impl IdRef {
    /// The object this identity names, if it is an object.
    pub fn as_object(self) -> Option<ObjectId> {
        match self {
            IdRef::Object(id) => Some(id),
            _ => None,
        }
    }
}
