//! Data-driven scene loading from JSON.
//!
//! Feature-gated behind `data-loader`. Describes a [`Scene`] by name: objects
//! reference their parents, constraint targets, modifier objects and
//! materials by name, and those references are resolved after every entity
//! has been registered. Bone names are not checked here; the builder reports
//! unknown bones itself.

use crate::id::{MaterialId, ObjectId, TextureId};
use crate::scene::{
    Action, AnimData, CameraData, Constraint, ConstraintKind, ConstraintTarget, CurveData,
    DataBlock, DataKind, IkData, Material, Modifier, Object, Parent, ParentKind, Pose,
    PoseChannel, Scene, SplineIkData, Texture,
};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during scene loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("unknown object reference: {0}")]
    UnknownObjectRef(String),
    #[error("unknown material reference: {0}")]
    UnknownMaterialRef(String),
    #[error("unknown texture reference: {0}")]
    UnknownTextureRef(String),
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),
    #[error("unknown parent type: {0}")]
    UnknownParentType(String),
    #[error("duplicate object name: {0}")]
    DuplicateObject(String),
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level scene data structure for JSON deserialization.
#[derive(Debug, serde::Deserialize)]
pub struct SceneData {
    #[serde(default = "default_scene_name")]
    pub name: String,
    #[serde(default)]
    pub textures: Vec<TextureData>,
    #[serde(default)]
    pub materials: Vec<MaterialData>,
    #[serde(default)]
    pub objects: Vec<ObjectData>,
    /// Active camera, by object name.
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

fn default_scene_name() -> String {
    "Scene".to_string()
}

#[derive(Debug, serde::Deserialize)]
pub struct TextureData {
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

#[derive(Debug, serde::Deserialize)]
pub struct MaterialData {
    pub name: String,
    #[serde(default)]
    pub animated: bool,
    /// Texture slots, by texture name.
    #[serde(default)]
    pub textures: Vec<String>,
}

/// JSON representation of an object and its data.
#[derive(Debug, serde::Deserialize)]
pub struct ObjectData {
    pub name: String,
    /// One of "empty", "mesh", "curve", "font", "surface", "metaball",
    /// "lattice", "armature", "lamp" or "camera".
    #[serde(rename = "type", default = "default_object_type")]
    pub object_type: String,
    #[serde(default)]
    pub parent: Option<ParentData>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub constraints: Vec<ConstraintData>,
    #[serde(default)]
    pub modifiers: Vec<ModifierData>,
    /// Material slots, by material name.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Armatures only.
    #[serde(default)]
    pub bones: Vec<BoneData>,
    /// Curves only: children follow the path.
    #[serde(default)]
    pub path: bool,
    #[serde(default)]
    pub bevel_object: Option<String>,
    #[serde(default)]
    pub taper_object: Option<String>,
    /// Cameras only.
    #[serde(default)]
    pub dof_object: Option<String>,
}

fn default_object_type() -> String {
    "empty".to_string()
}

#[derive(Debug, serde::Deserialize)]
pub struct ParentData {
    pub object: String, // references object by name
    #[serde(rename = "type", default = "default_parent_type")]
    pub parent_type: String, // "object", "armature", "vertex", "vertex3", "bone"
    #[serde(default)]
    pub bone: Option<String>,
}

fn default_parent_type() -> String {
    "object".to_string()
}

#[derive(Debug, serde::Deserialize)]
pub struct BoneData {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintData>,
}

/// JSON representation of a constraint. IK fields are read only by the
/// `ik` and `spline_ik` types.
#[derive(Debug, serde::Deserialize)]
pub struct ConstraintData {
    pub name: String,
    #[serde(rename = "type")]
    pub constraint_type: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub subtarget: Option<String>,
    #[serde(default)]
    pub pole_target: Option<String>,
    #[serde(default)]
    pub pole_subtarget: Option<String>,
    #[serde(default)]
    pub chain_len: usize,
    #[serde(default)]
    pub use_tip: bool,
}

#[derive(Debug, serde::Deserialize)]
pub struct ModifierData {
    pub name: String,
    #[serde(rename = "type")]
    pub modifier_type: String, // registry type name, e.g. "Armature"
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub bone: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a scene from a JSON string.
pub fn load_scene_json(json: &str) -> Result<Scene, DataLoadError> {
    let data: SceneData = serde_json::from_str(json)?;
    build_scene(data)
}

/// Load a scene from JSON bytes.
pub fn load_scene_json_bytes(bytes: &[u8]) -> Result<Scene, DataLoadError> {
    let data: SceneData = serde_json::from_slice(bytes)?;
    build_scene(data)
}

fn anim(animated: bool) -> Option<AnimData> {
    animated.then(|| AnimData {
        action: Some(Action::default()),
        ..Default::default()
    })
}

/// Unknown constraint types load as [`ConstraintKind::Unknown`], which the
/// builder ignores.
fn parse_constraint_kind(
    con: &ConstraintData,
    names: &Names,
) -> Result<ConstraintKind, DataLoadError> {
    let kind = match con.constraint_type.as_str() {
        "copy_location" => ConstraintKind::CopyLocation,
        "copy_rotation" => ConstraintKind::CopyRotation,
        "copy_scale" => ConstraintKind::CopyScale,
        "copy_transforms" => ConstraintKind::CopyTransforms,
        "child_of" => ConstraintKind::ChildOf,
        "track_to" => ConstraintKind::TrackTo,
        "damped_track" => ConstraintKind::DampedTrack,
        "locked_track" => ConstraintKind::LockedTrack,
        "stretch_to" => ConstraintKind::StretchTo,
        "limit_distance" => ConstraintKind::LimitDistance,
        "transformation" => ConstraintKind::Transformation,
        "limit_location" => ConstraintKind::LimitLocation,
        "limit_rotation" => ConstraintKind::LimitRotation,
        "limit_scale" => ConstraintKind::LimitScale,
        "follow_path" => ConstraintKind::FollowPath,
        "clamp_to" => ConstraintKind::ClampTo,
        "shrinkwrap" => ConstraintKind::Shrinkwrap,
        "camera_solver" => ConstraintKind::CameraSolver,
        "object_solver" => ConstraintKind::ObjectSolver,
        "ik" => ConstraintKind::Kinematic(IkData {
            target: names.object_opt(con.target.as_deref())?,
            subtarget: con.subtarget.clone(),
            pole_target: names.object_opt(con.pole_target.as_deref())?,
            pole_subtarget: con.pole_subtarget.clone(),
            chain_len: con.chain_len,
            use_tip: con.use_tip,
        }),
        "spline_ik" => ConstraintKind::SplineIk(SplineIkData {
            target: names.object_opt(con.target.as_deref())?,
            chain_len: con.chain_len,
        }),
        _ => ConstraintKind::Unknown,
    };
    Ok(kind)
}

fn build_constraint(con: &ConstraintData, names: &Names) -> Result<Constraint, DataLoadError> {
    let kind = parse_constraint_kind(con, names)?;
    let mut constraint = Constraint::new(&con.name, kind);
    // Solver targets live in the solver data.
    if !matches!(
        constraint.kind,
        ConstraintKind::Kinematic(_) | ConstraintKind::SplineIk(_)
    )
        && let Some(target) = names.object_opt(con.target.as_deref())?
    {
        constraint.targets.push(ConstraintTarget {
            object: Some(target),
            subtarget: con.subtarget.clone(),
        });
    }
    Ok(constraint)
}

fn parse_parent(parent: &ParentData, names: &Names) -> Result<Parent, DataLoadError> {
    let kind = match parent.parent_type.as_str() {
        "object" => ParentKind::Object,
        "armature" => ParentKind::Armature,
        "vertex" => ParentKind::Vertex,
        "vertex3" => ParentKind::Vertex3,
        "bone" => ParentKind::Bone(parent.bone.clone().unwrap_or_default()),
        other => return Err(DataLoadError::UnknownParentType(other.to_string())),
    };
    Ok(Parent {
        object: names.object(&parent.object)?,
        kind,
    })
}

/// Name lookup tables filled in the registration phase.
#[derive(Default)]
struct Names {
    objects: HashMap<String, ObjectId>,
    materials: HashMap<String, MaterialId>,
    textures: HashMap<String, TextureId>,
}

impl Names {
    fn object(&self, name: &str) -> Result<ObjectId, DataLoadError> {
        self.objects
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnknownObjectRef(name.to_string()))
    }

    fn object_opt(&self, name: Option<&str>) -> Result<Option<ObjectId>, DataLoadError> {
        name.map(|name| self.object(name)).transpose()
    }

    fn material(&self, name: &str) -> Result<MaterialId, DataLoadError> {
        self.materials
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnknownMaterialRef(name.to_string()))
    }

    fn texture(&self, name: &str) -> Result<TextureId, DataLoadError> {
        self.textures
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnknownTextureRef(name.to_string()))
    }
}

fn data_kind(ob: &ObjectData, names: &Names) -> Result<Option<DataKind>, DataLoadError> {
    let curve = || -> Result<CurveData, DataLoadError> {
        Ok(CurveData {
            path: ob.path,
            bevel_object: names.object_opt(ob.bevel_object.as_deref())?,
            taper_object: names.object_opt(ob.taper_object.as_deref())?,
            text_on_curve: None,
        })
    };
    let kind = match ob.object_type.as_str() {
        "empty" => return Ok(None),
        "mesh" => DataKind::Mesh,
        "curve" => DataKind::Curve(curve()?),
        "font" => DataKind::Font(curve()?),
        "surface" => DataKind::Surface,
        "metaball" => DataKind::MetaBall,
        "lattice" => DataKind::Lattice,
        "armature" => DataKind::Armature,
        "lamp" => DataKind::Lamp(Default::default()),
        "camera" => DataKind::Camera(CameraData {
            dof_object: names.object_opt(ob.dof_object.as_deref())?,
        }),
        other => return Err(DataLoadError::UnknownObjectType(other.to_string())),
    };
    Ok(Some(kind))
}

fn build_scene(data: SceneData) -> Result<Scene, DataLoadError> {
    let mut scene = Scene::new(&data.name);
    let mut names = Names::default();
    scene.anim = anim(data.animated);

    // Phase 1: Register textures and materials
    for tex in &data.textures {
        let id = scene.add_texture(Texture {
            name: tex.name.clone(),
            anim: anim(tex.animated),
            node_tree: None,
        });
        names.textures.insert(tex.name.clone(), id);
    }
    for ma in &data.materials {
        let textures = ma
            .textures
            .iter()
            .map(|name| names.texture(name).map(Some))
            .collect::<Result<Vec<_>, _>>()?;
        let id = scene.add_material(Material {
            name: ma.name.clone(),
            anim: anim(ma.animated),
            textures,
            node_tree: None,
        });
        names.materials.insert(ma.name.clone(), id);
    }

    // Phase 2: Register every object so references may point forward
    for ob in &data.objects {
        if names.objects.contains_key(&ob.name) {
            return Err(DataLoadError::DuplicateObject(ob.name.clone()));
        }
        let id = scene.add_object(Object::new(&ob.name));
        names.objects.insert(ob.name.clone(), id);
    }

    // Phase 3: Resolve data, parents, constraints, modifiers and materials
    for ob in &data.objects {
        let id = names.object(&ob.name)?;
        let data_id = data_kind(ob, &names)
            ?.map(|kind| scene.add_data(DataBlock::new(&ob.name, kind)));
        let parent = ob.parent.as_ref().map(|p| parse_parent(p, &names)).transpose()?;
        let constraints = ob
            .constraints
            .iter()
            .map(|con| build_constraint(con, &names))
            .collect::<Result<Vec<_>, _>>()?;
        let modifiers = ob
            .modifiers
            .iter()
            .map(|md| -> Result<Modifier, DataLoadError> {
                Ok(Modifier {
                    object: names.object_opt(md.object.as_deref())?,
                    bone: md.bone.clone(),
                    ..Modifier::new(&md.name, &md.modifier_type)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let materials = ob
            .materials
            .iter()
            .map(|name| names.material(name).map(Some))
            .collect::<Result<Vec<_>, _>>()?;
        let pose = if ob.object_type == "armature" {
            let mut channels = Vec::with_capacity(ob.bones.len());
            for bone in &ob.bones {
                let mut pchan = PoseChannel::new(&bone.name, bone.parent.as_deref());
                pchan.constraints = bone
                    .constraints
                    .iter()
                    .map(|con| build_constraint(con, &names))
                    .collect::<Result<Vec<_>, _>>()?;
                channels.push(pchan);
            }
            Some(Pose { channels })
        } else {
            None
        };

        let Some(object) = scene.object_mut(id) else {
            return Err(DataLoadError::UnknownObjectRef(ob.name.clone()));
        };
        object.data = data_id;
        object.parent = parent;
        object.anim = anim(ob.animated);
        object.constraints = constraints;
        object.modifiers = modifiers;
        object.materials = materials;
        object.pose = pose;
    }

    scene.camera = names.object_opt(data.camera.as_deref())?;

    tracing::debug!(
        scene = %scene.name,
        objects = names.objects.len(),
        materials = names.materials.len(),
        "scene loaded"
    );
    Ok(scene)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ObjectKind;

    #[test]
    fn load_empty_json() {
        let scene = load_scene_json("{}").unwrap();
        assert_eq!(scene.name, "Scene");
        assert!(scene.bases().is_empty());
    }

    #[test]
    fn load_objects_with_kinds() {
        let json = r#"{
            "objects": [
                {"name": "Empty"},
                {"name": "Cube", "type": "mesh"},
                {"name": "Rig", "type": "armature", "bones": [{"name": "root"}]}
            ]
        }"#;
        let scene = load_scene_json(json).unwrap();
        let kinds: Vec<ObjectKind> = scene.bases()
            .iter()
            .map(|&id| scene.object_kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![ObjectKind::Empty, ObjectKind::Mesh, ObjectKind::Armature]
        );
        let rig = scene.object_by_name("Rig").unwrap();
        assert!(scene.pose_channel(rig, "root").is_ok());
    }

    #[test]
    fn forward_references_resolve() {
        let json = r#"{
            "objects": [
                {"name": "Child", "parent": {"object": "Rig", "type": "bone", "bone": "hand"}},
                {"name": "Rig", "type": "armature", "bones": [{"name": "hand"}]}
            ]
        }"#;
        let scene = load_scene_json(json).unwrap();
        let child = scene.object(scene.object_by_name("Child").unwrap()).unwrap();
        let parent = child.parent.as_ref().unwrap();
        assert_eq!(parent.object, scene.object_by_name("Rig").unwrap());
        assert_eq!(parent.kind, ParentKind::Bone("hand".into()));
    }

    #[test]
    fn constraints_and_ik_targets() {
        let json = r#"{
            "objects": [
                {"name": "Target"},
                {"name": "Owner", "constraints": [
                    {"name": "Copy", "type": "copy_location", "target": "Target"},
                    {"name": "Odd", "type": "made_up"}
                ]},
                {"name": "Rig", "type": "armature", "bones": [
                    {"name": "upper"},
                    {"name": "lower", "parent": "upper", "constraints": [
                        {"name": "IK", "type": "ik", "target": "Target", "chain_len": 2}
                    ]}
                ]}
            ]
        }"#;
        let scene = load_scene_json(json).unwrap();
        let target = scene.object_by_name("Target").unwrap();
        let owner = scene.object(scene.object_by_name("Owner").unwrap()).unwrap();
        assert_eq!(owner.constraints[0].targets[0].object, Some(target));
        assert!(matches!(owner.constraints[1].kind, ConstraintKind::Unknown));

        let rig = scene.object_by_name("Rig").unwrap();
        let lower = scene.pose_channel(rig, "lower").unwrap();
        let ConstraintKind::Kinematic(ik) = &lower.constraints[0].kind else {
            panic!("expected an IK constraint");
        };
        assert_eq!(ik.target, Some(target));
        assert_eq!(ik.chain_len, 2);
        assert!(lower.constraints[0].targets.is_empty());
    }

    #[test]
    fn materials_and_modifiers() {
        let json = r#"{
            "textures": [{"name": "Noise", "animated": true}],
            "materials": [{"name": "Steel", "textures": ["Noise"]}],
            "objects": [
                {"name": "Rig", "type": "armature"},
                {"name": "Body", "type": "mesh", "materials": ["Steel"],
                 "modifiers": [{"name": "Armature", "type": "Armature", "object": "Rig"}]}
            ]
        }"#;
        let scene = load_scene_json(json).unwrap();
        let body = scene.object_by_name("Body").unwrap();
        assert_eq!(scene.object_materials(body).len(), 1);
        let ob = scene.object(body).unwrap();
        assert_eq!(ob.modifiers[0].type_name, "Armature");
        assert_eq!(ob.modifiers[0].object, scene.object_by_name("Rig"));
    }

    #[test]
    fn load_unknown_object_fails() {
        let json = r#"{"objects": [{"name": "Child", "parent": {"object": "Nobody"}}]}"#;
        assert!(matches!(
            load_scene_json(json).unwrap_err(),
            DataLoadError::UnknownObjectRef(name) if name == "Nobody"
        ));
    }

    #[test]
    fn load_unknown_material_fails() {
        let json = r#"{"objects": [{"name": "Cube", "type": "mesh", "materials": ["Missing"]}]}"#;
        assert!(matches!(
            load_scene_json(json).unwrap_err(),
            DataLoadError::UnknownMaterialRef(_)
        ));
    }

    #[test]
    fn load_unknown_types_fail() {
        let json = r#"{"objects": [{"name": "Thing", "type": "teapot"}]}"#;
        assert!(matches!(
            load_scene_json(json).unwrap_err(),
            DataLoadError::UnknownObjectType(_)
        ));
        let json = r#"{"objects": [
            {"name": "A"},
            {"name": "B", "parent": {"object": "A", "type": "glue"}}
        ]}"#;
        assert!(matches!(
            load_scene_json(json).unwrap_err(),
            DataLoadError::UnknownParentType(_)
        ));
    }

    #[test]
    fn load_duplicate_object_fails() {
        let json = r#"{"objects": [{"name": "A"}, {"name": "A"}]}"#;
        assert!(matches!(
            load_scene_json(json).unwrap_err(),
            DataLoadError::DuplicateObject(_)
        ));
    }

    #[test]
    fn load_invalid_json_fails() {
        let result = load_scene_json("not valid json {{{");
        assert!(matches!(result.unwrap_err(), DataLoadError::JsonParse(_)));
    }
}
