use super::{RelationBuilder, found, transform_op};
use crate::chain_map::ChainMap;
use crate::id::IdRef;
use crate::key::{ComponentKey, ComponentKind, OperationCode, OperationKey};
use crate::relation::RelationKind;
use crate::scene::{Constraint, ConstraintKind, ObjectKind};

impl RelationBuilder<'_> {
    /// Relations from every constraint target into the constraint-stack
    /// operation of one component.
    ///
    /// `bone` names the pose bone when `component` is [`ComponentKind::Bone`].
    /// `chain_map` is only available while building a rig; without it no two
    /// bones share a chain root.
    pub fn build_constraints(
        &mut self,
        id: IdRef,
        component: ComponentKind,
        bone: Option<&str>,
        constraints: &[Constraint],
        chain_map: Option<&ChainMap>,
    ) {
        let opcode = if component == ComponentKind::Bone {
            OperationCode::BoneConstraints
        } else {
            OperationCode::TransformConstraints
        };
        let stack_key = match bone {
            Some(bone) => OperationKey::in_component(id, component, bone, opcode),
            None => OperationKey::new(id, component, opcode),
        };

        for con in constraints {
            match &con.kind {
                ConstraintKind::Unknown => continue,

                // Camera tracking does not use targets.
                ConstraintKind::FollowTrack(data) => {
                    if let Some(depth) = data.depth_object {
                        self.add_relation(
                            ComponentKey::new(depth, ComponentKind::Transform),
                            stack_key.clone(),
                            RelationKind::Transform,
                            &con.name,
                        );
                    }
                    let has_track = data.track.as_deref().is_some_and(|t| !t.is_empty());
                    if (data.has_clip || data.use_active_clip) && has_track {
                        self.add_camera_relation(&stack_key, &con.name);
                    }
                }
                ConstraintKind::CameraSolver => {}
                ConstraintKind::ObjectSolver => self.add_camera_relation(&stack_key, &con.name),

                _ => self.build_constraint_targets(id, component, bone, con, &stack_key, chain_map),
            }
        }
    }

    fn add_camera_relation(&mut self, stack_key: &OperationKey, label: &str) {
        if let Some(camera) = self.scene.camera {
            self.add_relation(
                ComponentKey::new(camera, ComponentKind::Transform),
                stack_key.clone(),
                RelationKind::Transform,
                label,
            );
        }
    }

    fn build_constraint_targets(
        &mut self,
        id: IdRef,
        component: ComponentKind,
        bone: Option<&str>,
        con: &Constraint,
        stack_key: &OperationKey,
        chain_map: Option<&ChainMap>,
    ) {
        let scene = self.scene;
        let label = con.name.as_str();

        for target in &con.targets {
            let Some(tar) = target.object else {
                continue;
            };
            let subtarget = target.subtarget.as_deref().filter(|s| !s.is_empty());
            let tar_kind = scene.object_kind(tar);
            let is_self = IdRef::Object(tar) == id;

            match (&con.kind, tar_kind, subtarget) {
                // Solved on pose level by the rig builder.
                (ConstraintKind::Kinematic(_) | ConstraintKind::SplineIk(_), _, _) => {}

                (ConstraintKind::FollowPath | ConstraintKind::ClampTo, _, _) => {
                    self.add_relation(
                        ComponentKey::new(tar, ComponentKind::Geometry),
                        stack_key.clone(),
                        RelationKind::GeometryEval,
                        label,
                    );
                }

                (_, ObjectKind::Armature, Some(sub)) => {
                    if found(scene.pose_channel(tar, sub), "constraint bone target").is_none() {
                        continue;
                    }
                    // Within one armature, a bone sharing a chain root with the
                    // target can only wait for its pre-solver state.
                    let common_root = is_self
                        && chain_map
                            .zip(bone)
                            .is_some_and(|(map, bone)| map.has_common_root(bone, sub));
                    let opcode = if common_root {
                        OperationCode::BoneReady
                    } else {
                        OperationCode::BoneDone
                    };
                    self.add_relation(
                        OperationKey::bone(tar, sub, opcode),
                        stack_key.clone(),
                        RelationKind::Transform,
                        label,
                    );
                }

                // Vertex group.
                (_, ObjectKind::Mesh | ObjectKind::Lattice, Some(_)) => {
                    self.add_relation(
                        ComponentKey::new(tar, ComponentKind::Geometry),
                        stack_key.clone(),
                        RelationKind::GeometryEval,
                        label,
                    );
                }

                (ConstraintKind::Shrinkwrap, _, _) => {
                    self.add_relation(
                        ComponentKey::new(tar, ComponentKind::Geometry),
                        stack_key.clone(),
                        RelationKind::Transform,
                        label,
                    );
                    self.add_relation(
                        ComponentKey::new(tar, ComponentKind::Transform),
                        stack_key.clone(),
                        RelationKind::Transform,
                        label,
                    );
                }

                _ => {
                    // A bone constraint targeting its own armature reads the
                    // object transform; any other self target reads the
                    // pre-constraint transform.
                    let opcode = if !is_self {
                        OperationCode::TransformFinal
                    } else if tar_kind == ObjectKind::Armature && component == ComponentKind::Bone {
                        OperationCode::TransformFinal
                    } else {
                        OperationCode::TransformLocal
                    };
                    self.add_relation(
                        transform_op(tar, opcode),
                        stack_key.clone(),
                        RelationKind::Transform,
                        label,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectId;
    use crate::key::NodeKey;
    use crate::modifier::ModifierRegistry;
    use crate::relation::RelationGraph;
    use crate::scene::*;
    use crate::test_utils::*;

    fn build_object_constraints(
        scene: &Scene,
        ob: ObjectId,
        constraints: &[Constraint],
    ) -> RelationGraph {
        let registry = ModifierRegistry::new();
        let mut graph = RelationGraph::new();
        RelationBuilder::new(scene, &mut graph, &registry).build_constraints(
            ob.into(),
            ComponentKind::Transform,
            None,
            constraints,
            None,
        );
        graph
    }

    fn stack(ob: ObjectId) -> NodeKey {
        transform_op(ob, OperationCode::TransformConstraints).into()
    }

    #[test]
    fn generic_target_reads_final_transform() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let target = add_empty(&mut scene, "Target");
        let cons = [Constraint::new("Track To", ConstraintKind::TrackTo).with_target(target, None)];
        let graph = build_object_constraints(&scene, ob, &cons);
        let rel = graph
            .find(&transform_op(target, OperationCode::TransformFinal).into(), &stack(ob))
            .unwrap();
        assert_eq!(rel.label, "Track To");
        assert_eq!(rel.kind, RelationKind::Transform);
    }

    #[test]
    fn self_target_on_object_reads_local_transform() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let cons = [Constraint::new("Self", ConstraintKind::CopyRotation).with_target(ob, None)];
        let graph = build_object_constraints(&scene, ob, &cons);
        assert!(graph.contains(
            &transform_op(ob, OperationCode::TransformLocal).into(),
            &stack(ob)
        ));
        assert!(!graph.contains(
            &transform_op(ob, OperationCode::TransformFinal).into(),
            &stack(ob)
        ));
    }

    #[test]
    fn path_constraints_read_target_geometry() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let curve = add_object_with_data(
            &mut scene,
            "Curve",
            DataKind::Curve(CurveData::default()),
        );
        for kind in [ConstraintKind::FollowPath, ConstraintKind::ClampTo] {
            let cons = [Constraint::new("Path", kind).with_target(curve, None)];
            let graph = build_object_constraints(&scene, ob, &cons);
            let rel = graph
                .find(&ComponentKey::new(curve, ComponentKind::Geometry).into(), &stack(ob))
                .unwrap();
            assert_eq!(rel.kind, RelationKind::GeometryEval);
        }
    }

    #[test]
    fn vertex_group_target_reads_geometry() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let mesh = add_mesh(&mut scene, "Mesh");
        let cons = [
            Constraint::new("Copy Location", ConstraintKind::CopyLocation)
                .with_target(mesh, Some("Group")),
        ];
        let graph = build_object_constraints(&scene, ob, &cons);
        assert!(graph.contains(
            &ComponentKey::new(mesh, ComponentKind::Geometry).into(),
            &stack(ob)
        ));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn shrinkwrap_reads_geometry_and_transform() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let mesh = add_mesh(&mut scene, "Surface");
        let cons = [
            Constraint::new("Shrinkwrap", ConstraintKind::Shrinkwrap).with_target(mesh, None),
        ];
        let graph = build_object_constraints(&scene, ob, &cons);
        assert!(graph.contains(
            &ComponentKey::new(mesh, ComponentKind::Geometry).into(),
            &stack(ob)
        ));
        assert!(graph.contains(
            &ComponentKey::new(mesh, ComponentKind::Transform).into(),
            &stack(ob)
        ));
    }

    #[test]
    fn cross_armature_bone_target_reads_done() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let rig = add_armature(&mut scene, "Rig", &[("hand", None)]);
        let cons = [
            Constraint::new("Child Of", ConstraintKind::ChildOf).with_target(rig, Some("hand")),
        ];
        let graph = build_object_constraints(&scene, ob, &cons);
        assert!(graph.contains(
            &OperationKey::bone(rig, "hand", OperationCode::BoneDone).into(),
            &stack(ob)
        ));
    }

    #[test]
    fn unknown_bone_target_is_skipped() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let rig = add_armature(&mut scene, "Rig", &[("hand", None)]);
        let cons = [
            Constraint::new("Child Of", ConstraintKind::ChildOf).with_target(rig, Some("thumb")),
        ];
        assert!(build_object_constraints(&scene, ob, &cons).is_empty());
    }

    #[test]
    fn camera_tracking_uses_scene_camera() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let camera = add_object_with_data(
            &mut scene,
            "Camera",
            DataKind::Camera(CameraData::default()),
        );
        let depth = add_empty(&mut scene, "Depth");
        scene.camera = Some(camera);
        let camera_tf: NodeKey = ComponentKey::new(camera, ComponentKind::Transform).into();

        let solver = [Constraint::new("Object Solver", ConstraintKind::ObjectSolver)];
        assert!(build_object_constraints(&scene, ob, &solver).contains(&camera_tf, &stack(ob)));

        let no_track = [Constraint::new(
            "Follow Track",
            ConstraintKind::FollowTrack(FollowTrackData {
                has_clip: true,
                ..Default::default()
            }),
        )];
        assert!(build_object_constraints(&scene, ob, &no_track).is_empty());

        let tracked = [Constraint::new(
            "Follow Track",
            ConstraintKind::FollowTrack(FollowTrackData {
                use_active_clip: true,
                track: Some("Track.001".into()),
                depth_object: Some(depth),
                ..Default::default()
            }),
        )];
        let graph = build_object_constraints(&scene, ob, &tracked);
        assert!(graph.contains(&camera_tf, &stack(ob)));
        assert!(graph.contains(
            &ComponentKey::new(depth, ComponentKind::Transform).into(),
            &stack(ob)
        ));
    }

    #[test]
    fn unknown_and_ik_constraints_add_nothing() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Owner");
        let target = add_empty(&mut scene, "Target");
        let cons = [
            Constraint::new("Unknown", ConstraintKind::Unknown).with_target(target, None),
            Constraint::new("IK", ConstraintKind::Kinematic(IkData::default()))
                .with_target(target, None),
        ];
        assert!(build_object_constraints(&scene, ob, &cons).is_empty());
    }

    #[test]
    fn bone_stack_key_carries_bone_name() {
        let mut scene = Scene::new("Scene");
        let rig = add_armature(&mut scene, "Rig", &[("a", None), ("b", None)]);
        let registry = ModifierRegistry::new();
        let mut graph = RelationGraph::new();
        let cons = [
            Constraint::new("Copy", ConstraintKind::CopyLocation).with_target(rig, Some("a")),
        ];
        RelationBuilder::new(&scene, &mut graph, &registry).build_constraints(
            rig.into(),
            ComponentKind::Bone,
            Some("b"),
            &cons,
            Some(&ChainMap::new()),
        );
        assert!(graph.contains(
            &OperationKey::bone(rig, "a", OperationCode::BoneDone).into(),
            &OperationKey::bone(rig, "b", OperationCode::BoneConstraints).into()
        ));
    }
}
