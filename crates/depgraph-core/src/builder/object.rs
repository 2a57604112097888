use super::{RelationBuilder, found, transform_op};
use crate::id::ObjectId;
use crate::key::{ComponentKey, ComponentKind, OperationCode};
use crate::relation::RelationKind;
use crate::scene::{DataKind, ObjectKind, ParentKind};

impl RelationBuilder<'_> {
    /// Transform backbone of one object plus everything hanging off it:
    /// parenting, constraints, animation, object data, particles and
    /// grease pencil.
    pub fn build_object(&mut self, ob_id: ObjectId) {
        let scene = self.scene;
        let Some(ob) = found(scene.object(ob_id), "build_object") else {
            return;
        };

        let base_op = if ob.parent.is_some() {
            OperationCode::TransformParent
        } else {
            OperationCode::TransformLocal
        };
        let base_key = transform_op(ob_id, base_op);
        let local_key = transform_op(ob_id, OperationCode::TransformLocal);
        let parent_key = transform_op(ob_id, OperationCode::TransformParent);
        let final_key = transform_op(ob_id, OperationCode::TransformFinal);
        let uber_key = transform_op(ob_id, OperationCode::ObjectUberEval);

        if ob.parent.is_some() {
            self.build_object_parent(ob_id);
            self.add_relation(
                local_key.clone(),
                parent_key,
                RelationKind::ComponentOrder,
                "[ObLocal -> ObParent]",
            );
        }

        if ob.constraints.is_empty() {
            self.add_relation(
                base_key.clone(),
                final_key.clone(),
                RelationKind::ComponentOrder,
                "Object Transform",
            );
            self.add_relation(
                base_key,
                uber_key.clone(),
                RelationKind::ComponentOrder,
                "Temp Ubereval",
            );
        } else {
            let constraint_key = transform_op(ob_id, OperationCode::TransformConstraints);
            self.build_constraints(
                ob_id.into(),
                ComponentKind::Transform,
                None,
                &ob.constraints,
                None,
            );
            self.add_relation(
                base_key,
                constraint_key.clone(),
                RelationKind::ComponentOrder,
                "[ObBase-> Constraint Stack]",
            );
            self.add_relation(
                constraint_key.clone(),
                final_key.clone(),
                RelationKind::ComponentOrder,
                "[ObConstraints -> Done]",
            );
            self.add_relation(
                constraint_key,
                uber_key.clone(),
                RelationKind::ComponentOrder,
                "Temp Ubereval",
            );
        }
        self.add_relation(
            uber_key,
            final_key,
            RelationKind::ComponentOrder,
            "Temp Ubereval",
        );

        self.build_animdata(ob_id.into());
        if ob.anim.as_ref().is_some_and(|adt| adt.is_animated()) {
            self.add_relation(
                ComponentKey::new(ob_id, ComponentKind::Animation),
                local_key,
                RelationKind::Operation,
                "Object Animation",
            );
        }

        if let Some(data_id) = ob.data {
            self.build_animdata(data_id.into());
            if let Some(data) = found(scene.data(data_id), "build_object") {
                match &data.kind {
                    DataKind::Mesh
                    | DataKind::Curve(_)
                    | DataKind::Font(_)
                    | DataKind::Surface
                    | DataKind::MetaBall
                    | DataKind::Lattice => self.build_obdata_geom(ob_id),
                    DataKind::Armature => self.build_rig(ob_id),
                    DataKind::Lamp(_) => self.build_lamp(data_id),
                    DataKind::Camera(_) => self.build_camera(data_id),
                }
            }
        }

        if !ob.particle_systems.is_empty() {
            self.build_particles(ob_id);
        }

        if let Some(gpd) = ob.grease_pencil {
            self.build_gpencil(gpd);
        }
    }

    /// Relations from an object's parent into the object's Transform
    /// component, chosen by attachment kind and parent kind.
    pub fn build_object_parent(&mut self, ob_id: ObjectId) {
        let scene = self.scene;
        let Some(ob) = found(scene.object(ob_id), "build_object_parent") else {
            return;
        };
        let Some(parent) = &ob.parent else {
            return;
        };
        if found(scene.object(parent.object), "parent of object").is_none() {
            return;
        }

        let ob_key = ComponentKey::new(ob_id, ComponentKind::Transform);
        let parent_transform = ComponentKey::new(parent.object, ComponentKind::Transform);
        let parent_geometry = ComponentKey::new(parent.object, ComponentKind::Geometry);

        match &parent.kind {
            ParentKind::Armature => {
                self.add_relation(
                    parent_transform,
                    ob_key,
                    RelationKind::Standard,
                    "Armature Deform Parent",
                );
            }
            ParentKind::Vertex | ParentKind::Vertex3 => {
                self.add_relation(
                    parent_geometry,
                    ob_key.clone(),
                    RelationKind::GeometryEval,
                    "Vertex Parent",
                );
                self.add_relation(
                    parent_transform,
                    ob_key,
                    RelationKind::Transform,
                    "Vertex Parent TFM",
                );
            }
            ParentKind::Bone(bone) => {
                if found(scene.pose_channel(parent.object, bone), "parent bone").is_none() {
                    return;
                }
                self.add_relation(
                    ComponentKey::bone(parent.object, bone),
                    ob_key,
                    RelationKind::Transform,
                    "Bone Parent",
                );
            }
            ParentKind::Object => match scene.object_kind(parent.object) {
                ObjectKind::Lattice => {
                    self.add_relation(
                        parent_transform,
                        ob_key.clone(),
                        RelationKind::Standard,
                        "Lattice Deform Parent",
                    );
                    self.add_relation(
                        parent_geometry,
                        ob_key,
                        RelationKind::Standard,
                        "Lattice Deform Parent Geom",
                    );
                }
                ObjectKind::Curve if self.follows_path(parent.object) => {
                    self.add_relation(
                        parent_geometry,
                        ob_key.clone(),
                        RelationKind::Transform,
                        "Curve Follow Parent",
                    );
                    self.add_relation(
                        parent_transform,
                        ob_key,
                        RelationKind::Transform,
                        "Curve Follow TFM",
                    );
                }
                ObjectKind::Curve => {
                    self.add_relation(
                        parent_transform,
                        ob_key,
                        RelationKind::Transform,
                        "Curve Parent",
                    );
                }
                _ => {
                    self.add_relation(parent_transform, ob_key, RelationKind::Transform, "Parent");
                }
            },
        }
    }

    /// True if `curve` is a curve object whose children follow its path.
    fn follows_path(&self, curve: ObjectId) -> bool {
        let scene = self.scene;
        scene
            .object(curve)
            .ok()
            .and_then(|ob| ob.data)
            .and_then(|data| scene.data(data).ok())
            .is_some_and(|data| matches!(&data.kind, DataKind::Curve(cu) if cu.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_relations;
    use crate::config::BuilderConfig;
    use crate::key::{NodeKey, OperationKey};
    use crate::modifier::ModifierRegistry;
    use crate::relation::RelationGraph;
    use crate::scene::*;
    use crate::test_utils::*;

    fn build(scene: &Scene) -> RelationGraph {
        build_relations(scene, &ModifierRegistry::new(), &BuilderConfig::default())
    }

    fn op(ob: ObjectId, opcode: OperationCode) -> NodeKey {
        transform_op(ob, opcode).into()
    }

    fn comp(ob: ObjectId, kind: ComponentKind) -> NodeKey {
        ComponentKey::new(ob, kind).into()
    }

    // -----------------------------------------------------------------------
    // Transform backbone
    // -----------------------------------------------------------------------

    #[test]
    fn unparented_object_goes_local_to_final() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Empty");
        let graph = build(&scene);

        assert!(graph.contains(
            &op(ob, OperationCode::TransformLocal),
            &op(ob, OperationCode::TransformFinal)
        ));
        assert!(graph.contains(
            &op(ob, OperationCode::TransformLocal),
            &op(ob, OperationCode::ObjectUberEval)
        ));
        assert!(graph.contains(
            &op(ob, OperationCode::ObjectUberEval),
            &op(ob, OperationCode::TransformFinal)
        ));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn constraints_sit_between_base_and_final() {
        let mut scene = Scene::new("Scene");
        let target = add_empty(&mut scene, "Target");
        let ob = add_empty(&mut scene, "Owner");
        scene.object_mut(ob).unwrap().constraints = vec![
            Constraint::new("Copy Location", ConstraintKind::CopyLocation)
                .with_target(target, None),
        ];
        let graph = build(&scene);

        let stack = op(ob, OperationCode::TransformConstraints);
        assert!(graph.contains(&op(ob, OperationCode::TransformLocal), &stack));
        assert!(graph.contains(&stack, &op(ob, OperationCode::TransformFinal)));
        assert!(graph.contains(&stack, &op(ob, OperationCode::ObjectUberEval)));
        assert!(graph.contains(&op(target, OperationCode::TransformFinal), &stack));
        assert!(!graph.contains(
            &op(ob, OperationCode::TransformLocal),
            &op(ob, OperationCode::TransformFinal)
        ));
    }

    #[test]
    fn animated_object_feeds_local_transform() {
        let mut scene = Scene::new("Scene");
        let ob = add_empty(&mut scene, "Empty");
        scene.object_mut(ob).unwrap().anim = Some(animated());
        let graph = build(&scene);
        assert!(graph.contains(
            &comp(ob, ComponentKind::Animation),
            &op(ob, OperationCode::TransformLocal)
        ));
    }

    // -----------------------------------------------------------------------
    // Parent policy
    // -----------------------------------------------------------------------

    #[test]
    fn plain_parent() {
        let mut scene = Scene::new("Scene");
        let parent = add_empty(&mut scene, "Parent");
        let child = add_child(&mut scene, "Child", parent, ParentKind::Object);
        let graph = build(&scene);

        let rel = graph
            .find(&comp(parent, ComponentKind::Transform), &comp(child, ComponentKind::Transform))
            .expect("parent relation");
        assert_eq!(rel.kind, RelationKind::Transform);
        assert_eq!(rel.label, "Parent");
        assert!(graph.contains(
            &op(child, OperationCode::TransformParent),
            &op(child, OperationCode::TransformFinal)
        ));
    }

    #[test]
    fn armature_deform_parent_is_standard() {
        let mut scene = Scene::new("Scene");
        let rig = add_armature(&mut scene, "Rig", &[("root", None)]);
        let child = add_child(&mut scene, "Body", rig, ParentKind::Armature);
        let graph = build(&scene);
        let rel = graph
            .find(&comp(rig, ComponentKind::Transform), &comp(child, ComponentKind::Transform))
            .unwrap();
        assert_eq!(rel.kind, RelationKind::Standard);
    }

    #[test]
    fn vertex_parent_reads_geometry_and_transform() {
        for kind in [ParentKind::Vertex, ParentKind::Vertex3] {
            let mut scene = Scene::new("Scene");
            let parent = add_mesh(&mut scene, "Mesh");
            let child = add_child(&mut scene, "Child", parent, kind);
            let graph = build(&scene);
            let child_tf = comp(child, ComponentKind::Transform);
            assert_eq!(
                graph.find(&comp(parent, ComponentKind::Geometry), &child_tf).unwrap().kind,
                RelationKind::GeometryEval
            );
            assert_eq!(
                graph.find(&comp(parent, ComponentKind::Transform), &child_tf).unwrap().kind,
                RelationKind::Transform
            );
        }
    }

    #[test]
    fn bone_parent_reads_bone_component() {
        let mut scene = Scene::new("Scene");
        let rig = add_armature(&mut scene, "Rig", &[("root", None), ("hand", Some("root"))]);
        let child = add_child(&mut scene, "Sword", rig, ParentKind::Bone("hand".into()));
        let graph = build(&scene);
        assert!(graph.contains(
            &ComponentKey::bone(rig, "hand").into(),
            &comp(child, ComponentKind::Transform)
        ));
        assert!(!graph.contains(
            &comp(rig, ComponentKind::Transform),
            &comp(child, ComponentKind::Transform)
        ));
    }

    #[test]
    fn lattice_parent_reads_geometry_too() {
        let mut scene = Scene::new("Scene");
        let lattice = add_object_with_data(&mut scene, "Lattice", DataKind::Lattice);
        let child = add_child(&mut scene, "Child", lattice, ParentKind::Object);
        let graph = build(&scene);
        let child_tf = comp(child, ComponentKind::Transform);
        assert!(graph.contains(&comp(lattice, ComponentKind::Transform), &child_tf));
        assert!(graph.contains(&comp(lattice, ComponentKind::Geometry), &child_tf));
    }

    #[test]
    fn curve_parent_depends_on_path_flag() {
        for follow in [false, true] {
            let mut scene = Scene::new("Scene");
            let curve = add_object_with_data(
                &mut scene,
                "Curve",
                DataKind::Curve(CurveData {
                    path: follow,
                    ..Default::default()
                }),
            );
            let child = add_child(&mut scene, "Child", curve, ParentKind::Object);
            let graph = build(&scene);
            let child_tf = comp(child, ComponentKind::Transform);
            assert!(graph.contains(&comp(curve, ComponentKind::Transform), &child_tf));
            assert_eq!(
                graph.contains(&comp(curve, ComponentKind::Geometry), &child_tf),
                follow
            );
        }
    }

    // -----------------------------------------------------------------------
    // Data dispatch
    // -----------------------------------------------------------------------

    #[test]
    fn camera_dof_object() {
        let mut scene = Scene::new("Scene");
        let focus = add_empty(&mut scene, "Focus");
        let cam = add_object_with_data(
            &mut scene,
            "Camera",
            DataKind::Camera(CameraData {
                dof_object: Some(focus),
            }),
        );
        let data = scene.object(cam).unwrap().data.unwrap();
        let graph = build(&scene);
        assert!(graph.contains(
            &comp(focus, ComponentKind::Transform),
            &ComponentKey::new(data, ComponentKind::Parameters).into()
        ));
    }

    #[test]
    fn mesh_gets_geometry_uber_eval() {
        let mut scene = Scene::new("Scene");
        let ob = add_mesh(&mut scene, "Cube");
        let graph = build(&scene);
        let init: NodeKey = OperationKey::named(
            ob,
            ComponentKind::Geometry,
            OperationCode::Placeholder,
            "Eval Init",
        )
        .into();
        let uber: NodeKey = OperationKey::new(
            ob,
            ComponentKind::Geometry,
            OperationCode::GeometryUberEval,
        )
        .into();
        assert!(graph.contains(&init, &uber));
    }
}
