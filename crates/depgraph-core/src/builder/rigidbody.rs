use super::{RelationBuilder, found, transform_op};
use crate::id::IdRef;
use crate::key::{ComponentKey, ComponentKind, OperationCode, OperationKey, TimeSourceKey};
use crate::relation::RelationKind;
use crate::scene::ObjectKind;

fn world_op(opcode: OperationCode) -> OperationKey {
    OperationKey::new(IdRef::Scene, ComponentKind::Transform, opcode)
}

impl RelationBuilder<'_> {
    /// The scene's rigid-body world: rebuild and step operations, their
    /// participants and the constraint objects tying participants together.
    pub fn build_rigidbody(&mut self) {
        let scene = self.scene;
        let Some(rbw) = &scene.rigid_body_world else {
            return;
        };

        let init_key = world_op(OperationCode::RigidBodyRebuild);
        let sim_key = world_op(OperationCode::RigidBodySim);

        self.add_relation(
            init_key.clone(),
            sim_key.clone(),
            RelationKind::Operation,
            "Rigidbody [Init -> SimStep]",
        );
        self.add_relation(
            TimeSourceKey,
            init_key,
            RelationKind::Time,
            "TimeSrc -> Rigidbody Reset/Rebuild (Optional)",
        );
        self.add_relation(
            TimeSourceKey,
            sim_key.clone(),
            RelationKind::Time,
            "TimeSrc -> Rigidbody Sim Step",
        );

        // -- Participants --

        for &ob_id in &rbw.objects {
            if scene.object_kind(ob_id) != ObjectKind::Mesh {
                tracing::trace!(?ob_id, "not a mesh, skipped by rigid body world");
                continue;
            }
            let Some(ob) = found(scene.object(ob_id), "build_rigidbody") else {
                continue;
            };

            let rbo_key = transform_op(ob_id, OperationCode::TransformRigidBody);
            let trans_opcode = if ob.parent.is_some() {
                OperationCode::TransformParent
            } else {
                OperationCode::TransformLocal
            };
            let trans_key = transform_op(ob_id, trans_opcode);

            self.add_relation(
                trans_key.clone(),
                rbo_key.clone(),
                RelationKind::Operation,
                "Base Ob Transform -> RBO Sync",
            );
            self.add_relation(
                sim_key.clone(),
                rbo_key.clone(),
                RelationKind::ComponentOrder,
                "Rigidbody Sim Eval -> RBO Sync",
            );

            // Constraints run on the simulated result when there are any.
            if ob.constraints.is_empty() {
                self.add_relation(
                    rbo_key.clone(),
                    transform_op(ob_id, OperationCode::TransformFinal),
                    RelationKind::ComponentOrder,
                    "RBO Sync -> Done",
                );
                self.add_relation(
                    rbo_key,
                    transform_op(ob_id, OperationCode::ObjectUberEval),
                    RelationKind::ComponentOrder,
                    "RBO Sync -> Uber (Temp)",
                );
            } else {
                self.add_relation(
                    rbo_key,
                    transform_op(ob_id, OperationCode::TransformConstraints),
                    RelationKind::ComponentOrder,
                    "RBO Sync -> Ob Constraints",
                );
            }

            self.add_relation(
                trans_key,
                sim_key.clone(),
                RelationKind::Operation,
                "Base Ob Transform -> Rigidbody Sim Eval",
            );
        }

        // -- Constraint objects --

        for &ob_id in &rbw.constraints {
            let Some(ob) = found(scene.object(ob_id), "build_rigidbody") else {
                continue;
            };
            let Some((ob1, ob2)) = ob
                .rigid_body_constraint
                .and_then(|rbc| rbc.object1.zip(rbc.object2))
            else {
                tracing::warn!(
                    "rigid body constraint '{}' does not connect two objects",
                    ob.name
                );
                continue;
            };

            let trans_key = ComponentKey::new(ob_id, ComponentKind::Transform);
            self.add_relation(
                trans_key.clone(),
                transform_op(ob1, OperationCode::TransformRigidBody),
                RelationKind::Transform,
                "RigidBodyConstraint -> RBC.Object_1",
            );
            self.add_relation(
                trans_key.clone(),
                transform_op(ob2, OperationCode::TransformRigidBody),
                RelationKind::Transform,
                "RigidBodyConstraint -> RBC.Object_2",
            );
            self.add_relation(
                trans_key,
                sim_key.clone(),
                RelationKind::Transform,
                "RigidBodyConstraint Transform -> RB Simulation",
            );
        }
    }
}
