use super::{RelationBuilder, found, pose_op};
use crate::chain_map::ChainMap;
use crate::id::ObjectId;
use crate::key::{ComponentKey, ComponentKind, OperationCode, OperationKey};
use crate::relation::RelationKind;
use crate::scene::{ConstraintKind, IkData, ObjectKind, Pose, PoseChannel, Scene, SplineIkData};

impl<'a> RelationBuilder<'a> {
    /// Pose evaluation of an armature object.
    ///
    /// Solver chains are registered first so the chain map is complete before
    /// any parent-bone or constraint relation consults it.
    pub fn build_rig(&mut self, ob_id: ObjectId) {
        let scene = self.scene;
        let Some(ob) = found(scene.object(ob_id), "build_rig") else {
            return;
        };

        let init_key = pose_op(ob_id, OperationCode::PoseInit);
        let flush_key = pose_op(ob_id, OperationCode::PoseDone);
        self.add_relation(
            init_key.clone(),
            flush_key.clone(),
            RelationKind::ComponentOrder,
            "[Pose Init -> Pose Cleanup]",
        );

        if ob.anim.as_ref().is_some_and(|adt| adt.is_animated()) {
            self.add_relation(
                ComponentKey::new(ob_id, ComponentKind::Animation),
                init_key.clone(),
                RelationKind::Operation,
                "Object Animation",
            );
        }

        let Some(pose) = &ob.pose else {
            tracing::warn!("armature object '{}' has no pose", ob.name);
            return;
        };

        // -- Solvers --

        let mut chain_map = ChainMap::new();
        let mut have_solver = false;
        for pchan in &pose.channels {
            for con in &pchan.constraints {
                match &con.kind {
                    ConstraintKind::Kinematic(ik) => {
                        self.build_ik_pose(ob_id, &pchan.name, &con.name, ik, &mut chain_map);
                        have_solver = true;
                    }
                    ConstraintKind::SplineIk(data) => {
                        self.build_splineik_pose(ob_id, &pchan.name, data, &mut chain_map);
                        have_solver = true;
                    }
                    _ => {}
                }
            }
        }
        if self.config.dump_chain_map {
            tracing::debug!("rig '{}'\n{chain_map}", ob.name);
        }

        if have_solver {
            self.add_relation(
                ComponentKey::new(ob_id, ComponentKind::Transform),
                ComponentKey::new(ob_id, ComponentKind::EvalPose),
                RelationKind::Transform,
                "Local Transforms",
            );
        }

        // -- Bones --

        for pchan in &pose.channels {
            let name = pchan.name.as_str();
            let local_key = OperationKey::bone(ob_id, name, OperationCode::BoneLocal);
            let pose_key = OperationKey::bone(ob_id, name, OperationCode::BonePoseParent);
            let ready_key = OperationKey::bone(ob_id, name, OperationCode::BoneReady);
            let done_key = OperationKey::bone(ob_id, name, OperationCode::BoneDone);

            self.add_relation(
                init_key.clone(),
                local_key.clone(),
                RelationKind::Operation,
                "PoseEval Source-Bone Link",
            );
            self.add_relation(
                local_key,
                pose_key.clone(),
                RelationKind::Operation,
                "Bone Local - PoseSpace Link",
            );

            if let Some(parent) = pchan.parent.as_deref()
                && found(scene.pose_channel(ob_id, parent), "parent bone").is_some()
            {
                // Bones of one chain only wait for the parent's pre-solver state.
                let opcode = if chain_map.has_common_root(name, parent) {
                    OperationCode::BoneReady
                } else {
                    OperationCode::BoneDone
                };
                self.add_relation(
                    OperationKey::bone(ob_id, parent, opcode),
                    pose_key.clone(),
                    RelationKind::Transform,
                    "[Parent Bone -> Child Bone]",
                );
            }

            if pchan.constraints.is_empty() {
                self.add_relation(
                    pose_key,
                    ready_key.clone(),
                    RelationKind::Operation,
                    "Pose -> Ready",
                );
            } else {
                self.build_constraints(
                    ob_id.into(),
                    ComponentKind::Bone,
                    Some(name),
                    &pchan.constraints,
                    Some(&chain_map),
                );
                let constraints_key = OperationKey::bone(
                    ob_id,
                    name,
                    OperationCode::BoneConstraints,
                );
                self.add_relation(
                    pose_key,
                    constraints_key.clone(),
                    RelationKind::Operation,
                    "Constraints Stack",
                );
                self.add_relation(
                    constraints_key,
                    ready_key.clone(),
                    RelationKind::Operation,
                    "Constraints -> Ready",
                );
            }

            // Solver chains add their own solver -> Done relation on top of this.
            self.add_relation(
                ready_key,
                done_key.clone(),
                RelationKind::Operation,
                "Ready -> Done",
            );
            self.add_relation(
                done_key,
                flush_key.clone(),
                RelationKind::Operation,
                "PoseEval Result-Bone Link",
            );
        }
    }

    /// Relations of one IK solver, keyed by its chain root.
    pub fn build_ik_pose(
        &mut self,
        ob_id: ObjectId,
        bone: &str,
        label: &str,
        ik: &IkData,
        chain_map: &mut ChainMap,
    ) {
        let scene = self.scene;
        let Some(pose) = self.pose_of(ob_id) else {
            return;
        };
        let Some(pchan) = found(scene.pose_channel(ob_id, bone), "build_ik_pose") else {
            return;
        };

        let start = if ik.use_tip {
            Some(pchan)
        } else {
            self.parent_channel(pose, pchan)
        };
        let chain = self.walk_chain(pose, start, ik.chain_len);
        let root = chain.last().map_or(bone, |c| c.name.as_str());

        let solver_key = OperationKey::in_component(
            ob_id,
            ComponentKind::EvalPose,
            root,
            OperationCode::PoseIkSolver,
        );
        let pose_key = ComponentKey::new(ob_id, ComponentKind::EvalPose);

        self.add_relation(
            OperationKey::bone(ob_id, bone, OperationCode::BoneReady),
            solver_key.clone(),
            RelationKind::Transform,
            "IK Solver Owner",
        );

        // Targets depend on the whole pose until partial results are tracked.
        if let Some(target) = ik.target {
            let subtarget = ik.subtarget.as_deref().filter(|s| !s.is_empty());
            match subtarget {
                Some(sub) if scene.object_kind(target) == ObjectKind::Armature => {
                    let known = found(scene.pose_channel(target, sub), "IK target bone").is_some();
                    if known && target != ob_id {
                        self.add_relation(
                            ComponentKey::bone(target, sub),
                            pose_key,
                            RelationKind::Transform,
                            label,
                        );
                    } else if known {
                        self.add_relation(
                            OperationKey::bone(ob_id, sub, OperationCode::BoneDone),
                            solver_key.clone(),
                            RelationKind::Transform,
                            label,
                        );
                    }
                }
                _ => {
                    self.add_relation(
                        ComponentKey::new(target, ComponentKind::Transform),
                        pose_key,
                        RelationKind::Transform,
                        label,
                    );
                }
            }
        }
        chain_map.add_bone(bone, root);

        if let Some(pole) = ik.pole_target {
            let subtarget = ik.pole_subtarget.as_deref().filter(|s| !s.is_empty());
            match subtarget {
                Some(sub) if scene.object_kind(pole) == ObjectKind::Armature => {
                    if found(scene.pose_channel(pole, sub), "IK pole bone").is_some() {
                        self.add_relation(
                            ComponentKey::bone(pole, sub),
                            solver_key.clone(),
                            RelationKind::Transform,
                            label,
                        );
                    }
                }
                _ => {
                    self.add_relation(
                        ComponentKey::new(pole, ComponentKind::Transform),
                        solver_key.clone(),
                        RelationKind::Transform,
                        label,
                    );
                }
            }
        }

        for link in &chain {
            if link.name != bone {
                self.add_relation(
                    OperationKey::bone(ob_id, &link.name, OperationCode::BoneReady),
                    solver_key.clone(),
                    RelationKind::Transform,
                    "IK Chain Parent",
                );
            }
            self.add_relation(
                solver_key.clone(),
                OperationKey::bone(ob_id, &link.name, OperationCode::BoneDone),
                RelationKind::Transform,
                "IK Solver Result",
            );
            chain_map.add_bone(&link.name, root);
        }

        self.add_relation(
            solver_key,
            pose_op(ob_id, OperationCode::PoseDone),
            RelationKind::Operation,
            "PoseEval Result-Bone Link",
        );
    }

    /// Relations of one spline-IK solver. The chain always includes the
    /// owning bone.
    pub fn build_splineik_pose(
        &mut self,
        ob_id: ObjectId,
        bone: &str,
        data: &SplineIkData,
        chain_map: &mut ChainMap,
    ) {
        let scene = self.scene;
        let Some(pose) = self.pose_of(ob_id) else {
            return;
        };
        let Some(pchan) = found(scene.pose_channel(ob_id, bone), "build_splineik_pose") else {
            return;
        };

        let chain = self.walk_chain(pose, Some(pchan), data.chain_len);
        let root = chain.last().map_or(bone, |c| c.name.as_str());
        let solver_key = OperationKey::in_component(
            ob_id,
            ComponentKind::EvalPose,
            root,
            OperationCode::PoseSplineIkSolver,
        );

        self.add_relation(
            OperationKey::bone(ob_id, bone, OperationCode::BoneReady),
            solver_key.clone(),
            RelationKind::Transform,
            "Spline IK Solver Owner",
        );

        // Needs the curve path; depends on the whole geometry for now.
        if let Some(target) = data.target {
            self.add_relation(
                ComponentKey::new(target, ComponentKind::Geometry),
                ComponentKey::new(ob_id, ComponentKind::EvalPose),
                RelationKind::Transform,
                "[Curve.Path -> Spline IK] DepsRel",
            );
        }

        for link in &chain {
            if link.name != bone {
                self.add_relation(
                    OperationKey::bone(ob_id, &link.name, OperationCode::BoneReady),
                    solver_key.clone(),
                    RelationKind::Transform,
                    "Spline IK Solver Update",
                );
            }
            self.add_relation(
                solver_key.clone(),
                OperationKey::bone(ob_id, &link.name, OperationCode::BoneDone),
                RelationKind::Transform,
                "Spline IK Solver Result",
            );
            chain_map.add_bone(&link.name, root);
        }

        self.add_relation(
            solver_key,
            pose_op(ob_id, OperationCode::PoseDone),
            RelationKind::Operation,
            "PoseEval Result-Bone Link",
        );
    }

    // -----------------------------------------------------------------------
    // Chain walking
    // -----------------------------------------------------------------------

    fn pose_of(&self, ob_id: ObjectId) -> Option<&'a Pose> {
        let scene: &'a Scene = self.scene;
        let ob = found(scene.object(ob_id), "pose lookup")?;
        let pose = ob.pose.as_ref();
        if pose.is_none() {
            tracing::warn!("object '{}' has no pose", ob.name);
        }
        pose
    }

    fn parent_channel<'p>(&self, pose: &'p Pose, pchan: &PoseChannel) -> Option<&'p PoseChannel> {
        let parent = pchan.parent.as_deref()?;
        let found = pose.channel(parent);
        if found.is_none() {
            tracing::warn!(
                "parent bone '{parent}' of '{}' not found, chain ends",
                pchan.name
            );
        }
        found
    }

    /// Bones from `start` towards the root: at most `chain_len` of them
    /// (0 means up to the root), never more than the configured cap.
    fn walk_chain<'p>(
        &self,
        pose: &'p Pose,
        start: Option<&'p PoseChannel>,
        chain_len: usize,
    ) -> Vec<&'p PoseChannel> {
        let cap = self.config.max_chain_links.max(1);
        let limit = if chain_len == 0 { cap } else { chain_len.min(cap) };

        let mut chain = Vec::new();
        let mut current = start;
        while let Some(pchan) = current {
            chain.push(pchan);
            if chain.len() >= limit {
                break;
            }
            current = self.parent_channel(pose, pchan);
        }
        chain
    }
}
