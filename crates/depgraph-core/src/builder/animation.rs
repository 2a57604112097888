use super::{RelationBuilder, found, transform_op};
use crate::id::IdRef;
use crate::key::{
    ComponentKey, ComponentKind, OperationCode, OperationKey, RnaPathKey, TimeSourceKey,
};
use crate::path::{self, BONES, KEY_BLOCKS, MODIFIERS, POSE_BONES};
use crate::relation::RelationKind;
use crate::scene::{DataKind, FCurve};

/// Operation evaluating one driver F-curve.
pub(crate) fn driver_key(id: IdRef, fcu: &FCurve) -> OperationKey {
    OperationKey::named(
        id,
        ComponentKind::Parameters,
        OperationCode::Driver,
        &path::fcurve_id_name(&fcu.rna_path, fcu.array_index),
    )
}

impl RelationBuilder<'_> {
    /// Animation and drivers of any entity. No-op without animation data.
    pub fn build_animdata(&mut self, id: IdRef) {
        let scene = self.scene;
        let Some(adt) = scene.anim_data(id) else {
            return;
        };
        let adt_key = ComponentKey::new(id, ComponentKind::Animation);

        if adt.is_animated() {
            self.add_relation(
                TimeSourceKey,
                adt_key.clone(),
                RelationKind::Time,
                "[TimeSrc -> Animation]",
            );
        }

        for fcu in &adt.drivers {
            self.build_driver(id, fcu);

            // Drivers evaluate after the entity's own animation.
            if adt.is_animated() {
                self.add_relation(
                    adt_key.clone(),
                    driver_key(id, fcu),
                    RelationKind::Operation,
                    "[AnimData Before Drivers]",
                );
            }
        }
    }

    /// Relations of one driver: into the value it drives, and from every
    /// variable target into the driver.
    ///
    /// Both directions are resolved by literal substring matches on property
    /// paths; see [`crate::path`].
    pub fn build_driver(&mut self, id: IdRef, fcu: &FCurve) {
        let scene = self.scene;
        let Some(driver) = &fcu.driver else {
            tracing::warn!("F-curve '{}' on {id:?} has no driver", fcu.rna_path);
            return;
        };
        let driver_key = driver_key(id, fcu);
        let rna_path = fcu.rna_path.as_str();

        // -- Driver -> driven value --

        if path::mentions(rna_path, POSE_BONES) {
            let bone = path::quoted_substring(rna_path, POSE_BONES)
                .zip(id.as_object())
                .filter(|&(bone, ob)| scene.pose_channel(ob, bone).is_ok());
            match bone {
                Some((bone, ob)) => self.add_relation(
                    driver_key.clone(),
                    OperationKey::bone(ob, bone, OperationCode::BoneLocal),
                    RelationKind::Driver,
                    "[Driver -> Bone]",
                ),
                None => tracing::warn!("couldn't find bone name for driver path '{rna_path}'"),
            }
        } else if let IdRef::Data(data) = id
            && scene
                .data(data)
                .is_ok_and(|d| matches!(d.kind, DataKind::Armature))
            && path::mentions(rna_path, BONES)
        {
            // Armature-level bone settings affect the matching pose bone of
            // every object using this armature.
            match path::quoted_substring(rna_path, BONES) {
                Some(bone) => {
                    let users: Vec<_> = scene
                        .users_of_data(data)
                        .filter(|&ob| scene.pose_channel(ob, bone).is_ok())
                        .collect();
                    for ob in users {
                        self.add_relation(
                            driver_key.clone(),
                            OperationKey::bone(ob, bone, OperationCode::BoneLocal),
                            RelationKind::Driver,
                            "[Arm Bone -> Driver -> Bone]",
                        );
                    }
                }
                None => tracing::warn!(
                    "couldn't find armature bone name for driver path '{rna_path}'"
                ),
            }
        } else if let IdRef::Object(ob) = id
            && path::mentions(rna_path, MODIFIERS)
        {
            match path::quoted_substring(rna_path, MODIFIERS) {
                Some(modifier) => self.add_relation(
                    driver_key.clone(),
                    OperationKey::named(
                        ob,
                        ComponentKind::Geometry,
                        OperationCode::GeometryModifier,
                        modifier,
                    ),
                    RelationKind::Driver,
                    "[Driver -> Modifier]",
                ),
                None => tracing::warn!("couldn't find modifier name for driver path '{rna_path}'"),
            }
        } else if let IdRef::ShapeKey(key) = id
            && path::mentions(rna_path, KEY_BLOCKS)
        {
            if let Some(key) = found(scene.shape_key(key), "shape key driver") {
                self.add_relation(
                    driver_key.clone(),
                    ComponentKey::new(key.from, ComponentKind::Geometry),
                    RelationKind::Driver,
                    "[Driver -> ShapeKey Geom]",
                );
            }
        } else if let IdRef::Object(ob) = id {
            // Assume the driver affects the transform.
            self.add_relation(
                driver_key.clone(),
                transform_op(ob, OperationCode::TransformLocal),
                RelationKind::Operation,
                "[Driver -> Transform]",
            );
        }

        // -- Variable targets -> driver --

        for var in &driver.variables {
            for target in var.used_targets() {
                let Some(target_id) = target.id else {
                    continue;
                };
                let struct_ref = var.kind.is_struct_ref();

                match target.bone.as_deref() {
                    Some(bone) if struct_ref && !bone.is_empty() => {
                        let Some(ob) = target_id.as_object() else {
                            tracing::warn!("bone target '{bone}' on non-object {target_id:?}");
                            continue;
                        };
                        if found(scene.pose_channel(ob, bone), "driver bone target").is_some() {
                            self.add_relation(
                                OperationKey::bone(ob, bone, OperationCode::BoneDone),
                                driver_key.clone(),
                                RelationKind::DriverTarget,
                                "[Bone Target -> Driver]",
                            );
                        }
                        continue;
                    }
                    _ => {}
                }

                if struct_ref {
                    self.add_relation(
                        OperationKey::new(
                            target_id,
                            ComponentKind::Transform,
                            OperationCode::TransformFinal,
                        ),
                        driver_key.clone(),
                        RelationKind::DriverTarget,
                        "[Target -> Driver]",
                    );
                    continue;
                }

                let target_path = target.rna_path.as_deref().unwrap_or("");
                if path::mentions(target_path, POSE_BONES) {
                    // Local bone transforms must not wait for the whole pose.
                    let bone = path::quoted_substring(target_path, POSE_BONES)
                        .zip(target_id.as_object())
                        .filter(|&(bone, ob)| scene.pose_channel(ob, bone).is_ok());
                    match bone {
                        Some((bone, ob)) => self.add_relation(
                            OperationKey::bone(ob, bone, OperationCode::BoneLocal),
                            driver_key.clone(),
                            RelationKind::Driver,
                            "[RNA Bone -> Driver]",
                        ),
                        None => tracing::warn!(
                            "couldn't find bone name for driver target path '{target_path}'"
                        ),
                    }
                } else {
                    self.add_relation(
                        RnaPathKey::new(target_id, target_path),
                        driver_key.clone(),
                        RelationKind::DriverTarget,
                        "[RNA Target -> Driver]",
                    );
                }
            }
        }
    }
}
