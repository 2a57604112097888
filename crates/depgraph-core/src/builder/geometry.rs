use super::{RelationBuilder, found};
use crate::id::{DataId, KeyId, ObjectId};
use crate::key::{ComponentKey, ComponentKind, OperationCode, OperationKey, TimeSourceKey};
use crate::modifier::{ModifierContext, NodeHandle};
use crate::path;
use crate::relation::RelationKind;
use crate::scene::{DataKind, Modifier, Object};

/// Operation of one modifier in an object's stack.
pub(crate) fn modifier_key(ob: ObjectId, name: &str) -> OperationKey {
    OperationKey::named(
        ob,
        ComponentKind::Geometry,
        OperationCode::GeometryModifier,
        name,
    )
}

/// First operation of an object's geometry evaluation.
pub(crate) fn geometry_init_key(ob: ObjectId) -> OperationKey {
    OperationKey::named(
        ob,
        ComponentKind::Geometry,
        OperationCode::Placeholder,
        "Eval Init",
    )
}

impl RelationBuilder<'_> {
    /// Geometry evaluation of one object: shared data into the object's
    /// geometry, type-specific sources, shape keys, the modifier stack and
    /// materials.
    ///
    /// Every object referencing a data block evaluates its own geometry, so
    /// the data's Geometry component feeds each user's Geometry component.
    pub fn build_obdata_geom(&mut self, ob_id: ObjectId) {
        let scene = self.scene;
        let Some(ob) = found(scene.object(ob_id), "build_obdata_geom") else {
            return;
        };
        let Some(data_id) = ob.data else {
            tracing::warn!("object '{}' has no data to evaluate", ob.name);
            return;
        };
        let Some(data) = found(scene.data(data_id), "build_obdata_geom") else {
            return;
        };

        let geom_key = ComponentKey::new(ob_id, ComponentKind::Geometry);
        let obdata_geom_key = ComponentKey::new(data_id, ComponentKind::Geometry);

        let obdata_eval_key = OperationKey::named(
            data_id,
            ComponentKind::Geometry,
            OperationCode::Placeholder,
            "Geometry Eval",
        );
        let obdata_done_key = OperationKey::named(
            data_id,
            ComponentKind::Geometry,
            OperationCode::Placeholder,
            "Eval Done",
        );
        self.add_relation(
            obdata_eval_key,
            obdata_done_key,
            RelationKind::Datablock,
            "ObData Geom Eval Done",
        );
        self.add_relation(
            obdata_geom_key,
            geom_key.clone(),
            RelationKind::Datablock,
            "Object Geometry Base Data",
        );

        match &data.kind {
            DataKind::MetaBall => {
                // The basis ("motherball") depends on every other ball of its
                // family.
                if let Some(basis) = scene.metaball_basis(ob_id)
                    && basis != ob_id
                {
                    self.add_relation(
                        geom_key.clone(),
                        ComponentKey::new(basis, ComponentKind::Geometry),
                        RelationKind::GeometryEval,
                        "Metaball Motherball",
                    );
                }
            }
            DataKind::Curve(cu) | DataKind::Font(cu) => {
                if let Some(bevel) = cu.bevel_object {
                    self.add_relation(
                        ComponentKey::new(bevel, ComponentKind::Geometry),
                        geom_key.clone(),
                        RelationKind::GeometryEval,
                        "Curve Bevel",
                    );
                }
                if let Some(taper) = cu.taper_object {
                    self.add_relation(
                        ComponentKey::new(taper, ComponentKind::Geometry),
                        geom_key.clone(),
                        RelationKind::GeometryEval,
                        "Curve Taper",
                    );
                }
                if let DataKind::Font(_) = data.kind
                    && let Some(text_on_curve) = cu.text_on_curve
                {
                    self.add_relation(
                        ComponentKey::new(text_on_curve, ComponentKind::Geometry),
                        geom_key.clone(),
                        RelationKind::GeometryEval,
                        "Text on Curve",
                    );
                }
            }
            _ => {}
        }

        if let Some(key) = data.shape_key {
            self.build_shapekeys(data_id, key);
        }

        // Modifier stack: strictly linear, starting at Eval Init.
        let modifiers = self.modifiers;
        let mut prev_key = geometry_init_key(ob_id);
        for md in &ob.modifiers {
            let mod_key = modifier_key(ob_id, &md.name);
            self.add_relation(
                prev_key,
                mod_key.clone(),
                RelationKind::GeometryEval,
                "Modifier Stack",
            );

            if let Some(relations) = modifiers.get(&md.type_name) {
                let ctx = ModifierContext {
                    scene,
                    object: ob_id,
                    modifier: md,
                };
                let mut handle = NodeHandle::new(mod_key.clone(), &mut *self.graph);
                relations.update_relations(&ctx, &mut handle);
            }

            if self.modifier_depends_on_time(ob, md) {
                self.add_relation(
                    TimeSourceKey,
                    mod_key.clone(),
                    RelationKind::Time,
                    "Time Source",
                );
            }

            prev_key = mod_key;
        }

        for material in scene.object_materials(ob_id) {
            self.build_material(material);
        }

        if !matches!(data.kind, DataKind::Armature) {
            self.add_relation(
                prev_key,
                OperationKey::new(
                    ob_id,
                    ComponentKind::Geometry,
                    OperationCode::GeometryUberEval,
                ),
                RelationKind::Operation,
                "Object Geometry UberEval",
            );
        }
    }

    /// Shape-key animation, ordered before the geometry it deforms.
    pub fn build_shapekeys(&mut self, data_id: DataId, key_id: KeyId) {
        let scene = self.scene;
        let Some(key) = found(scene.shape_key(key_id), "build_shapekeys") else {
            return;
        };

        self.build_animdata(key_id.into());

        if key.anim.as_ref().is_some_and(|adt| adt.is_animated()) {
            self.add_relation(
                ComponentKey::new(key_id, ComponentKind::Animation),
                ComponentKey::new(data_id, ComponentKind::Geometry),
                RelationKind::Operation,
                "Animation",
            );
        }
    }

    /// A modifier depends on time when its type says so, or when the owner's
    /// action or drivers animate one of its properties.
    fn modifier_depends_on_time(&self, ob: &Object, md: &Modifier) -> bool {
        if self
            .modifiers
            .get(&md.type_name)
            .is_some_and(|r| r.depends_on_time(md))
        {
            return true;
        }

        let Some(adt) = &ob.anim else {
            return false;
        };
        let pattern = path::modifier_path_pattern(&md.name);
        let action_curves = adt.action.iter().flat_map(|action| &action.curves);
        action_curves
            .chain(&adt.drivers)
            .any(|fcu| path::mentions(&fcu.rna_path, &pattern))
    }
}
