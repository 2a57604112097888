use super::{RelationBuilder, found};
use crate::id::ObjectId;
use crate::key::{ComponentKey, ComponentKind, OperationCode, OperationKey};
use crate::relation::RelationKind;
use crate::scene::ParticleSettings;

/// Evaluation of one particle system, named after the system.
pub(crate) fn psys_key(ob: ObjectId, psys: &str) -> OperationKey {
    OperationKey::named(
        ob,
        ComponentKind::EvalParticles,
        OperationCode::ParticleSystemEval,
        psys,
    )
}

impl RelationBuilder<'_> {
    /// Particle systems of an object: settings animation, force-field
    /// effectors and boid rule targets.
    pub fn build_particles(&mut self, ob_id: ObjectId) {
        let scene = self.scene;
        let Some(ob) = found(scene.object(ob_id), "build_particles") else {
            return;
        };

        for psys in &ob.particle_systems {
            let Some(part) = found(scene.particle_settings(psys.settings), "build_particles") else {
                continue;
            };
            self.build_animdata(psys.settings.into());

            // A re-enabled system needs a full rebuild to pick these up.
            if !psys.enabled {
                tracing::trace!("particle system '{}' on '{}' disabled", psys.name, ob.name);
                continue;
            }
            let key = psys_key(ob_id, &psys.name);

            // TODO: particle-emitting effectors should also depend on the
            // emitter's particle systems.
            for eff in self.effectors(ob_id, part) {
                self.add_relation(
                    ComponentKey::new(eff, ComponentKind::Geometry),
                    key.clone(),
                    RelationKind::Standard,
                    "Particle Field",
                );
            }

            let rule_objects = part
                .boids
                .iter()
                .flat_map(|boids| &boids.states)
                .flat_map(|state| &state.rules)
                .filter_map(|rule| rule.object());
            for rule_ob in rule_objects {
                self.add_relation(
                    ComponentKey::new(rule_ob, ComponentKind::Transform),
                    key.clone(),
                    RelationKind::Transform,
                    "Boid Rule",
                );
            }
        }
    }

    /// Force-field objects acting on a particle system owned by `owner`.
    fn effectors(&self, owner: ObjectId, part: &ParticleSettings) -> Vec<ObjectId> {
        let scene = self.scene;
        let candidates: &[ObjectId] = match &part.effector_group {
            Some(group) => group,
            None => scene.bases(),
        };
        candidates
            .iter()
            .copied()
            .filter(|&id| id != owner)
            .filter(|&id| scene.object(id).is_ok_and(|ob| ob.force_field.is_some()))
            .collect()
    }
}
