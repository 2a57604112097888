use super::{RelationBuilder, found};
use crate::id::{DataId, GreasePencilId, MaterialId, NodeTreeId, TextureId, WorldId};
use crate::key::{ComponentKey, ComponentKind};
use crate::relation::RelationKind;
use crate::scene::{DataKind, NodeKind};

// Materials, textures, node trees, worlds and lamps reference each other
// freely. Their recursive builders run under the cycle guard.

impl RelationBuilder<'_> {
    pub fn build_material(&mut self, id: MaterialId) {
        self.guarded(id.into(), |this| {
            let scene = this.scene;
            let Some(ma) = found(scene.material(id), "build_material") else {
                return;
            };
            this.build_animdata(id.into());
            this.build_texture_stack(&ma.textures);
            if let Some(tree) = ma.node_tree {
                this.build_nodetree(tree);
            }
        });
    }

    pub fn build_texture(&mut self, id: TextureId) {
        self.guarded(id.into(), |this| {
            let scene = this.scene;
            let Some(tex) = found(scene.texture(id), "build_texture") else {
                return;
            };
            this.build_animdata(id.into());
            if let Some(tree) = tex.node_tree {
                this.build_nodetree(tree);
            }
        });
    }

    /// Texture slots in order. Empty slots are skipped.
    pub fn build_texture_stack(&mut self, slots: &[Option<TextureId>]) {
        for tex in slots.iter().flatten() {
            self.build_texture(*tex);
        }
    }

    /// A node tree and every material, texture and node group its nodes use.
    pub fn build_nodetree(&mut self, id: NodeTreeId) {
        self.guarded(id.into(), |this| {
            let scene = this.scene;
            let Some(ntree) = found(scene.node_tree(id), "build_nodetree") else {
                return;
            };
            this.build_animdata(id.into());
            for node in &ntree.nodes {
                match node.kind {
                    NodeKind::Material(ma) => this.build_material(ma),
                    NodeKind::Texture(tex) => this.build_texture(tex),
                    NodeKind::Group(group) => this.build_nodetree(group),
                    NodeKind::Other => {}
                }
            }
        });
    }

    pub fn build_world(&mut self, id: WorldId) {
        self.guarded(id.into(), |this| {
            let scene = this.scene;
            let Some(world) = found(scene.world(id), "build_world") else {
                return;
            };
            this.build_animdata(id.into());
            this.build_texture_stack(&world.textures);
            if let Some(tree) = world.node_tree {
                this.build_nodetree(tree);
            }
        });
    }

    /// Lamp data: its shading node tree and texture slots.
    pub fn build_lamp(&mut self, id: DataId) {
        self.guarded(id.into(), |this| {
            let scene = this.scene;
            let Some(data) = found(scene.data(id), "build_lamp") else {
                return;
            };
            let DataKind::Lamp(lamp) = &data.kind else {
                tracing::warn!("data '{}' is not a lamp", data.name);
                return;
            };
            if let Some(tree) = lamp.node_tree {
                this.build_nodetree(tree);
            }
            this.build_texture_stack(&lamp.textures);
        });
    }

    /// Camera data. Only the depth-of-field object matters.
    pub fn build_camera(&mut self, id: DataId) {
        let scene = self.scene;
        let Some(data) = found(scene.data(id), "build_camera") else {
            return;
        };
        let DataKind::Camera(cam) = &data.kind else {
            tracing::warn!("data '{}' is not a camera", data.name);
            return;
        };
        if let Some(dof) = cam.dof_object {
            self.add_relation(
                ComponentKey::new(dof, ComponentKind::Transform),
                ComponentKey::new(id, ComponentKind::Parameters),
                RelationKind::Transform,
                "Camera DOF",
            );
        }
    }

    /// The scene's compositing node tree.
    pub fn build_compositor(&mut self, tree: NodeTreeId) {
        self.build_nodetree(tree);
    }

    pub fn build_gpencil(&mut self, id: GreasePencilId) {
        self.build_animdata(id.into());
    }
}
