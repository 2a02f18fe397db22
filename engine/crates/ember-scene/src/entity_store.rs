use slotmap::SlotMap;

use crate::components::entity::SceneEntity;
use crate::components::mesh::{Mesh, Model};
use crate::guid_new_type::{EntityHandle, MeshHandle, ModelHandle};

/// 场景中所有实体、模型与网格的 arena
///
/// 只支持追加；句柄在 store 存活期间保持稳定。
/// 迭代顺序由 slotmap 决定，在没有插入的情况下多次迭代结果一致。
#[derive(Default)]
pub struct EntityStore {
    entities: SlotMap<EntityHandle, SceneEntity>,
    models: SlotMap<ModelHandle, Model>,
    meshes: SlotMap<MeshHandle, Mesh>,
}
// new & init
impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}
// getters
impl EntityStore {
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn get(&self, handle: EntityHandle) -> Option<&SceneEntity> {
        self.entities.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut SceneEntity> {
        self.entities.get_mut(handle)
    }

    #[inline]
    pub fn get_model(&self, handle: ModelHandle) -> Option<&Model> {
        self.models.get(handle)
    }

    #[inline]
    pub fn get_mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &SceneEntity)> {
        self.entities.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut SceneEntity)> {
        self.entities.iter_mut()
    }

    #[inline]
    pub fn meshes(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> {
        self.meshes.iter()
    }

    /// 已注册的网格数量；每个网格对应一个 texture descriptor set
    #[inline]
    pub fn total_mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// 某个实体引用的所有网格
    pub fn entity_meshes(&self, entity: &SceneEntity) -> impl Iterator<Item = (MeshHandle, &Mesh)> {
        entity
            .model
            .and_then(|model| self.models.get(model))
            .into_iter()
            .flat_map(|model| model.meshes.iter())
            .filter_map(|&handle| self.meshes.get(handle).map(|mesh| (handle, mesh)))
    }
}
// tools
impl EntityStore {
    pub fn insert(&mut self, entity: SceneEntity) -> EntityHandle {
        self.entities.insert(entity)
    }

    pub fn register_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    /// 注册一组网格，作为一个模型
    pub fn register_model(&mut self, name: impl Into<String>, meshes: Vec<Mesh>) -> ModelHandle {
        let meshes = meshes.into_iter().map(|mesh| self.meshes.insert(mesh)).collect();
        self.models.insert(Model {
            name: name.into(),
            meshes,
        })
    }
}
impl Drop for EntityStore {
    fn drop(&mut self) {
        log::info!(
            "EntityStore dropped: {} entities, {} models, {} meshes",
            self.entities.len(),
            self.models.len(),
            self.meshes.len()
        );
    }
}
