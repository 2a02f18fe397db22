use glam::Vec3;

use crate::components::transform::TransformComponent;
use crate::guid_new_type::ModelHandle;

/// 点光源属性；半径来自 transform 的 scale.x
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightComponent {
    pub intensity: f32,
}
impl Default for LightComponent {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

/// 场景中的一个对象
///
/// `color` 对于网格是表面着色，对于点光源是光的颜色。
/// 模型只是被引用，生命周期由 [`EntityStore`](crate::entity_store::EntityStore) 中的模型 arena 负责。
#[derive(Clone, Debug, Default)]
pub struct SceneEntity {
    pub transform: TransformComponent,
    pub model: Option<ModelHandle>,
    pub light: Option<LightComponent>,
    pub color: Vec3,
}
// new & init
impl SceneEntity {
    pub fn with_model(model: ModelHandle) -> Self {
        Self {
            model: Some(model),
            ..Default::default()
        }
    }

    /// 创建一个点光源实体，`radius` 存在 scale.x 中
    pub fn make_light(intensity: f32, radius: f32, color: Vec3) -> Self {
        Self {
            transform: TransformComponent {
                scale: Vec3::new(radius, 1.0, 1.0),
                ..Default::default()
            },
            light: Some(LightComponent { intensity }),
            color,
            ..Default::default()
        }
    }
}
// getters
impl SceneEntity {
    #[inline]
    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    #[inline]
    pub fn light_radius(&self) -> f32 {
        self.transform.scale.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_light_stores_radius_in_scale_x() {
        let light = SceneEntity::make_light(2.0, 0.1, Vec3::new(1.0, 0.0, 0.0));
        assert!(light.is_light());
        assert_eq!(light.light_radius(), 0.1);
        assert_eq!(light.light.map(|l| l.intensity), Some(2.0));
        assert!(light.model.is_none());
    }
}
