use std::path::Path;
use std::rc::Rc;

use ash::vk;
use ember_gfx::GfxResult;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::pipelines::graphics_pipeline::{
    GraphicsPipeline, GraphicsPipelineCreateInfo, PipelineBinding, PipelineLayout,
};
use ember_scene::components::entity::SceneEntity;
use ember_scene::entity_store::EntityStore;
use ember_scene::guid_new_type::EntityHandle;
use glam::{Mat4, Vec3, Vec4};

use crate::frame_info::FrameInfo;
use crate::global_ubo::{GlobalUbo, PointLight};

/// 点光源 billboard 每次 draw 的顶点数（两个三角形）
pub const LIGHT_QUAD_VERTEX_COUNT: u32 = 6;

/// 光源绕世界 -Y 轴旋转的角速度，弧度每秒
pub const LIGHT_ORBIT_SPEED: f32 = 0.5;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightPushConstants {
    pub position: Vec4,
    /// w 为强度
    pub color: Vec4,
    pub radius: f32,
    _padding: [f32; 3],
}
impl PointLightPushConstants {
    pub fn from_entity(entity: &SceneEntity) -> Option<Self> {
        let light = entity.light?;
        Some(Self {
            position: entity.transform.translation.extend(1.0),
            color: entity.color.extend(light.intensity),
            radius: entity.light_radius(),
            _padding: [0.0; 3],
        })
    }
}

/// 点光源：`update` 在 render pass 之前把光源写入全局 uniform，
/// `render` 在不透明物体之后按由远及近的顺序绘制 billboard
pub struct LightSystem {
    pipeline: GraphicsPipeline,
}
impl LightSystem {
    pub const PUSH_STAGES: vk::ShaderStageFlags =
        vk::ShaderStageFlags::from_raw(vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw());

    pub fn new(
        device: &Rc<GfxDevice>,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
        vert_shader: &Path,
        frag_shader: &Path,
    ) -> GfxResult<Self> {
        let pipeline_layout = Rc::new(PipelineLayout::new(
            device,
            &[global_set_layout],
            &[vk::PushConstantRange::default()
                .stage_flags(Self::PUSH_STAGES)
                .offset(0)
                .size(size_of::<PointLightPushConstants>() as u32)],
            "light-system",
        )?);

        let ci = Self::pipeline_create_info(render_pass, vert_shader, frag_shader, device.msaa_samples());
        let pipeline = GraphicsPipeline::new(device, &ci, pipeline_layout, "light-system")?;
        Ok(Self { pipeline })
    }

    /// 没有顶点输入，quad 由 vertex shader 生成；alpha 混合
    pub fn pipeline_create_info(
        render_pass: vk::RenderPass,
        vert_shader: &Path,
        frag_shader: &Path,
        msaa_samples: vk::SampleCountFlags,
    ) -> GraphicsPipelineCreateInfo {
        let mut ci = GraphicsPipelineCreateInfo::default();
        ci.render_pass(render_pass, 0)
            .vertex_shader_stage(vert_shader, c"main")
            .fragment_shader_stage(frag_shader, c"main")
            .alpha_blending()
            .msaa_sample(msaa_samples);
        ci
    }

    #[inline]
    pub fn binding(&self) -> PipelineBinding {
        self.pipeline.binding()
    }

    pub fn render(&self, frame: &FrameInfo) {
        Self::record(self.pipeline.binding(), frame);
    }

    /// 依次写入光源，超出容量的光源被丢弃
    pub fn update(frame: &FrameInfo, ubo: &mut GlobalUbo) {
        let mut dropped = 0;
        for (_, entity) in frame.scene.iter() {
            let Some(light) = entity.light else {
                continue;
            };
            let accepted = ubo.push_light(PointLight {
                position: entity.transform.translation.extend(1.0),
                color: entity.color.extend(light.intensity),
            });
            if !accepted {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!("{} point lights exceed the uniform capacity and are not lit", dropped);
        }
    }

    /// 所有光源按到相机距离由远及近排序；距离相同时按实体句柄排序，不会丢失任何光源
    pub fn sorted_lights(scene: &EntityStore, camera_position: Vec3) -> Vec<(f32, EntityHandle)> {
        let mut lights: Vec<(f32, EntityHandle)> = scene
            .iter()
            .filter(|(_, entity)| entity.is_light())
            .map(|(handle, entity)| (camera_position.distance_squared(entity.transform.translation), handle))
            .collect();
        lights.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        lights
    }

    pub fn record(binding: PipelineBinding, frame: &FrameInfo) {
        let cmd = frame.cmd;
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, binding.pipeline);
        cmd.cmd_bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            binding.layout,
            0,
            std::slice::from_ref(&frame.global_descriptor_set),
            &[],
        );

        for (_, handle) in Self::sorted_lights(frame.scene, frame.camera.position()) {
            let Some(push) = frame.scene.get(handle).and_then(PointLightPushConstants::from_entity) else {
                continue;
            };
            cmd.cmd_push_constants(binding.layout, Self::PUSH_STAGES, 0, bytemuck::bytes_of(&push));
            cmd.cmd_draw(LIGHT_QUAD_VERTEX_COUNT, 1, 0, 0);
        }
    }

    /// 让所有光源绕 -Y 轴旋转；在构建 [`FrameInfo`] 之前调用
    pub fn animate_lights(scene: &mut EntityStore, frame_time: f32) {
        let rotation = Mat4::from_axis_angle(Vec3::NEG_Y, LIGHT_ORBIT_SPEED * frame_time);
        for (_, entity) in scene.iter_mut() {
            if entity.is_light() {
                entity.transform.translation = rotation.transform_point3(entity.transform.translation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_settings::MAX_LIGHTS;
    use crate::test_utils::{Recorded, RecordingCommands};
    use ember_scene::camera::Camera;
    use slotmap::SecondaryMap;

    fn light_at(translation: Vec3) -> SceneEntity {
        let mut light = SceneEntity::make_light(1.0, 0.1, Vec3::ONE);
        light.transform.translation = translation;
        light
    }

    fn frame<'a>(
        recorder: &'a RecordingCommands,
        camera: &'a Camera,
        sets: &'a SecondaryMap<ember_scene::guid_new_type::MeshHandle, vk::DescriptorSet>,
        store: &'a EntityStore,
    ) -> FrameInfo<'a> {
        FrameInfo {
            frame_index: 0,
            frame_time: 0.0,
            cmd: recorder,
            camera,
            global_descriptor_set: vk::DescriptorSet::null(),
            texture_descriptor_sets: sets,
            scene: store,
        }
    }

    #[test]
    fn pipeline_blends_quads_without_vertex_input() {
        let ci = LightSystem::pipeline_create_info(
            vk::RenderPass::null(),
            Path::new("point_light.vert.spv"),
            Path::new("point_light.frag.spv"),
            vk::SampleCountFlags::TYPE_1,
        );

        assert!(ci.vertex_bindings().is_empty());
        assert!(ci.vertex_attributes().is_empty());

        let blend = ci.color_blend_states();
        assert_eq!(blend.len(), 1);
        assert_eq!(blend[0].blend_enable, vk::TRUE);
        assert_eq!(blend[0].src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(blend[0].dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
        assert_eq!(blend[0].color_blend_op, vk::BlendOp::ADD);

        // 深度测试保留，光源会被前方的网格遮挡
        let depth = ci.depth_stencil_state();
        assert_eq!(depth.depth_test_enable, vk::TRUE);
        assert_eq!(depth.depth_compare_op, vk::CompareOp::LESS);
    }

    #[test]
    fn update_clamps_to_capacity() {
        for count in [0, 3, MAX_LIGHTS, MAX_LIGHTS + 5] {
            let mut store = EntityStore::new();
            for i in 0..count {
                store.insert(light_at(Vec3::new(i as f32, 0.0, 0.0)));
            }
            store.insert(SceneEntity::default());

            let (recorder, camera, sets) = (RecordingCommands::default(), Camera::default(), SecondaryMap::new());
            let mut ubo = GlobalUbo::default();
            LightSystem::update(&frame(&recorder, &camera, &sets, &store), &mut ubo);
            assert_eq!(ubo.num_lights(), count.min(MAX_LIGHTS));
        }
    }

    #[test]
    fn update_writes_position_and_intensity() {
        let mut store = EntityStore::new();
        let mut light = SceneEntity::make_light(2.0, 0.3, Vec3::new(1.0, 0.5, 0.0));
        light.transform.translation = Vec3::new(0.0, -2.5, -5.0);
        store.insert(light);

        let (recorder, camera, sets) = (RecordingCommands::default(), Camera::default(), SecondaryMap::new());
        let mut ubo = GlobalUbo::default();
        LightSystem::update(&frame(&recorder, &camera, &sets, &store), &mut ubo);
        assert_eq!(ubo.active_lights()[0].position, Vec4::new(0.0, -2.5, -5.0, 1.0));
        assert_eq!(ubo.active_lights()[0].color, Vec4::new(1.0, 0.5, 0.0, 2.0));
    }

    #[test]
    fn farther_light_is_drawn_first() {
        let mut store = EntityStore::new();
        let near = store.insert(light_at(Vec3::new(0.0, 0.0, 3.0)));
        let far = store.insert(light_at(Vec3::new(0.0, 7.0, 0.0)));

        let order: Vec<_> = LightSystem::sorted_lights(&store, Vec3::ZERO).into_iter().map(|(_, h)| h).collect();
        assert_eq!(order, vec![far, near]);
    }

    #[test]
    fn equal_distances_keep_every_light() {
        let mut store = EntityStore::new();
        let handles: Vec<_> = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::NEG_X]
            .into_iter()
            .map(|p| store.insert(light_at(p * 4.0)))
            .collect();

        let sorted = LightSystem::sorted_lights(&store, Vec3::ZERO);
        assert_eq!(sorted.len(), 4);
        assert!(sorted.windows(2).all(|w| w[0].0 >= w[1].0));
        let mut sorted_handles: Vec<_> = sorted.iter().map(|(_, h)| *h).collect();
        sorted_handles.sort();
        let mut expected = handles.clone();
        expected.sort();
        assert_eq!(sorted_handles, expected);
    }

    #[test]
    fn render_issues_one_quad_per_light() {
        let mut store = EntityStore::new();
        store.insert(light_at(Vec3::new(0.0, 0.0, 2.0)));
        store.insert(light_at(Vec3::new(0.0, 0.0, 5.0)));

        let (recorder, camera, sets) = (RecordingCommands::default(), Camera::default(), SecondaryMap::new());
        LightSystem::record(PipelineBinding::default(), &frame(&recorder, &camera, &sets, &store));

        let commands = recorder.take();
        let draws = commands.iter().filter(|c| **c == Recorded::Draw { vertex_count: 6 }).count();
        assert_eq!(draws, 2);
        let pushes: Vec<PointLightPushConstants> = commands
            .iter()
            .filter_map(|c| match c {
                Recorded::PushConstants(data) => Some(bytemuck::pod_read_unaligned(data)),
                _ => None,
            })
            .collect();
        assert_eq!(pushes[0].position.z, 5.0);
        assert_eq!(pushes[1].position.z, 2.0);
        assert_eq!(pushes[0].radius, 0.1);
    }

    #[test]
    fn lights_orbit_around_negative_y() {
        let mut store = EntityStore::new();
        let light = store.insert(light_at(Vec3::new(0.0, -2.5, -5.0)));
        let mesh_entity = store.insert(SceneEntity {
            transform: ember_scene::components::transform::TransformComponent {
                translation: Vec3::new(1.0, 0.0, 0.0),
                ..Default::default()
            },
            ..Default::default()
        });

        LightSystem::animate_lights(&mut store, std::f32::consts::PI);
        let moved = store.get(light).unwrap().transform.translation;
        // 0.5 rad/s 持续 pi 秒，转过 pi/2
        assert!((moved.y + 2.5).abs() < 1e-5);
        assert!((moved.length() - Vec3::new(0.0, -2.5, -5.0).length()).abs() < 1e-4);
        assert!(moved.abs_diff_eq(Vec3::new(5.0, -2.5, 0.0), 1e-4));
        assert_eq!(store.get(mesh_entity).unwrap().transform.translation, Vec3::new(1.0, 0.0, 0.0));
    }
}
