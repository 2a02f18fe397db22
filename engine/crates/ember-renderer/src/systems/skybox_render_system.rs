use std::path::Path;
use std::rc::Rc;

use ash::vk;
use ember_gfx::GfxResult;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::pipelines::graphics_pipeline::{
    GraphicsPipeline, GraphicsPipelineCreateInfo, PipelineBinding, PipelineLayout,
};

use crate::frame_info::FrameInfo;

/// 单位立方体 12 个三角形
pub const SKYBOX_VERTEX_COUNT: u32 = 36;

/// 天空盒：立方体顶点完全由 vertex shader 生成，cubemap 来自全局 set 的 binding 1
///
/// vertex shader 把深度固定在远平面，所以深度测试使用 LESS_OR_EQUAL；从内部观察立方体，不做剔除。
pub struct SkyboxRenderSystem {
    pipeline: GraphicsPipeline,
}
impl SkyboxRenderSystem {
    pub fn new(
        device: &Rc<GfxDevice>,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
        vert_shader: &Path,
        frag_shader: &Path,
    ) -> GfxResult<Self> {
        let pipeline_layout = Rc::new(PipelineLayout::new(device, &[global_set_layout], &[], "skybox-system")?);
        let ci = Self::pipeline_create_info(render_pass, vert_shader, frag_shader, device.msaa_samples());
        let pipeline = GraphicsPipeline::new(device, &ci, pipeline_layout, "skybox-system")?;
        Ok(Self { pipeline })
    }

    /// 没有顶点输入，不剔除，深度 LESS_OR_EQUAL
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
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), true)
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
        cmd.cmd_draw(SKYBOX_VERTEX_COUNT, 1, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Recorded, RecordingCommands};
    use ash::vk::Handle;
    use ember_scene::camera::Camera;
    use ember_scene::components::entity::SceneEntity;
    use ember_scene::entity_store::EntityStore;
    use slotmap::SecondaryMap;

    #[test]
    fn pipeline_draws_cube_from_inside_at_far_plane() {
        let ci = SkyboxRenderSystem::pipeline_create_info(
            vk::RenderPass::null(),
            Path::new("skybox.vert.spv"),
            Path::new("skybox.frag.spv"),
            vk::SampleCountFlags::TYPE_4,
        );

        assert!(ci.vertex_bindings().is_empty());
        assert!(ci.vertex_attributes().is_empty());
        assert_eq!(ci.rasterization_state().cull_mode, vk::CullModeFlags::NONE);

        let depth = ci.depth_stencil_state();
        assert_eq!(depth.depth_test_enable, vk::TRUE);
        assert_eq!(depth.depth_compare_op, vk::CompareOp::LESS_OR_EQUAL);

        assert_eq!(ci.color_blend_states()[0].blend_enable, vk::FALSE);
        assert_eq!(ci.msaa_samples(), vk::SampleCountFlags::TYPE_4);
        assert_eq!(ci.shader_stage_flags(), vec![vk::ShaderStageFlags::VERTEX, vk::ShaderStageFlags::FRAGMENT]);
    }

    #[test]
    fn record_binds_global_set_and_draws_one_cube() {
        let mut store = EntityStore::new();
        // 场景内容不影响天空盒
        store.insert(SceneEntity::make_light(1.0, 0.1, glam::Vec3::ONE));
        let sets = SecondaryMap::new();
        let recorder = RecordingCommands::default();
        let camera = Camera::default();
        let frame = FrameInfo {
            frame_index: 1,
            frame_time: 0.016,
            cmd: &recorder,
            camera: &camera,
            global_descriptor_set: vk::DescriptorSet::from_raw(42),
            texture_descriptor_sets: &sets,
            scene: &store,
        };
        let binding = PipelineBinding {
            pipeline: vk::Pipeline::from_raw(3),
            layout: vk::PipelineLayout::from_raw(4),
        };
        SkyboxRenderSystem::record(binding, &frame);

        assert_eq!(
            recorder.take(),
            vec![
                Recorded::BindPipeline(vk::Pipeline::from_raw(3)),
                Recorded::BindSets {
                    first_set: 0,
                    sets: vec![vk::DescriptorSet::from_raw(42)]
                },
                Recorded::Draw {
                    vertex_count: SKYBOX_VERTEX_COUNT
                },
            ]
        );
    }
}
