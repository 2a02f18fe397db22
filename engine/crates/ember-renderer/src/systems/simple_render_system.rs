use std::path::Path;
use std::rc::Rc;

use ash::vk;
use ember_gfx::commands::draw_commands::DrawCommands;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::pipelines::graphics_pipeline::{
    GraphicsPipeline, GraphicsPipelineCreateInfo, PipelineBinding, PipelineLayout,
};
use ember_gfx::GfxResult;
use ember_scene::components::mesh::MeshDrawInfo;
use ember_scene::components::vertex::Vertex;
use glam::Mat4;

use crate::frame_info::FrameInfo;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimplePushConstantData {
    pub model_matrix: Mat4,
    pub normal_matrix: Mat4,
}

/// 不透明网格
///
/// set 0 为全局 set，set 1 为网格自己的纹理 set。
pub struct SimpleRenderSystem {
    pipeline: GraphicsPipeline,
}
impl SimpleRenderSystem {
    pub const PUSH_STAGES: vk::ShaderStageFlags =
        vk::ShaderStageFlags::from_raw(vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw());

    pub fn new(
        device: &Rc<GfxDevice>,
        render_pass: vk::RenderPass,
        set_layouts: &[vk::DescriptorSetLayout],
        vert_shader: &Path,
        frag_shader: &Path,
    ) -> GfxResult<Self> {
        let pipeline_layout = Rc::new(PipelineLayout::new(
            device,
            set_layouts,
            &[vk::PushConstantRange::default()
                .stage_flags(Self::PUSH_STAGES)
                .offset(0)
                .size(size_of::<SimplePushConstantData>() as u32)],
            "simple-render-system",
        )?);

        let ci = Self::pipeline_create_info(render_pass, vert_shader, frag_shader, device.msaa_samples());
        let pipeline = GraphicsPipeline::new(device, &ci, pipeline_layout, "simple-render-system")?;
        Ok(Self { pipeline })
    }

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
            .vertex_binding(Vertex::binding_descriptions())
            .vertex_attribute(Vertex::attribute_descriptions())
            .cull_mode(vk::CullModeFlags::BACK, vk::FrontFace::CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS), true)
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

    /// 绑定一次 pipeline 与全局 set，然后逐个实体、逐个网格绘制
    ///
    /// 没有准备好纹理 set 的网格会被跳过并打印警告。
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

        for (entity_handle, entity) in frame.scene.iter() {
            if entity.model.is_none() {
                continue;
            }

            let push = SimplePushConstantData {
                model_matrix: entity.transform.mat4(),
                normal_matrix: entity.transform.normal_matrix(),
            };
            cmd.cmd_push_constants(binding.layout, Self::PUSH_STAGES, 0, bytemuck::bytes_of(&push));

            for (mesh_handle, mesh) in frame.scene.entity_meshes(entity) {
                let Some(texture_set) = frame.texture_descriptor_sets.get(mesh_handle) else {
                    log::warn!(
                        "texture descriptor set missing for mesh `{}` of entity {:?}, skipped",
                        mesh.name,
                        entity_handle
                    );
                    continue;
                };
                cmd.cmd_bind_descriptor_sets(
                    vk::PipelineBindPoint::GRAPHICS,
                    binding.layout,
                    1,
                    std::slice::from_ref(texture_set),
                    &[],
                );
                draw_mesh(cmd, &mesh.draw);
            }
        }
    }
}

fn draw_mesh(cmd: &dyn DrawCommands, draw: &MeshDrawInfo) {
    cmd.cmd_bind_vertex_buffers(0, &[draw.vertex_buffer], &[0]);
    match draw.index_buffer {
        Some((index_buffer, index_count)) => {
            cmd.cmd_bind_index_buffer(index_buffer, 0, vk::IndexType::UINT32);
            cmd.cmd_draw_indexed(index_count, 1, 0, 0, 0);
        }
        None => cmd.cmd_draw(draw.vertex_count, 1, 0, 0),
    }
}
