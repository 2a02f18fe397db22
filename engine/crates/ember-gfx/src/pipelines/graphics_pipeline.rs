use std::ffi::CStr;
use std::path::Path;
use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::error::GfxResult;
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;
use crate::pipelines::shader::{ShaderModule, ShaderStageInfo};

pub struct PipelineLayout {
    handle: vk::PipelineLayout,
    device: Rc<GfxDevice>,
}
impl PipelineLayout {
    pub fn new(
        device: &Rc<GfxDevice>,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
        debug_name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let pipeline_layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);
        let handle = unsafe { device.create_pipeline_layout(&pipeline_layout_create_info, None)? };
        let layout = Self {
            handle,
            device: device.clone(),
        };
        device.set_debug_name(&layout, debug_name);
        Ok(layout)
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}
impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe { self.device.destroy_pipeline_layout(self.handle, None) };
    }
}
impl DebugType for PipelineLayout {
    fn debug_type_name() -> &'static str {
        "GfxPipelineLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

/// 录制 draw 命令时需要的 pipeline 与 layout 句柄
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineBinding {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
}

/// 图形管线
///
/// 只能通过 [`GraphicsPipeline::new`] 得到，构造时必须提供 layout，
/// 因此不存在 "有 pipeline 但 layout 未就绪" 的中间状态。
pub struct GraphicsPipeline {
    pipeline: vk::Pipeline,

    /// 多个 pipeline 可以使用同一个 pipeline layout
    pipeline_layout: Rc<PipelineLayout>,

    device: Rc<GfxDevice>,
    name: String,
}
impl GraphicsPipeline {
    pub fn new(
        device: &Rc<GfxDevice>,
        create_info: &GraphicsPipelineCreateInfo,
        pipeline_layout: Rc<PipelineLayout>,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("GraphicsPipeline::new");

        let shader_modules = create_info
            .shader_stages
            .iter()
            .map(|stage| ShaderModule::new(device, Path::new(&stage.path)))
            .collect::<GfxResult<Vec<_>>>()?;
        let shader_stages_info = create_info
            .shader_stages
            .iter()
            .zip(shader_modules.iter())
            .map(|(stage, module)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(stage.stage)
                    .module(module.handle())
                    .name(stage.entry_point)
            })
            .collect_vec();

        // 顶点和 index
        let vertex_input_state_info = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&create_info.vertex_binding_desc)
            .vertex_attribute_descriptions(&create_info.vertex_attribute_desc);

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(create_info.primitive_topology)
            .primitive_restart_enable(false);

        // viewport 和 scissor 具体值由 dynamic 决定，但是数量由该 create info 决定
        let viewport_info = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        let msaa_info = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(create_info.msaa_sample);

        let color_blend_info = create_info.blend_info.attachments(&create_info.color_attach_blend_states);

        let dynamic_state_info =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&create_info.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages_info)
            .vertex_input_state(&vertex_input_state_info)
            .input_assembly_state(&input_assembly_info)
            .viewport_state(&viewport_info)
            .rasterization_state(&create_info.rasterize_state_info)
            .multisample_state(&msaa_info)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&create_info.depth_stencil_info)
            .layout(pipeline_layout.handle())
            .dynamic_state(&dynamic_state_info)
            .render_pass(create_info.render_pass)
            .subpass(create_info.subpass);

        let pipeline = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .map_err(|(_, e)| e)?[0]
        };
        // shader module 在这里之后即可销毁
        drop(shader_modules);

        let pipeline = Self {
            pipeline,
            pipeline_layout,
            device: device.clone(),
            name: debug_name.to_string(),
        };
        device.set_debug_name(&pipeline, debug_name);
        log::info!("graphics pipeline created: {} (msaa: {:?})", debug_name, create_info.msaa_sample);
        Ok(pipeline)
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout.handle()
    }

    #[inline]
    pub fn binding(&self) -> PipelineBinding {
        PipelineBinding {
            pipeline: self.pipeline,
            layout: self.pipeline_layout.handle(),
        }
    }
}
impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        log::info!("Destroying GraphicsPipeline: {}", self.name);
        unsafe { self.device.destroy_pipeline(self.pipeline, None) };
    }
}
impl DebugType for GraphicsPipeline {
    fn debug_type_name() -> &'static str {
        "GfxGraphicsPipeline"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.pipeline
    }
}

pub struct GraphicsPipelineCreateInfo {
    render_pass: vk::RenderPass,
    subpass: u32,

    shader_stages: Vec<ShaderStageInfo>,

    vertex_binding_desc: Vec<vk::VertexInputBindingDescription>,
    vertex_attribute_desc: Vec<vk::VertexInputAttributeDescription>,

    primitive_topology: vk::PrimitiveTopology,

    rasterize_state_info: vk::PipelineRasterizationStateCreateInfo<'static>,

    msaa_sample: vk::SampleCountFlags,

    color_attach_blend_states: Vec<vk::PipelineColorBlendAttachmentState>,
    blend_info: vk::PipelineColorBlendStateCreateInfo<'static>,

    depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,

    dynamic_states: Vec<vk::DynamicState>,
}
impl Default for GraphicsPipelineCreateInfo {
    fn default() -> Self {
        Self {
            render_pass: vk::RenderPass::null(),
            subpass: 0,

            shader_stages: vec![],

            vertex_binding_desc: vec![],
            vertex_attribute_desc: vec![],

            primitive_topology: vk::PrimitiveTopology::TRIANGLE_LIST,

            rasterize_state_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::CLOCKWISE)
                .depth_bias_enable(false),
            msaa_sample: vk::SampleCountFlags::TYPE_1,

            // 单个 color attachment，不混合
            color_attach_blend_states: vec![
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(false)
                    .color_write_mask(vk::ColorComponentFlags::RGBA),
            ],
            blend_info: vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .blend_constants([0.0, 0.0, 0.0, 0.0]),

            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false),
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
        }
    }
}
// builder
impl GraphicsPipelineCreateInfo {
    /// 使用 render pass 的第 `subpass` 个 subpass
    #[inline]
    pub fn render_pass(&mut self, render_pass: vk::RenderPass, subpass: u32) -> &mut Self {
        self.render_pass = render_pass;
        self.subpass = subpass;
        self
    }

    #[inline]
    pub fn vertex_shader_stage(&mut self, path: impl AsRef<Path>, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(ShaderStageInfo {
            stage: vk::ShaderStageFlags::VERTEX,
            entry_point,
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    #[inline]
    pub fn fragment_shader_stage(&mut self, path: impl AsRef<Path>, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(ShaderStageInfo {
            stage: vk::ShaderStageFlags::FRAGMENT,
            entry_point,
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    #[inline]
    pub fn vertex_binding(&mut self, bindings: Vec<vk::VertexInputBindingDescription>) -> &mut Self {
        self.vertex_binding_desc = bindings;
        self
    }

    #[inline]
    pub fn vertex_attribute(&mut self, attributes: Vec<vk::VertexInputAttributeDescription>) -> &mut Self {
        self.vertex_attribute_desc = attributes;
        self
    }

    #[inline]
    pub fn msaa_sample(&mut self, samples: vk::SampleCountFlags) -> &mut Self {
        self.msaa_sample = samples;
        self
    }

    /// 为每个 color attachment 指定 blend 操作
    #[inline]
    pub fn color_blend(
        &mut self,
        states: Vec<vk::PipelineColorBlendAttachmentState>,
        blend_constants: [f32; 4],
    ) -> &mut Self {
        self.color_attach_blend_states = states;
        self.blend_info.blend_constants = blend_constants;
        self.blend_info.logic_op_enable = vk::FALSE;
        self
    }

    /// 标准的 alpha 混合：`src * a + dst * (1 - a)`
    #[inline]
    pub fn alpha_blending(&mut self) -> &mut Self {
        let state = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(true)
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD);
        self.color_blend(vec![state], [0.0; 4])
    }

    #[inline]
    pub fn cull_mode(&mut self, mode: vk::CullModeFlags, front_face: vk::FrontFace) -> &mut Self {
        self.rasterize_state_info.cull_mode = mode;
        self.rasterize_state_info.front_face = front_face;
        self
    }

    #[inline]
    pub fn depth_test(&mut self, depth_test_op: Option<vk::CompareOp>, depth_write: bool) -> &mut Self {
        self.depth_stencil_info.depth_test_enable = depth_test_op.map_or(vk::FALSE, |_| vk::TRUE);
        self.depth_stencil_info.depth_compare_op = depth_test_op.unwrap_or(vk::CompareOp::NEVER);
        self.depth_stencil_info.depth_write_enable = if depth_write { vk::TRUE } else { vk::FALSE };
        self
    }
}

// getters
impl GraphicsPipelineCreateInfo {
    #[inline]
    pub fn vertex_bindings(&self) -> &[vk::VertexInputBindingDescription] {
        &self.vertex_binding_desc
    }

    #[inline]
    pub fn vertex_attributes(&self) -> &[vk::VertexInputAttributeDescription] {
        &self.vertex_attribute_desc
    }

    #[inline]
    pub fn rasterization_state(&self) -> &vk::PipelineRasterizationStateCreateInfo<'static> {
        &self.rasterize_state_info
    }

    #[inline]
    pub fn color_blend_states(&self) -> &[vk::PipelineColorBlendAttachmentState] {
        &self.color_attach_blend_states
    }

    #[inline]
    pub fn depth_stencil_state(&self) -> &vk::PipelineDepthStencilStateCreateInfo<'static> {
        &self.depth_stencil_info
    }

    #[inline]
    pub fn msaa_samples(&self) -> vk::SampleCountFlags {
        self.msaa_sample
    }

    /// 按添加顺序排列的 shader stage
    pub fn shader_stage_flags(&self) -> Vec<vk::ShaderStageFlags> {
        self.shader_stages.iter().map(|stage| stage.stage).collect()
    }
}
