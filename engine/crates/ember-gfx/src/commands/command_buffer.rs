use ash::vk;

use crate::commands::barrier::GfxImageBarrier;
use crate::commands::draw_commands::DrawCommands;
use crate::error::GfxResult;
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;
use crate::resources::buffer::GfxBuffer;

/// 命令缓冲封装
///
/// 不持有 command buffer 的所有权：一次性命令由 [`GfxDevice::one_time_exec`] 分配和回收，
/// 每帧的命令由 render target 提供。
pub struct GfxCommandBuffer<'a> {
    vk_handle: vk::CommandBuffer,
    device: &'a GfxDevice,
}
impl<'a> GfxCommandBuffer<'a> {
    #[inline]
    pub fn new(device: &'a GfxDevice, vk_handle: vk::CommandBuffer) -> Self {
        Self { vk_handle, device }
    }

    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }
}
// Basic 命令
impl GfxCommandBuffer<'_> {
    #[inline]
    pub fn begin(&self, usage_flag: vk::CommandBufferUsageFlags) -> GfxResult<()> {
        unsafe {
            self.device.begin_command_buffer(self.vk_handle, &vk::CommandBufferBeginInfo::default().flags(usage_flag))?
        };
        Ok(())
    }

    #[inline]
    pub fn end(&self) -> GfxResult<()> {
        unsafe { self.device.end_command_buffer(self.vk_handle)? };
        Ok(())
    }
}
// 数据传输类型
impl GfxCommandBuffer<'_> {
    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer(&self, src: &GfxBuffer, dst: &GfxBuffer, regions: &[vk::BufferCopy]) {
        unsafe { self.device.cmd_copy_buffer(self.vk_handle, src.vk_buffer(), dst.vk_buffer(), regions) }
    }

    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer_to_image(&self, copy_info: &vk::CopyBufferToImageInfo2) {
        unsafe { self.device.cmd_copy_buffer_to_image2(self.vk_handle, copy_info) }
    }

    #[inline]
    pub fn image_memory_barrier(&self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        let barriers = barriers.iter().map(|b| *b.inner()).collect::<Vec<_>>();
        let dependency_info =
            vk::DependencyInfo::default().image_memory_barriers(&barriers).dependency_flags(dependency_flags);
        unsafe { self.device.cmd_pipeline_barrier2(self.vk_handle, &dependency_info) }
    }
}
impl DrawCommands for GfxCommandBuffer<'_> {
    #[inline]
    fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe { self.device.cmd_bind_pipeline(self.vk_handle, bind_point, pipeline) }
    }

    #[inline]
    fn cmd_bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.vk_handle,
                bind_point,
                layout,
                first_set,
                descriptor_sets,
                dynamic_offsets,
            )
        }
    }

    /// - command type: state
    /// - 支持的 queue: graphics, compute
    #[inline]
    fn cmd_push_constants(&self, layout: vk::PipelineLayout, stages: vk::ShaderStageFlags, offset: u32, data: &[u8]) {
        unsafe { self.device.cmd_push_constants(self.vk_handle, layout, stages, offset, data) }
    }

    #[inline]
    fn cmd_bind_vertex_buffers(&self, first_binding: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        unsafe { self.device.cmd_bind_vertex_buffers(self.vk_handle, first_binding, buffers, offsets) }
    }

    #[inline]
    fn cmd_bind_index_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize, index_type: vk::IndexType) {
        unsafe { self.device.cmd_bind_index_buffer(self.vk_handle, buffer, offset, index_type) }
    }

    #[inline]
    fn cmd_draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe { self.device.cmd_draw(self.vk_handle, vertex_count, instance_count, first_vertex, first_instance) }
    }

    #[inline]
    fn cmd_draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                self.vk_handle,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        }
    }
}
impl DebugType for GfxCommandBuffer<'_> {
    fn debug_type_name() -> &'static str {
        "GfxCommandBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}
