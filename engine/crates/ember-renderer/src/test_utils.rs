use std::cell::RefCell;

use ash::vk;
use ember_gfx::GfxResult;
use ember_gfx::commands::draw_commands::DrawCommands;

use crate::frame_orchestrator::{AcquiredFrame, PresentStatus, RenderTarget};

/// 记录下来的命令，只保留断言需要的信息
#[derive(Clone, Debug, PartialEq)]
pub enum Recorded {
    BindPipeline(vk::Pipeline),
    BindSets { first_set: u32, sets: Vec<vk::DescriptorSet> },
    PushConstants(Vec<u8>),
    BindVertexBuffer(vk::Buffer),
    BindIndexBuffer(vk::Buffer),
    Draw { vertex_count: u32 },
    DrawIndexed { index_count: u32 },
}

#[derive(Default)]
pub struct RecordingCommands {
    pub commands: RefCell<Vec<Recorded>>,
}
impl RecordingCommands {
    pub fn take(&self) -> Vec<Recorded> {
        self.commands.take()
    }

    fn push(&self, cmd: Recorded) {
        self.commands.borrow_mut().push(cmd);
    }
}
impl DrawCommands for RecordingCommands {
    fn cmd_bind_pipeline(&self, _bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        self.push(Recorded::BindPipeline(pipeline));
    }

    fn cmd_bind_descriptor_sets(
        &self,
        _bind_point: vk::PipelineBindPoint,
        _layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        _dynamic_offsets: &[u32],
    ) {
        self.push(Recorded::BindSets {
            first_set,
            sets: descriptor_sets.to_vec(),
        });
    }

    fn cmd_push_constants(&self, _layout: vk::PipelineLayout, _stages: vk::ShaderStageFlags, _offset: u32, data: &[u8]) {
        self.push(Recorded::PushConstants(data.to_vec()));
    }

    fn cmd_bind_vertex_buffers(&self, _first_binding: u32, buffers: &[vk::Buffer], _offsets: &[vk::DeviceSize]) {
        self.push(Recorded::BindVertexBuffer(buffers[0]));
    }

    fn cmd_bind_index_buffer(&self, buffer: vk::Buffer, _offset: vk::DeviceSize, _index_type: vk::IndexType) {
        self.push(Recorded::BindIndexBuffer(buffer));
    }

    fn cmd_draw(&self, vertex_count: u32, _instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.push(Recorded::Draw { vertex_count });
    }

    fn cmd_draw_indexed(
        &self,
        index_count: u32,
        _instance_count: u32,
        _first_index: u32,
        _vertex_offset: i32,
        _first_instance: u32,
    ) {
        self.push(Recorded::DrawIndexed { index_count });
    }
}

/// 可以模拟 resize 与 out of date 的 render target
pub struct MockTarget {
    pub available: bool,
    pub out_of_date_on_present: bool,
    pub recreate_count: usize,
    pub recorder: RecordingCommands,
    events: RefCell<Vec<&'static str>>,
}
impl Default for MockTarget {
    fn default() -> Self {
        Self {
            available: true,
            out_of_date_on_present: false,
            recreate_count: 0,
            recorder: RecordingCommands::default(),
            events: RefCell::new(vec![]),
        }
    }
}
impl MockTarget {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.borrow().clone()
    }

    fn log(&self, event: &'static str) {
        self.events.borrow_mut().push(event);
    }
}
impl RenderTarget for MockTarget {
    fn acquire_next_image(&mut self, frame_index: usize) -> GfxResult<Option<u32>> {
        self.log("acquire");
        Ok(self.available.then_some(frame_index as u32))
    }

    fn aspect_ratio(&self) -> f32 {
        16.0 / 9.0
    }

    fn render_pass(&self) -> vk::RenderPass {
        vk::RenderPass::null()
    }

    fn draw_commands(&self) -> &dyn DrawCommands {
        &self.recorder
    }

    fn begin_render_pass(&self, _frame: &AcquiredFrame) {
        self.log("begin_pass");
    }

    fn end_render_pass(&self, _frame: &AcquiredFrame) {
        self.log("end_pass");
    }

    fn present(&mut self, _frame: &AcquiredFrame) -> GfxResult<PresentStatus> {
        self.log("present");
        Ok(if self.out_of_date_on_present {
            PresentStatus::OutOfDate
        } else {
            PresentStatus::Presented
        })
    }

    fn recreate(&mut self) -> GfxResult<()> {
        self.log("recreate");
        self.recreate_count += 1;
        Ok(())
    }

    fn wait_idle(&self) -> GfxResult<()> {
        self.log("wait_idle");
        Ok(())
    }
}
