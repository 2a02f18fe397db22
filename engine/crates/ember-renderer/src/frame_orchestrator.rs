use ash::vk;
use ember_gfx::commands::draw_commands::DrawCommands;
use ember_gfx::{GfxError, GfxResult};

use crate::render_settings::FrameCounter;

/// present 的结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentStatus {
    Presented,
    /// 需要重建 target（例如窗口尺寸变化）
    OutOfDate,
}

/// swapchain 一侧的协作者：获取 image、render pass 的开始与结束、present、重建
///
/// 开始/结束 render pass 只录制命令，因此只需要共享引用；
/// 这样在整个 pass 期间，[`FrameInfo`](crate::frame_info::FrameInfo) 可以一直借用 [`Self::draw_commands`]。
pub trait RenderTarget {
    /// 返回 `Ok(None)` 表示 target 暂时不可用，跳过这一帧
    fn acquire_next_image(&mut self, frame_index: usize) -> GfxResult<Option<u32>>;

    fn aspect_ratio(&self) -> f32;

    /// 所有 pipeline 都兼容的 render pass
    fn render_pass(&self) -> vk::RenderPass;

    /// 当前帧的 command buffer
    fn draw_commands(&self) -> &dyn DrawCommands;

    /// 同时设置 viewport 与 scissor，它们在所有 pipeline 中都是 dynamic state
    fn begin_render_pass(&self, frame: &AcquiredFrame);

    fn end_render_pass(&self, frame: &AcquiredFrame);

    fn present(&mut self, frame: &AcquiredFrame) -> GfxResult<PresentStatus>;

    fn recreate(&mut self) -> GfxResult<()>;

    /// 等待设备空闲，之后才可以销毁任何 GPU 资源
    fn wait_idle(&self) -> GfxResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquiredFrame {
    pub frame_id: u64,
    pub frame_index: usize,
    pub image_index: u32,
}

/// Idle -> FrameAcquired -> PassActive -> Presented -> Idle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    FrameAcquired,
    PassActive,
    /// render pass 已结束，等待 present
    Presented,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("`{op}` is not allowed while the frame is {phase:?}")]
    InvalidTransition { op: &'static str, phase: FramePhase },

    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// 帧状态机
///
/// 所有 draw 都必须发生在 `PassActive` 阶段；资源重建只能在 `Idle` 阶段进行。
pub struct FrameOrchestrator {
    phase: FramePhase,
    frame: Option<AcquiredFrame>,
    counter: FrameCounter,
}
impl Default for FrameOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
// new & init
impl FrameOrchestrator {
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Idle,
            frame: None,
            counter: FrameCounter::new(0),
        }
    }
}
// getters
impl FrameOrchestrator {
    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    #[inline]
    pub fn current_frame(&self) -> Option<&AcquiredFrame> {
        self.frame.as_ref()
    }

    #[inline]
    pub fn frame_counter(&self) -> &FrameCounter {
        &self.counter
    }
}
// transitions
impl FrameOrchestrator {
    fn expect_phase(&self, expected: FramePhase, op: &'static str) -> Result<(), FrameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(FrameError::InvalidTransition { op, phase: self.phase })
        }
    }

    fn acquired(&self, op: &'static str) -> Result<AcquiredFrame, FrameError> {
        self.frame.ok_or(FrameError::InvalidTransition { op, phase: self.phase })
    }

    /// Idle -> FrameAcquired
    ///
    /// target 不可用时返回 `Ok(None)` 并保持 Idle，不留下任何这一帧的状态。
    pub fn begin_frame<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Result<Option<AcquiredFrame>, FrameError> {
        self.expect_phase(FramePhase::Idle, "begin_frame")?;

        let Some(image_index) = target.acquire_next_image(self.counter.frame_index())? else {
            log::debug!("{} render target unavailable, frame skipped", self.counter.frame_name());
            return Ok(None);
        };

        let frame = AcquiredFrame {
            frame_id: self.counter.frame_id(),
            frame_index: self.counter.frame_index(),
            image_index,
        };
        self.frame = Some(frame);
        self.phase = FramePhase::FrameAcquired;
        Ok(Some(frame))
    }

    /// FrameAcquired -> PassActive
    pub fn begin_render_pass<T: RenderTarget + ?Sized>(&mut self, target: &T) -> Result<(), FrameError> {
        self.expect_phase(FramePhase::FrameAcquired, "begin_render_pass")?;
        let frame = self.acquired("begin_render_pass")?;
        target.begin_render_pass(&frame);
        self.phase = FramePhase::PassActive;
        Ok(())
    }

    /// draw system 录制命令前的检查
    #[inline]
    pub fn ensure_pass_active(&self) -> Result<(), FrameError> {
        self.expect_phase(FramePhase::PassActive, "draw")
    }

    /// PassActive -> Presented
    pub fn end_render_pass<T: RenderTarget + ?Sized>(&mut self, target: &T) -> Result<(), FrameError> {
        self.expect_phase(FramePhase::PassActive, "end_render_pass")?;
        let frame = self.acquired("end_render_pass")?;
        target.end_render_pass(&frame);
        self.phase = FramePhase::Presented;
        Ok(())
    }

    /// Presented -> Idle
    ///
    /// target 过期时在这里重建，下一次循环照常进行。
    pub fn end_frame<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Result<PresentStatus, FrameError> {
        self.expect_phase(FramePhase::Presented, "end_frame")?;
        let frame = self.acquired("end_frame")?;

        let status = target.present(&frame);
        self.frame = None;
        self.phase = FramePhase::Idle;
        self.counter.next_frame();

        let status = status?;
        if status == PresentStatus::OutOfDate {
            log::info!("render target out of date, recreating");
            target.recreate()?;
        }
        Ok(status)
    }

    /// 放弃已经获取但无法完成的帧，回到 Idle
    pub fn abandon_frame(&mut self) {
        if self.phase != FramePhase::Idle {
            log::warn!("{} abandoned in phase {:?}", self.counter.frame_name(), self.phase);
        }
        self.frame = None;
        self.phase = FramePhase::Idle;
    }

    /// 只能在 Idle 阶段调用：等待设备空闲 -> 重建 target -> 重建 descriptor pool、layout 与 pipeline
    pub fn reset_resources<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        rebuild: impl FnOnce(&T) -> GfxResult<()>,
    ) -> Result<(), FrameError> {
        self.expect_phase(FramePhase::Idle, "reset_resources")?;
        let _span = tracy_client::span!("FrameOrchestrator::reset_resources");

        target.wait_idle()?;
        target.recreate()?;
        rebuild(target)?;
        log::info!("render resources rebuilt at {}", self.counter.frame_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTarget;

    fn assert_invalid(result: Result<impl std::fmt::Debug, FrameError>, expected_phase: FramePhase) {
        match result {
            Err(FrameError::InvalidTransition { phase, .. }) => assert_eq!(phase, expected_phase),
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut target = MockTarget::default();
        let mut orchestrator = FrameOrchestrator::new();

        let frame = orchestrator.begin_frame(&mut target).unwrap().unwrap();
        assert_eq!(frame.frame_index, 0);
        assert_eq!(orchestrator.phase(), FramePhase::FrameAcquired);
        orchestrator.begin_render_pass(&target).unwrap();
        assert!(orchestrator.ensure_pass_active().is_ok());
        orchestrator.end_render_pass(&target).unwrap();
        assert_eq!(orchestrator.phase(), FramePhase::Presented);
        assert_eq!(orchestrator.end_frame(&mut target).unwrap(), PresentStatus::Presented);
        assert_eq!(orchestrator.phase(), FramePhase::Idle);

        let next = orchestrator.begin_frame(&mut target).unwrap().unwrap();
        assert_eq!(next.frame_index, 1);
        assert_eq!(target.events(), vec!["acquire", "begin_pass", "end_pass", "present", "acquire"]);
    }

    #[test]
    fn draws_outside_pass_are_rejected() {
        let mut target = MockTarget::default();
        let mut orchestrator = FrameOrchestrator::new();

        assert_invalid(orchestrator.ensure_pass_active(), FramePhase::Idle);
        assert_invalid(orchestrator.begin_render_pass(&target), FramePhase::Idle);
        orchestrator.begin_frame(&mut target).unwrap();
        assert_invalid(orchestrator.ensure_pass_active(), FramePhase::FrameAcquired);
        assert_invalid(orchestrator.end_frame(&mut target), FramePhase::FrameAcquired);
        assert_invalid(orchestrator.begin_frame(&mut target), FramePhase::FrameAcquired);
    }

    #[test]
    fn unavailable_target_skips_frame_without_residue() {
        let mut target = MockTarget::default();
        let mut orchestrator = FrameOrchestrator::new();

        // resize 进行中
        target.available = false;
        assert_eq!(orchestrator.begin_frame(&mut target).unwrap(), None);
        assert_eq!(orchestrator.phase(), FramePhase::Idle);
        assert!(orchestrator.current_frame().is_none());
        assert_eq!(orchestrator.frame_counter().frame_id(), 0);

        target.recreate().unwrap();
        target.available = true;
        let frame = orchestrator.begin_frame(&mut target).unwrap().unwrap();
        assert_eq!(frame.frame_id, 0);
        assert_eq!(frame.frame_index, 0);
        assert_eq!(orchestrator.phase(), FramePhase::FrameAcquired);
    }

    #[test]
    fn out_of_date_present_recreates_target() {
        let mut target = MockTarget::default();
        let mut orchestrator = FrameOrchestrator::new();
        target.out_of_date_on_present = true;

        orchestrator.begin_frame(&mut target).unwrap();
        orchestrator.begin_render_pass(&target).unwrap();
        orchestrator.end_render_pass(&target).unwrap();
        assert_eq!(orchestrator.end_frame(&mut target).unwrap(), PresentStatus::OutOfDate);
        assert_eq!(orchestrator.phase(), FramePhase::Idle);
        assert_eq!(target.recreate_count, 1);
    }

    #[test]
    fn reset_only_from_idle() {
        let mut target = MockTarget::default();
        let mut orchestrator = FrameOrchestrator::new();

        orchestrator.begin_frame(&mut target).unwrap();
        let mut rebuilt = false;
        assert_invalid(
            orchestrator.reset_resources(&mut target, |_| {
                rebuilt = true;
                Ok(())
            }),
            FramePhase::FrameAcquired,
        );
        assert!(!rebuilt);

        orchestrator.abandon_frame();
        orchestrator
            .reset_resources(&mut target, |_| {
                rebuilt = true;
                Ok(())
            })
            .unwrap();
        assert!(rebuilt);
        assert_eq!(target.recreate_count, 1);
        assert!(target.events().ends_with(&["wait_idle", "recreate"]));
    }
}
