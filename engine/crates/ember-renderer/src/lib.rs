//! 单线程的帧渲染
//!
//! 每帧的流程：获取 render target -> light system 更新全局 uniform -> flush ->
//! 开始 render pass -> skybox -> 不透明物体 -> 点光源 -> 结束 render pass -> present。

pub mod config;
pub mod frame_info;
pub mod frame_orchestrator;
pub mod global_ubo;
pub mod render_settings;
pub mod scene_renderer;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::RendererConfig;
pub use frame_orchestrator::{FrameError, FrameOrchestrator, FramePhase, PresentStatus, RenderTarget};
