//! Vulkan 资源层
//!
//! 提供 buffer / image / texture / cubemap 的生命周期封装、描述符分配器以及图形管线的构建。
//! 所有资源都持有 `Rc<GfxDevice>`，保证设备上下文晚于资源销毁；不存在全局单例。

pub mod commands;
pub mod descriptors;
pub mod error;
pub mod foundation;
pub mod pipelines;
pub mod resources;
pub mod sampler;

pub use error::{GfxError, GfxResult};
