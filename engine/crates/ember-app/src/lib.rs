//! 窗口、surface 与 swapchain 由外部提供，通过 [`RenderTarget`](ember_renderer::RenderTarget) 接入；
//! 这里只负责把输入、渲染命令与帧循环串起来。

pub mod app;
pub mod default_scene;
pub mod input_controller;
pub mod platform;
pub mod render_command;
