pub mod light_system;
pub mod simple_render_system;
pub mod skybox_render_system;
