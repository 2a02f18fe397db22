pub mod buffer;
pub mod cubemap;
pub mod image;
pub mod image_view;
pub mod texture;
