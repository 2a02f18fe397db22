//! 文件解码与上传
//!
//! 所有加载都发生在渲染循环开始之前；任何失败都会带上出错的文件路径返回给调用者。

pub mod error;
pub mod image_loader;
pub mod obj_loader;

pub use error::{AssetError, AssetResult};
