//! CPU 侧的场景数据
//!
//! 实体只会在场景加载时追加，每帧由输入/动画原地修改，绘制阶段只读。

pub mod camera;
pub mod components;
pub mod entity_store;
pub mod guid_new_type;
pub mod texture_registry;
