use ash::vk;
use ember_gfx::commands::draw_commands::DrawCommands;
use ember_scene::camera::Camera;
use ember_scene::entity_store::EntityStore;
use ember_scene::guid_new_type::MeshHandle;
use slotmap::SecondaryMap;

/// 一帧内传递给所有 draw system 的上下文，只在这一帧内存活
///
/// 绘制阶段场景只读，所以这里持有的是 [`EntityStore`] 的共享引用。
pub struct FrameInfo<'a> {
    /// 当前 in-flight 槽位
    pub frame_index: usize,
    /// 上一帧到这一帧的时间，秒
    pub frame_time: f32,
    pub cmd: &'a dyn DrawCommands,
    pub camera: &'a Camera,
    /// set 0：全局 uniform + skybox
    pub global_descriptor_set: vk::DescriptorSet,
    /// set 1：每个网格一个的纹理 set
    pub texture_descriptor_sets: &'a SecondaryMap<MeshHandle, vk::DescriptorSet>,
    pub scene: &'a EntityStore,
}
