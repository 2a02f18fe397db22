use std::mem::offset_of;

use ash::vk;
use glam::{Vec2, Vec3};

/// 网格顶点：位置、颜色、法线、uv，依次对应 location 0..3
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}
impl Vertex {
    pub fn binding_descriptions() -> Vec<vk::VertexInputBindingDescription> {
        vec![
            vk::VertexInputBindingDescription::default()
                .binding(0)
                .stride(size_of::<Self>() as u32)
                .input_rate(vk::VertexInputRate::VERTEX),
        ]
    }

    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        let attr = |location: u32, format: vk::Format, offset: usize| {
            vk::VertexInputAttributeDescription::default()
                .binding(0)
                .location(location)
                .format(format)
                .offset(offset as u32)
        };
        vec![
            attr(0, vk::Format::R32G32B32_SFLOAT, offset_of!(Self, position)),
            attr(1, vk::Format::R32G32B32_SFLOAT, offset_of!(Self, color)),
            attr(2, vk::Format::R32G32B32_SFLOAT, offset_of!(Self, normal)),
            attr(3, vk::Format::R32G32_SFLOAT, offset_of!(Self, uv)),
        ]
    }

    /// 按位比较时使用的 key，用于顶点去重
    pub fn bit_key(&self) -> [u32; 11] {
        let mut key = [0u32; 11];
        for (dst, src) in key.iter_mut().zip(bytemuck::cast_slice::<Self, f32>(std::slice::from_ref(self))) {
            *dst = src.to_bits();
        }
        key
    }
}
