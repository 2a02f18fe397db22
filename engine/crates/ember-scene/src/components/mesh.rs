use ash::vk;
use ember_gfx::resources::buffer::GfxBuffer;

use crate::components::vertex::Vertex;
use crate::guid_new_type::{MeshHandle, TextureHandle};

/// 录制 draw 时需要的最小信息
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshDrawInfo {
    pub vertex_buffer: vk::Buffer,
    pub vertex_count: u32,
    /// (index buffer, index 数量)；没有 index 时使用非 indexed 的 draw
    pub index_buffer: Option<(vk::Buffer, u32)>,
}

/// 网格在 device local 内存中的 buffer，随网格一起销毁
pub struct MeshBuffers {
    pub vertex: GfxBuffer,
    pub index: Option<GfxBuffer>,
}

/// 上传完成后不可变的网格
pub struct Mesh {
    pub name: String,
    pub draw: MeshDrawInfo,
    pub diffuse: Option<TextureHandle>,
    buffers: Option<MeshBuffers>,
}
// new & init
impl Mesh {
    pub fn from_buffers(name: impl Into<String>, buffers: MeshBuffers, diffuse: Option<TextureHandle>) -> Self {
        let draw = MeshDrawInfo {
            vertex_buffer: buffers.vertex.vk_buffer(),
            vertex_count: buffers.vertex.size() as u32 / size_of::<Vertex>() as u32,
            index_buffer: buffers
                .index
                .as_ref()
                .map(|index| (index.vk_buffer(), index.size() as u32 / size_of::<u32>() as u32)),
        };
        Self {
            name: name.into(),
            draw,
            diffuse,
            buffers: Some(buffers),
        }
    }

    /// 只有绘制信息、不持有 GPU 内存的网格
    pub fn from_draw_info(name: impl Into<String>, draw: MeshDrawInfo, diffuse: Option<TextureHandle>) -> Self {
        Self {
            name: name.into(),
            draw,
            diffuse,
            buffers: None,
        }
    }
}
// getters
impl Mesh {
    #[inline]
    pub fn buffers(&self) -> Option<&MeshBuffers> {
        self.buffers.as_ref()
    }
}

/// 一个模型由一个或多个子网格组成（例如 obj 中的多个 shape）
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<MeshHandle>,
}
impl Model {
    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}
