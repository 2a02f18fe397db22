use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ash::vk;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::resources::buffer::GfxBuffer;
use ember_gfx::resources::texture::GfxTexture;
use ember_scene::components::mesh::{Mesh, MeshBuffers};
use ember_scene::components::vertex::Vertex;
use ember_scene::texture_registry::TextureRegistry;
use glam::{Vec2, Vec3};

use crate::error::{AssetError, AssetResult};
use crate::image_loader::load_texture;

/// 一个 obj shape 解析后的 CPU 数据
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// 材质中的漫反射贴图，已解析为相对 obj 所在目录的路径
    pub diffuse_path: Option<PathBuf>,
}

/// 读取 obj 文件，每个 shape 生成一个 [`MeshData`]
pub fn load_obj(path: &Path) -> AssetResult<Vec<MeshData>> {
    let _span = tracy_client::span!("load_obj");

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ignore_lines: true,
            ignore_points: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    // 缺少 mtl 不是错误，只是没有贴图
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("no materials for {}: {}", path.display(), e);
        Vec::new()
    });
    log::info!("obj loaded: {} ({} shapes, {} materials)", path.display(), models.len(), materials.len());

    let obj_dir = path.parent().unwrap_or(Path::new(""));
    Ok(models
        .iter()
        .map(|model| mesh_data_from_obj(&model.name, &model.mesh, &materials, obj_dir))
        .collect())
}

/// 坐标修正：Y 与 Z 取反（+X 向右，-Y 向上，+Z 向前），v 翻转为 `1 - v`；
/// 相同顶点去重，并交换每个三角形的后两个 index 以保持正面朝向。
pub fn mesh_data_from_obj(name: &str, mesh: &tobj::Mesh, materials: &[tobj::Material], obj_dir: &Path) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::with_capacity(mesh.indices.len());
    let mut unique_vertices: HashMap<[u32; 11], u32> = HashMap::new();

    for &index in &mesh.indices {
        let i = index as usize;
        let vertex = Vertex {
            position: Vec3::new(mesh.positions[3 * i], -mesh.positions[3 * i + 1], -mesh.positions[3 * i + 2]),
            color: if mesh.vertex_color.len() >= 3 * i + 3 {
                Vec3::from_slice(&mesh.vertex_color[3 * i..3 * i + 3])
            } else {
                Vec3::ONE
            },
            normal: if mesh.normals.len() >= 3 * i + 3 {
                Vec3::new(mesh.normals[3 * i], -mesh.normals[3 * i + 1], -mesh.normals[3 * i + 2])
            } else {
                Vec3::ZERO
            },
            uv: if mesh.texcoords.len() >= 2 * i + 2 {
                Vec2::new(mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1])
            } else {
                Vec2::ZERO
            },
        };

        let next = vertices.len() as u32;
        let slot = *unique_vertices.entry(vertex.bit_key()).or_insert_with(|| {
            vertices.push(vertex);
            next
        });
        indices.push(slot);
    }

    for triangle in indices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }

    let diffuse_path = mesh
        .material_id
        .and_then(|id| materials.get(id))
        .and_then(|mat| mat.diffuse_texture.as_deref())
        .filter(|tex| !tex.is_empty())
        .map(|tex| obj_dir.join(tex));

    MeshData {
        name: name.to_string(),
        vertices,
        indices,
        diffuse_path,
    }
}

/// 把 [`MeshData`] 上传到 device local 的 buffer
///
/// 贴图经由 `textures` 去重加载；没有贴图的网格在绘制时使用注册表中的 fallback。
pub fn upload_mesh(
    device: &Rc<GfxDevice>,
    data: &MeshData,
    textures: &mut TextureRegistry<GfxTexture>,
) -> AssetResult<Mesh> {
    let _span = tracy_client::span!("upload_mesh");

    let vertex = GfxBuffer::new_device_local(
        device,
        &data.vertices,
        vk::BufferUsageFlags::VERTEX_BUFFER,
        format!("{}-vertex", data.name),
    )
    .map_err(AssetError::gpu(&data.name))?;
    let index = if data.indices.is_empty() {
        None
    } else {
        Some(
            GfxBuffer::new_device_local(
                device,
                &data.indices,
                vk::BufferUsageFlags::INDEX_BUFFER,
                format!("{}-index", data.name),
            )
            .map_err(AssetError::gpu(&data.name))?,
        )
    };

    let diffuse = data
        .diffuse_path
        .as_deref()
        .map(|path| textures.get_or_load(path, |path| load_texture(device, path)))
        .transpose()?;

    Ok(Mesh::from_buffers(&data.name, MeshBuffers { vertex, index }, diffuse))
}

/// 读取 obj 并上传其中的所有网格
pub fn load_model(
    device: &Rc<GfxDevice>,
    path: &Path,
    textures: &mut TextureRegistry<GfxTexture>,
) -> AssetResult<Vec<Mesh>> {
    load_obj(path)?
        .iter()
        .filter(|data| !data.vertices.is_empty())
        .map(|data| upload_mesh(device, data, textures))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> tobj::Mesh {
        // 两个三角形共享一条边
        tobj::Mesh {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 2.0, 3.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            normals: vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.25, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2, 0, 3, 1],
            material_id: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn axes_and_uv_are_flipped() {
        let data = mesh_data_from_obj("quad", &quad_mesh(), &[], Path::new(""));
        let v1 = data.vertices[data.indices[2] as usize];
        assert_eq!(v1.position, Vec3::new(1.0, -2.0, -3.0));
        assert_eq!(v1.normal, Vec3::new(0.0, -1.0, -1.0));
        assert_eq!(v1.uv, Vec2::new(1.0, 0.75));
        assert_eq!(v1.color, Vec3::ONE);
    }

    #[test]
    fn winding_is_reversed_and_vertices_deduplicated() {
        let data = mesh_data_from_obj("quad", &quad_mesh(), &[], Path::new(""));
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices, vec![0, 2, 1, 0, 1, 3]);
    }

    #[test]
    fn diffuse_is_relative_to_obj_dir() {
        let materials = vec![tobj::Material {
            diffuse_texture: Some("brick.png".to_string()),
            ..Default::default()
        }];
        let data = mesh_data_from_obj("quad", &quad_mesh(), &materials, Path::new("models/city"));
        assert_eq!(data.diffuse_path, Some(Path::new("models/city").join("brick.png")));

        let untextured = mesh_data_from_obj("quad", &quad_mesh(), &[], Path::new("models/city"));
        assert_eq!(untextured.diffuse_path, None);
    }

    #[test]
    fn missing_obj_is_an_error() {
        let err = load_obj(Path::new("no/such/model.obj")).unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }
}
