use std::path::{Path, PathBuf};
use std::rc::Rc;

use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::resources::cubemap::{CUBE_FACE_COUNT, CubemapFaces, GfxCubemap};
use ember_gfx::resources::texture::GfxTexture;
use image::RgbaImage;

use crate::error::{AssetError, AssetResult};

/// 解码为 RGBA8
pub fn load_rgba8(path: &Path) -> AssetResult<RgbaImage> {
    let img = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgba8())
}

pub fn load_texture(device: &Rc<GfxDevice>, path: &Path) -> AssetResult<GfxTexture> {
    let _span = tracy_client::span!("load_texture");

    let pixels = load_rgba8(path)?;
    let name = path.to_string_lossy();
    GfxTexture::from_rgba8(device, pixels.width(), pixels.height(), pixels.as_raw(), &name)
        .map_err(AssetError::gpu(name))
}

/// 按 left, right, bottom, top, front, back 的顺序解码六个面并做朝向修正
///
/// 尺寸不一致时在创建任何 GPU 资源之前失败。
pub fn load_cubemap_faces(paths: &[PathBuf; CUBE_FACE_COUNT]) -> AssetResult<CubemapFaces> {
    let [left, right, bottom, top, front, back] = paths.each_ref().map(|path| load_rgba8(path));
    CubemapFaces::new([left?, right?, bottom?, top?, front?, back?]).map_err(AssetError::Cubemap)
}

pub fn load_cubemap(
    device: &Rc<GfxDevice>,
    paths: &[PathBuf; CUBE_FACE_COUNT],
    name: &str,
) -> AssetResult<GfxCubemap> {
    let _span = tracy_client::span!("load_cubemap");

    let faces = load_cubemap_faces(paths)?;
    GfxCubemap::new(device, &faces, name).map_err(AssetError::gpu(name))
}
