use std::rc::Rc;

use ash::vk;
use image::RgbaImage;
use image::imageops::{flip_horizontal_in_place, flip_vertical_in_place};

use crate::error::{GfxError, GfxResult};
use crate::foundation::device::GfxDevice;
use crate::resources::image::{GfxImage, GfxImageCreateInfo};
use crate::resources::image_view::{GfxImageView, GfxImageViewDesc};
use crate::resources::texture::TEXTURE_FORMAT;
use crate::sampler::{GfxSampler, GfxSamplerDesc};

pub const CUBE_FACE_COUNT: usize = 6;

/// cube 的 layer 顺序：left, right, bottom, top, front, back
///
/// 引擎坐标系为 +X 右，-Y 上，+Z 前；第 3 个 layer 对应 "top" 面
pub const CUBE_FACE_NAMES: [&str; CUBE_FACE_COUNT] = ["left", "right", "bottom", "top", "front", "back"];
const TOP_FACE: usize = 3;

/// 已经校验过尺寸、并做过翻转修正的 6 个面
///
/// 构造成功之后才会去创建 GPU 资源，尺寸不一致时不会产生任何 GPU image
#[derive(Debug)]
pub struct CubemapFaces {
    width: u32,
    height: u32,
    /// 按 layer 顺序排列的 RGBA8 像素
    pixels: Vec<u8>,
}
impl CubemapFaces {
    pub fn new(mut faces: [RgbaImage; CUBE_FACE_COUNT]) -> GfxResult<Self> {
        let expected = faces[0].dimensions();
        if let Some((face, img)) = faces.iter().enumerate().find(|(_, img)| img.dimensions() != expected) {
            return Err(GfxError::CubemapFaceMismatch {
                face,
                expected,
                actual: img.dimensions(),
            });
        }

        for (face, img) in faces.iter_mut().enumerate() {
            flip_vertical_in_place(img);
            if face == TOP_FACE {
                flip_horizontal_in_place(img);
                flip_vertical_in_place(img);
            }
        }

        let (width, height) = expected;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4 * CUBE_FACE_COUNT);
        faces.iter().for_each(|img| pixels.extend_from_slice(img.as_raw()));

        Ok(Self { width, height, pixels })
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    /// 第 `face` 个面的像素，`face` 超出 [`CUBE_FACE_COUNT`] 时返回 `None`
    pub fn face_pixels(&self, face: usize) -> Option<&[u8]> {
        let face_size = self.width as usize * self.height as usize * 4;
        self.pixels.get(face * face_size..(face + 1) * face_size)
    }
}

/// skybox 使用的 cube 纹理：6 个 layer 的 image + CUBE view + clamp sampler
///
/// 字段顺序即销毁顺序：sampler -> view -> image
pub struct GfxCubemap {
    sampler: GfxSampler,
    image_view: GfxImageView,
    _image: GfxImage,
}
impl GfxCubemap {
    pub fn new(device: &Rc<GfxDevice>, faces: &CubemapFaces, name: impl AsRef<str>) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxCubemap::new");
        let name = name.as_ref();

        let image_info = GfxImageCreateInfo::new_cube_info(
            faces.extent(),
            TEXTURE_FORMAT,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
        );
        let image = GfxImage::from_rgba8(device, &image_info, &faces.pixels, name)?;
        let image_view = GfxImageView::new(device, image.handle(), GfxImageViewDesc::new_cube(TEXTURE_FORMAT), name)?;
        let sampler = GfxSampler::new(device, &GfxSamplerDesc::cubemap(), name)?;

        log::info!("cubemap created: {} ({}x{} per face)", name, faces.width, faces.height);
        Ok(Self {
            sampler,
            image_view,
            _image: image,
        })
    }

    #[inline]
    pub fn descriptor_image_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler.handle())
            .image_view(self.image_view.handle())
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 2x2 的面，四个像素分别为 (face, 0..4)
    fn face(face: u8) -> RgbaImage {
        RgbaImage::from_fn(2, 2, |x, y| Rgba([face, (y * 2 + x) as u8, 0, 255]))
    }

    fn faces() -> [RgbaImage; CUBE_FACE_COUNT] {
        std::array::from_fn(|i| face(i as u8))
    }

    fn pixel_ids(faces: &CubemapFaces, face: usize) -> Vec<u8> {
        faces.face_pixels(face).unwrap().chunks(4).map(|p| p[1]).collect()
    }

    #[test]
    fn mismatched_face_is_rejected() {
        let mut input = faces();
        input[4] = RgbaImage::new(4, 2);
        let err = CubemapFaces::new(input).unwrap_err();
        match err {
            GfxError::CubemapFaceMismatch { face, expected, actual } => {
                assert_eq!(face, 4);
                assert_eq!(expected, (2, 2));
                assert_eq!(actual, (4, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn regular_faces_are_flipped_vertically() {
        let faces = CubemapFaces::new(faces()).unwrap();
        // 原始行序 [0 1] [2 3]，垂直翻转后为 [2 3] [0 1]
        for face in [0, 1, 2, 4, 5] {
            assert_eq!(pixel_ids(&faces, face), vec![2, 3, 0, 1]);
        }
    }

    #[test]
    fn top_face_ends_up_mirrored_horizontally() {
        let faces = CubemapFaces::new(faces()).unwrap();
        // 垂直翻转两次相互抵消，只剩下水平翻转
        assert_eq!(pixel_ids(&faces, TOP_FACE), vec![1, 0, 3, 2]);
    }

    #[test]
    fn faces_are_packed_in_layer_order() {
        let faces = CubemapFaces::new(faces()).unwrap();
        assert_eq!(faces.extent(), vk::Extent2D { width: 2, height: 2 });
        for i in 0..CUBE_FACE_COUNT {
            assert!(faces.face_pixels(i).unwrap().chunks(4).all(|p| p[0] == i as u8));
        }
    }

    #[test]
    fn face_index_past_last_layer_is_none() {
        let faces = CubemapFaces::new(faces()).unwrap();
        assert!(faces.face_pixels(CUBE_FACE_COUNT - 1).is_some());
        assert_eq!(faces.face_pixels(CUBE_FACE_COUNT), None);
        assert_eq!(faces.face_pixels(usize::MAX / 2), None);
    }
}
