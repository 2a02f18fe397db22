use std::rc::Rc;

use ash::vk;

use crate::error::GfxResult;
use crate::foundation::device::GfxDevice;
use crate::resources::image::{GfxImage, GfxImageCreateInfo};
use crate::resources::image_view::{GfxImageView, GfxImageViewDesc};
use crate::sampler::{GfxSampler, GfxSamplerDesc};

/// 纹理使用的格式
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// image + view + sampler，创建后不可变
///
/// 字段顺序即销毁顺序：sampler -> view -> image（以及 image 背后的内存）
pub struct GfxTexture {
    sampler: GfxSampler,
    image_view: GfxImageView,
    _image: GfxImage,
}
// new & init
impl GfxTexture {
    /// 根据 RGBA8 像素创建 2D 纹理
    pub fn from_rgba8(
        device: &Rc<GfxDevice>,
        width: u32,
        height: u32,
        data: &[u8],
        name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let name = name.as_ref();
        let image_info = GfxImageCreateInfo::new_image_2d_info(
            vk::Extent2D { width, height },
            TEXTURE_FORMAT,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
        );
        let image = GfxImage::from_rgba8(device, &image_info, data, name)?;
        let image_view = GfxImageView::new(
            device,
            image.handle(),
            GfxImageViewDesc::new_2d(TEXTURE_FORMAT, vk::ImageAspectFlags::COLOR),
            name,
        )?;
        let sampler = GfxSampler::new(device, &GfxSamplerDesc::default(), name)?;

        log::info!("texture created: {} ({}x{})", name, width, height);
        Ok(Self {
            sampler,
            image_view,
            _image: image,
        })
    }
}
// getters
impl GfxTexture {
    #[inline]
    pub fn descriptor_image_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler.handle())
            .image_view(self.image_view.handle())
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }
}
