use std::rc::Rc;

use ash::vk;

use crate::error::GfxResult;
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;

pub struct GfxImageView {
    handle: vk::ImageView,

    desc: GfxImageViewDesc,

    device: Rc<GfxDevice>,
    name: String,
}
impl DebugType for GfxImageView {
    fn debug_type_name() -> &'static str {
        "GfxImageView"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// new & init
impl GfxImageView {
    pub fn new(
        device: &Rc<GfxDevice>,
        image: vk::Image,
        view_desc: GfxImageViewDesc,
        name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let info = vk::ImageViewCreateInfo {
            image,
            view_type: view_desc.view_type,
            format: view_desc.format,
            subresource_range: view_desc.subresource_range(),
            ..Default::default()
        };

        let handle = unsafe { device.create_image_view(&info, None)? };
        let image_view = Self {
            handle,
            desc: view_desc,
            device: device.clone(),
            name: name.as_ref().to_string(),
        };
        device.set_debug_name(&image_view, &name);
        Ok(image_view)
    }
}
impl Drop for GfxImageView {
    fn drop(&mut self) {
        log::debug!("Destroying GfxImageView: {}", self.name);
        unsafe { self.device.destroy_image_view(self.handle, None) };
    }
}
// getters
impl GfxImageView {
    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &GfxImageViewDesc {
        &self.desc
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxImageViewDesc {
    format: vk::Format,
    view_type: vk::ImageViewType,
    aspect_mask: vk::ImageAspectFlags,
    /// base layer 和 layer count
    layer: (u32, u32),
}
impl GfxImageViewDesc {
    pub fn new_2d(format: vk::Format, aspect: vk::ImageAspectFlags) -> Self {
        Self {
            format,
            view_type: vk::ImageViewType::TYPE_2D,
            aspect_mask: aspect,
            layer: (0, 1),
        }
    }

    /// 覆盖全部 6 个 layer 的 CUBE view
    pub fn new_cube(format: vk::Format) -> Self {
        Self {
            format,
            view_type: vk::ImageViewType::CUBE,
            aspect_mask: vk::ImageAspectFlags::COLOR,
            layer: (0, 6),
        }
    }

    #[inline]
    pub fn view_type(&self) -> vk::ImageViewType {
        self.view_type
    }

    #[inline]
    pub fn layer_range(&self) -> (u32, u32) {
        self.layer
    }

    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: self.layer.0,
            layer_count: self.layer.1,
        }
    }
}
