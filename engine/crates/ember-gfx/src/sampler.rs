use std::rc::Rc;

use ash::vk;

use crate::error::GfxResult;
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GfxSamplerDesc {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub address_mode: vk::SamplerAddressMode,
    /// 0 表示不开启各向异性过滤；创建时会被限制在设备上限内
    pub max_anisotropy: f32,
    pub mipmap_mode: vk::SamplerMipmapMode,
    pub border_color: vk::BorderColor,
}
impl Default for GfxSamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            address_mode: vk::SamplerAddressMode::REPEAT,
            max_anisotropy: 16.0,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            border_color: vk::BorderColor::INT_OPAQUE_BLACK,
        }
    }
}
impl GfxSamplerDesc {
    /// skybox 使用：边缘 clamp，避免面与面之间出现接缝
    pub fn cubemap() -> Self {
        Self {
            address_mode: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            border_color: vk::BorderColor::INT_OPAQUE_WHITE,
            ..Default::default()
        }
    }

    fn effective_anisotropy(&self, device_limit: f32) -> Option<f32> {
        (self.max_anisotropy > 0.0 && device_limit > 0.0).then(|| self.max_anisotropy.min(device_limit))
    }
}

pub struct GfxSampler {
    handle: vk::Sampler,
    device: Rc<GfxDevice>,
}
// new & init
impl GfxSampler {
    pub fn new(device: &Rc<GfxDevice>, desc: &GfxSamplerDesc, name: impl AsRef<str>) -> GfxResult<Self> {
        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(desc.mag_filter)
            .min_filter(desc.min_filter)
            .address_mode_u(desc.address_mode)
            .address_mode_v(desc.address_mode)
            .address_mode_w(desc.address_mode)
            .mipmap_mode(desc.mipmap_mode)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(desc.border_color)
            .compare_enable(false)
            .unnormalized_coordinates(false);

        create_info = match desc.effective_anisotropy(device.max_sampler_anisotropy()) {
            Some(anisotropy) => create_info.anisotropy_enable(true).max_anisotropy(anisotropy),
            None => create_info.anisotropy_enable(false),
        };

        let handle = unsafe { device.create_sampler(&create_info, None)? };
        let sampler = Self {
            handle,
            device: device.clone(),
        };
        device.set_debug_name(&sampler, name);
        Ok(sampler)
    }
}
// getters
impl GfxSampler {
    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}
impl Drop for GfxSampler {
    fn drop(&mut self) {
        unsafe { self.device.destroy_sampler(self.handle, None) };
    }
}
impl DebugType for GfxSampler {
    fn debug_type_name() -> &'static str {
        "GfxSampler"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
