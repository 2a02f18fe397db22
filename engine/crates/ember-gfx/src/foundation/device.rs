use std::cell::Cell;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::ops::Deref;

use ash::vk;

use crate::commands::command_buffer::GfxCommandBuffer;
use crate::error::GfxResult;
use crate::foundation::debug_utils::DebugType;

/// 从外部 device 管理者处接收的句柄
///
/// instance / physical device / logical device 的创建与销毁都不在本层，
/// `ash::Device` 必须晚于 [`GfxDevice`] 销毁。
pub struct GfxDeviceCreateInfo<'a> {
    pub instance: &'a ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub gfx_queue_family_index: u32,
    pub gfx_queue: vk::Queue,
    /// instance 是否启用了 VK_EXT_debug_utils
    pub debug_utils: bool,
}

/// 渲染使用的设备上下文
///
/// 包含逻辑设备、VMA 分配器、图形队列、用于一次性命令的 command pool，
/// 以及运行时可调整的 MSAA 采样数。通过 `Rc<GfxDevice>` 在资源之间共享。
pub struct GfxDevice {
    device: ash::Device,
    allocator: ManuallyDrop<vk_mem::Allocator>,
    debug_utils: Option<ash::ext::debug_utils::Device>,

    gfx_queue: vk::Queue,
    one_time_pool: vk::CommandPool,

    limits: vk::PhysicalDeviceLimits,
    msaa_samples: Cell<vk::SampleCountFlags>,
}
// new & init
impl GfxDevice {
    pub fn new(ci: GfxDeviceCreateInfo) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxDevice::new");

        let mut vma_ci = vk_mem::AllocatorCreateInfo::new(ci.instance, &ci.device, ci.physical_device);
        vma_ci.vulkan_api_version = vk::API_VERSION_1_3;
        let allocator = unsafe { vk_mem::Allocator::new(vma_ci)? };

        let pool_ci = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ci.gfx_queue_family_index)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let one_time_pool = unsafe { ci.device.create_command_pool(&pool_ci, None)? };

        let limits = unsafe { ci.instance.get_physical_device_properties(ci.physical_device) }.limits;
        let debug_utils = ci.debug_utils.then(|| ash::ext::debug_utils::Device::new(ci.instance, &ci.device));

        log::info!(
            "gfx device ready, max usable msaa: {:?}, max anisotropy: {}",
            max_usable_sample_count(&limits),
            limits.max_sampler_anisotropy
        );

        Ok(Self {
            device: ci.device,
            allocator: ManuallyDrop::new(allocator),
            debug_utils,
            gfx_queue: ci.gfx_queue,
            one_time_pool,
            limits,
            msaa_samples: Cell::new(vk::SampleCountFlags::TYPE_1),
        })
    }
}
// getters
impl GfxDevice {
    #[inline]
    pub fn allocator(&self) -> &vk_mem::Allocator {
        &self.allocator
    }

    #[inline]
    pub fn gfx_queue(&self) -> vk::Queue {
        self.gfx_queue
    }

    #[inline]
    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.limits
    }

    #[inline]
    pub fn max_sampler_anisotropy(&self) -> f32 {
        self.limits.max_sampler_anisotropy
    }

    /// 当前 pipeline 使用的 MSAA 采样数
    #[inline]
    pub fn msaa_samples(&self) -> vk::SampleCountFlags {
        self.msaa_samples.get()
    }
}
// msaa
impl GfxDevice {
    /// 设置 MSAA 采样数，超过设备上限时会被降到可用的最大值
    ///
    /// 只影响之后创建的 pipeline，已有的 pipeline 需要重建
    pub fn set_msaa_samples(&self, requested: vk::SampleCountFlags) -> vk::SampleCountFlags {
        let supported =
            self.limits.framebuffer_color_sample_counts & self.limits.framebuffer_depth_sample_counts;
        let actual = clamp_sample_count(requested, supported);
        if actual != requested {
            log::warn!("msaa {:?} is not supported, fall back to {:?}", requested, actual);
        }
        self.msaa_samples.set(actual);
        actual
    }
}
// tools
impl GfxDevice {
    /// 录制并同步执行一段一次性命令，返回时 GPU 已经执行完毕
    pub fn one_time_exec<F, R>(&self, func: F, name: impl AsRef<str>) -> GfxResult<R>
    where
        F: FnOnce(&GfxCommandBuffer) -> R,
    {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.one_time_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let vk_cmd = unsafe { self.device.allocate_command_buffers(&alloc_info)?[0] };
        self.set_object_debug_name(vk_cmd, format!("one-time-{}", name.as_ref()));

        let submit = || -> GfxResult<R> {
            let cmd = GfxCommandBuffer::new(self, vk_cmd);
            cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
            let result = func(&cmd);
            cmd.end()?;

            let submit_info = vk::SubmitInfo::default().command_buffers(std::slice::from_ref(&vk_cmd));
            unsafe {
                self.device.queue_submit(self.gfx_queue, std::slice::from_ref(&submit_info), vk::Fence::null())?;
                self.device.queue_wait_idle(self.gfx_queue)?;
            }
            Ok(result)
        };
        let result = submit();

        unsafe { self.device.free_command_buffers(self.one_time_pool, &[vk_cmd]) };
        result
    }

    #[inline]
    pub fn wait_idle(&self) -> GfxResult<()> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    pub fn set_object_debug_name<T: vk::Handle>(&self, handle: T, name: impl AsRef<str>) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        let Ok(name) = CString::new(name.as_ref()) else {
            return;
        };
        let info = vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle);
        if let Err(e) = unsafe { debug_utils.set_debug_utils_object_name(&info) } {
            log::warn!("failed to set debug name {:?}: {}", name, e);
        }
    }

    #[inline]
    pub fn set_debug_name<T: DebugType>(&self, handle: &T, name: impl AsRef<str>) {
        self.set_object_debug_name(handle.vk_handle(), format!("{}::{}", T::debug_type_name(), name.as_ref()));
    }
}
impl Deref for GfxDevice {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}
impl Drop for GfxDevice {
    fn drop(&mut self) {
        log::info!("Destroying GfxDevice");
        unsafe {
            self.device.destroy_command_pool(self.one_time_pool, None);
            // allocator 必须在 device 销毁前释放
            ManuallyDrop::drop(&mut self.allocator);
        }
    }
}

/// 在 `supported` 中选出不超过 `requested` 的最大采样数
pub fn clamp_sample_count(requested: vk::SampleCountFlags, supported: vk::SampleCountFlags) -> vk::SampleCountFlags {
    SAMPLE_COUNTS_DESC
        .iter()
        .copied()
        .find(|&count| count.as_raw() <= requested.as_raw() && supported.contains(count))
        .unwrap_or(vk::SampleCountFlags::TYPE_1)
}

pub fn max_usable_sample_count(limits: &vk::PhysicalDeviceLimits) -> vk::SampleCountFlags {
    clamp_sample_count(
        vk::SampleCountFlags::TYPE_64,
        limits.framebuffer_color_sample_counts & limits.framebuffer_depth_sample_counts,
    )
}

const SAMPLE_COUNTS_DESC: [vk::SampleCountFlags; 7] = [
    vk::SampleCountFlags::TYPE_64,
    vk::SampleCountFlags::TYPE_32,
    vk::SampleCountFlags::TYPE_16,
    vk::SampleCountFlags::TYPE_8,
    vk::SampleCountFlags::TYPE_4,
    vk::SampleCountFlags::TYPE_2,
    vk::SampleCountFlags::TYPE_1,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_supported_request() {
        let supported = vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_2 | vk::SampleCountFlags::TYPE_4;
        assert_eq!(clamp_sample_count(vk::SampleCountFlags::TYPE_4, supported), vk::SampleCountFlags::TYPE_4);
        assert_eq!(clamp_sample_count(vk::SampleCountFlags::TYPE_2, supported), vk::SampleCountFlags::TYPE_2);
    }

    #[test]
    fn clamp_falls_back_to_highest_supported() {
        let supported = vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_2 | vk::SampleCountFlags::TYPE_4;
        assert_eq!(clamp_sample_count(vk::SampleCountFlags::TYPE_8, supported), vk::SampleCountFlags::TYPE_4);
        assert_eq!(clamp_sample_count(vk::SampleCountFlags::TYPE_8, vk::SampleCountFlags::empty()), vk::SampleCountFlags::TYPE_1);
    }

    #[test]
    fn max_usable_uses_color_and_depth_intersection() {
        let limits = vk::PhysicalDeviceLimits {
            framebuffer_color_sample_counts: vk::SampleCountFlags::TYPE_1
                | vk::SampleCountFlags::TYPE_4
                | vk::SampleCountFlags::TYPE_8,
            framebuffer_depth_sample_counts: vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_4,
            ..Default::default()
        };
        assert_eq!(max_usable_sample_count(&limits), vk::SampleCountFlags::TYPE_4);
    }
}
