use std::rc::Rc;

use ash::vk;
use vk_mem::Alloc;

use crate::commands::barrier::GfxImageBarrier;
use crate::commands::command_buffer::GfxCommandBuffer;
use crate::error::{GfxError, GfxResult};
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;
use crate::resources::buffer::GfxBuffer;

/// RGBA8 每个像素的字节数
pub const RGBA8_PIXEL_SIZE: usize = 4;

/// 由 VMA 分配的 image，drop 时一起释放 image 与背后的内存
pub struct GfxImage {
    handle: vk::Image,
    allocation: vk_mem::Allocation,

    extent: vk::Extent3D,
    format: vk::Format,
    layer_count: u32,

    device: Rc<GfxDevice>,
    name: String,
}
// getter
impl GfxImage {
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }
}
// new & init
impl GfxImage {
    pub fn new(
        device: &Rc<GfxDevice>,
        image_info: &GfxImageCreateInfo,
        alloc_info: &vk_mem::AllocationCreateInfo,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let (handle, allocation) = unsafe { device.allocator().create_image(&image_info.inner, alloc_info)? };
        let image = Self {
            handle,
            allocation,
            extent: image_info.inner.extent,
            format: image_info.inner.format,
            layer_count: image_info.inner.array_layers,
            device: device.clone(),
            name: debug_name.to_string(),
        };
        device.set_debug_name(&image, debug_name);
        Ok(image)
    }

    /// 创建 device local 的 image，并把按 layer 顺序排列的 RGBA8 像素上传进去
    ///
    /// 上传完成后 image 处于 SHADER_READ_ONLY_OPTIMAL
    pub fn from_rgba8(
        device: &Rc<GfxDevice>,
        image_info: &GfxImageCreateInfo,
        data: &[u8],
        name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxImage::from_rgba8");

        // 在创建任何 GPU 资源之前检查数据大小
        let expected = image_info.rgba8_byte_size();
        if data.len() != expected {
            return Err(GfxError::PixelDataSize { expected, actual: data.len() });
        }

        let image = Self::new(
            device,
            image_info,
            &vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::AutoPreferDevice,
                ..Default::default()
            },
            name.as_ref(),
        )?;

        let stage_buffer =
            GfxBuffer::new_stage_buffer(device, data.len() as vk::DeviceSize, format!("{}-stage", name.as_ref()))?;
        stage_buffer.write_bytes(0, data)?;
        stage_buffer.flush_all()?;

        device.one_time_exec(|cmd| image.record_upload(cmd, &stage_buffer), name.as_ref())?;

        Ok(image)
    }
}
impl DebugType for GfxImage {
    fn debug_type_name() -> &'static str {
        "GfxImage"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxImage {
    fn drop(&mut self) {
        log::debug!("Destroying GfxImage: {}", self.name);
        unsafe { self.device.allocator().destroy_image(self.handle, &mut self.allocation) };
    }
}
// tools
impl GfxImage {
    /// # 实现步骤
    /// 1. 布局转换 UNDEFINED -> TRANSFER_DST
    /// 2. 将 stage buffer 的数据复制到所有 layer
    /// 3. 布局转换 TRANSFER_DST -> SHADER_READ_ONLY，让 fragment shader 可读
    fn record_upload(&self, command_buffer: &GfxCommandBuffer, stage_buffer: &GfxBuffer) {
        let to_transfer_dst = GfxImageBarrier::new()
            .image(self.handle)
            .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
            .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
            .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layer_count(self.layer_count);
        command_buffer.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&to_transfer_dst));

        let buffer_image_copy = vk::BufferImageCopy2::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(self.extent)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: self.layer_count,
            });
        command_buffer.cmd_copy_buffer_to_image(
            &vk::CopyBufferToImageInfo2::default()
                .src_buffer(stage_buffer.vk_buffer())
                .dst_image(self.handle)
                .dst_image_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .regions(std::slice::from_ref(&buffer_image_copy)),
        );

        let to_shader_read = GfxImageBarrier::new()
            .image(self.handle)
            .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
            .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_READ)
            .layout_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layer_count(self.layer_count);
        command_buffer.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&to_shader_read));
    }
}

pub struct GfxImageCreateInfo {
    inner: vk::ImageCreateInfo<'static>,
}
impl GfxImageCreateInfo {
    #[inline]
    pub fn new_image_2d_info(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            inner: vk::ImageCreateInfo {
                image_type: vk::ImageType::TYPE_2D,
                format,
                extent: extent.into(),
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                usage,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                // 只能是 UNDEFINED 或者 PREINITIALIZED
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            },
        }
    }

    /// 6 个 layer，可以创建 CUBE 类型的 view
    #[inline]
    pub fn new_cube_info(face_extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        let mut info = Self::new_image_2d_info(face_extent, format, usage);
        info.inner.array_layers = 6;
        info.inner.flags = vk::ImageCreateFlags::CUBE_COMPATIBLE;
        info
    }

    #[inline]
    pub fn as_info(&self) -> &vk::ImageCreateInfo<'static> {
        &self.inner
    }

    /// 全部 layer 按 RGBA8 计算的字节数
    #[inline]
    pub fn rgba8_byte_size(&self) -> usize {
        let extent = self.inner.extent;
        extent.width as usize * extent.height as usize * self.inner.array_layers as usize * RGBA8_PIXEL_SIZE
    }
}
