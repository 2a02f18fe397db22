use std::rc::Rc;

use ash::vk;
use vk_mem::Alloc;

use crate::error::{GfxError, GfxResult};
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;

/// 由 VMA 分配的 buffer
///
/// 可以选择在创建时 map 到 host 地址空间，用于每帧反复写入的 uniform buffer；
/// 写入之后需要显式调用 [`GfxBuffer::flush`]，不依赖 coherent 内存。
pub struct GfxBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    size: vk::DeviceSize,

    /// 在初始化阶段写死
    map_ptr: Option<*mut u8>,

    device: Rc<GfxDevice>,
    debug_name: String,
}
impl DebugType for GfxBuffer {
    fn debug_type_name() -> &'static str {
        "GfxBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxBuffer {
    fn drop(&mut self) {
        log::debug!("Destroying GfxBuffer: {}", self.debug_name);
        let allocator = self.device.allocator();
        unsafe {
            if self.map_ptr.is_some() {
                allocator.unmap_memory(&mut self.allocation);
            }
            allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
    }
}
// new & init
impl GfxBuffer {
    /// - align: buffer 起始地址的对齐，默认对齐到 8 字节
    /// - mem_map: 为 true 时分配 host 可访问的内存并保持 map 状态
    pub fn new(
        device: &Rc<GfxDevice>,
        buffer_size: vk::DeviceSize,
        buffer_usage: vk::BufferUsageFlags,
        align: Option<vk::DeviceSize>,
        mem_map: bool,
        name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let buffer_ci = vk::BufferCreateInfo::default()
            .size(buffer_size)
            .usage(buffer_usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            flags: if mem_map {
                vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM
            } else {
                vk_mem::AllocationCreateFlags::empty()
            },
            ..Default::default()
        };

        let allocator = device.allocator();
        let (handle, mut allocation) =
            unsafe { allocator.create_buffer_with_alignment(&buffer_ci, &alloc_ci, align.unwrap_or(8))? };

        let mut map_ptr = None;
        if mem_map {
            match unsafe { allocator.map_memory(&mut allocation) } {
                Ok(ptr) => map_ptr = Some(ptr),
                Err(e) => {
                    unsafe { allocator.destroy_buffer(handle, &mut allocation) };
                    return Err(e.into());
                }
            }
        }

        let buffer = Self {
            handle,
            allocation,
            size: buffer_size,
            map_ptr,
            device: device.clone(),
            debug_name: name.as_ref().to_string(),
        };
        device.set_debug_name(&buffer, name);
        Ok(buffer)
    }

    #[inline]
    pub fn new_stage_buffer(
        device: &Rc<GfxDevice>,
        size: vk::DeviceSize,
        debug_name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        Self::new(device, size, vk::BufferUsageFlags::TRANSFER_SRC, None, true, debug_name)
    }

    /// 每帧写入的 uniform buffer，创建后一直保持 map 状态
    #[inline]
    pub fn new_uniform_buffer(
        device: &Rc<GfxDevice>,
        size: vk::DeviceSize,
        debug_name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        Self::new(device, size, vk::BufferUsageFlags::UNIFORM_BUFFER, None, true, debug_name)
    }

    /// 创建 device local 的 buffer，数据经由临时 stage buffer 拷贝进去
    pub fn new_device_local<T: bytemuck::Pod>(
        device: &Rc<GfxDevice>,
        data: &[T],
        usage: vk::BufferUsageFlags,
        debug_name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxBuffer::new_device_local");

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self::new(
            device,
            bytes.len() as vk::DeviceSize,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            None,
            false,
            debug_name,
        )?;
        buffer.transfer_data_sync(bytes)?;
        Ok(buffer)
    }
}
// getter
impl GfxBuffer {
    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.map_ptr.is_some()
    }

    #[inline]
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::default().buffer(self.handle).offset(0).range(vk::WHOLE_SIZE)
    }
}
// tools
impl GfxBuffer {
    /// map 之后的整块内存
    pub fn mapped_bytes(&self) -> GfxResult<&[u8]> {
        let ptr = self.map_ptr.ok_or_else(|| GfxError::NotMapped(self.debug_name.clone()))?;
        Ok(unsafe { std::slice::from_raw_parts(ptr, self.size as usize) })
    }

    /// 将 data 写入 map 的内存中 `offset` 处，写入之后需要 [`Self::flush`]
    pub fn write_bytes(&self, offset: usize, data: &[u8]) -> GfxResult<()> {
        let ptr = self.map_ptr.ok_or_else(|| GfxError::NotMapped(self.debug_name.clone()))?;
        // 每帧只有一个 writer，且写入区域不会被 GPU 同时读取（每个 in-flight frame 各自一份）
        let dst = unsafe { std::slice::from_raw_parts_mut(ptr, self.size as usize) };
        write_into(dst, offset, data, &self.debug_name)
    }

    #[inline]
    pub fn write_pod<T: bytemuck::Pod>(&self, value: &T) -> GfxResult<()> {
        self.write_bytes(0, bytemuck::bytes_of(value))
    }

    /// 让 host 的写入对 device 可见
    #[inline]
    pub fn flush(&self, offset: vk::DeviceSize, size: vk::DeviceSize) -> GfxResult<()> {
        self.device.allocator().flush_allocation(&self.allocation, offset, size)?;
        Ok(())
    }

    #[inline]
    pub fn flush_all(&self) -> GfxResult<()> {
        self.flush(0, vk::WHOLE_SIZE)
    }

    /// 创建一个临时的 stage buffer，先将数据放入 stage buffer，再 transfer 到 self
    ///
    /// sync 表示这个函数是同步等待的，会阻塞运行
    pub fn transfer_data_sync(&self, data: &[u8]) -> GfxResult<()> {
        let stage_buffer = Self::new_stage_buffer(
            &self.device,
            data.len() as vk::DeviceSize,
            format!("{}-stage-buffer", self.debug_name),
        )?;
        stage_buffer.write_bytes(0, data)?;
        stage_buffer.flush_all()?;

        self.device.one_time_exec(
            |cmd| {
                cmd.cmd_copy_buffer(
                    &stage_buffer,
                    self,
                    &[vk::BufferCopy {
                        size: data.len() as vk::DeviceSize,
                        ..Default::default()
                    }],
                );
            },
            format!("{}-transfer-data", self.debug_name),
        )
    }
}

/// 带边界检查的内存拷贝
fn write_into(dst: &mut [u8], offset: usize, data: &[u8], name: &str) -> GfxResult<()> {
    let end = offset.checked_add(data.len()).filter(|&end| end <= dst.len());
    let Some(end) = end else {
        return Err(GfxError::WriteOutOfRange {
            name: name.to_string(),
            offset,
            len: data.len(),
            capacity: dst.len(),
        });
    };
    dst[offset..end].copy_from_slice(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_into_copies_at_offset() {
        let mut dst = [0u8; 8];
        write_into(&mut dst, 2, &[1, 2, 3], "test").unwrap();
        assert_eq!(dst, [0, 0, 1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn write_into_rejects_overflow_without_touching_memory() {
        let mut dst = [7u8; 4];
        let err = write_into(&mut dst, 2, &[1, 2, 3], "ubo").unwrap_err();
        assert!(matches!(err, GfxError::WriteOutOfRange { offset: 2, len: 3, capacity: 4, .. }));
        assert_eq!(dst, [7; 4]);

        assert!(write_into(&mut dst, usize::MAX, &[1], "ubo").is_err());
    }
}
