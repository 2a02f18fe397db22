use std::collections::BTreeMap;
use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::error::{GfxError, GfxResult};
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;

/// 一个 binding 槽位的声明
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorBindingDesc {
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub descriptor_count: u32,
    pub stages: vk::ShaderStageFlags,
}

/// set layout 的 CPU 侧描述，声明之后不可变
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    /// 按 binding index 升序
    bindings: Vec<DescriptorBindingDesc>,
}
impl DescriptorSetLayoutDesc {
    #[inline]
    pub fn bindings(&self) -> &[DescriptorBindingDesc] {
        &self.bindings
    }

    #[inline]
    pub fn binding(&self, binding: u32) -> Option<&DescriptorBindingDesc> {
        self.bindings.iter().find(|b| b.binding == binding)
    }

    /// 按 descriptor 类型汇总的数量，用于 pool 的容量检查
    pub fn descriptor_counts(&self) -> Vec<(vk::DescriptorType, u32)> {
        let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
        for b in &self.bindings {
            *counts.entry(b.descriptor_type.as_raw()).or_default() += b.descriptor_count;
        }
        counts.into_iter().map(|(raw, count)| (vk::DescriptorType::from_raw(raw), count)).collect()
    }
}

/// 依次声明 (binding, 类型, 可见 stage)
///
/// ```ignore
/// let layout = DescriptorSetLayoutBuilder::new()
///     .add_binding(0, vk::DescriptorType::UNIFORM_BUFFER, vk::ShaderStageFlags::ALL_GRAPHICS)
///     .add_binding(1, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, vk::ShaderStageFlags::FRAGMENT)
///     .build(&device, "global")?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<DescriptorBindingDesc>,
}
impl DescriptorSetLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// builder
    #[inline]
    pub fn add_binding(self, binding: u32, ty: vk::DescriptorType, stages: vk::ShaderStageFlags) -> Self {
        self.add_binding_array(binding, ty, stages, 1)
    }

    /// builder
    #[inline]
    pub fn add_binding_array(
        mut self,
        binding: u32,
        ty: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
        count: u32,
    ) -> Self {
        self.bindings.push(DescriptorBindingDesc {
            binding,
            descriptor_type: ty,
            descriptor_count: count,
            stages,
        });
        self
    }

    /// 只做声明的校验，不创建 Vulkan 对象
    pub fn build_desc(self) -> GfxResult<DescriptorSetLayoutDesc> {
        let bindings = self.bindings.into_iter().sorted_by_key(|b| b.binding).collect_vec();
        if let Some((dup, _)) = bindings.iter().tuple_windows().find(|(a, b)| a.binding == b.binding) {
            return Err(GfxError::DuplicateBinding(dup.binding));
        }
        Ok(DescriptorSetLayoutDesc { bindings })
    }

    pub fn build(self, device: &Rc<GfxDevice>, name: impl AsRef<str>) -> GfxResult<DescriptorSetLayout> {
        DescriptorSetLayout::new(device, self.build_desc()?, name)
    }
}

/// 描述符集布局
///
/// 可以被多个 pipeline layout 共享（例如 global layout 同时被三个 draw system 使用）
pub struct DescriptorSetLayout {
    handle: vk::DescriptorSetLayout,
    desc: DescriptorSetLayoutDesc,

    device: Rc<GfxDevice>,
    name: String,
}
impl DescriptorSetLayout {
    pub fn new(device: &Rc<GfxDevice>, desc: DescriptorSetLayoutDesc, name: impl AsRef<str>) -> GfxResult<Self> {
        let vk_bindings = desc
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(b.descriptor_type)
                    .descriptor_count(b.descriptor_count)
                    .stage_flags(b.stages)
            })
            .collect_vec();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);

        let handle = unsafe { device.create_descriptor_set_layout(&create_info, None)? };
        let layout = Self {
            handle,
            desc,
            device: device.clone(),
            name: name.as_ref().to_string(),
        };
        device.set_debug_name(&layout, &name);
        log::info!("descriptor set layout created: {}", layout.name);
        Ok(layout)
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        log::info!("Destroying DescriptorSetLayout: {}", self.name);
        unsafe { self.device.destroy_descriptor_set_layout(self.handle, None) };
    }
}
impl DebugType for DescriptorSetLayout {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSetLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
