use ash::vk;
use itertools::Itertools;

use crate::descriptors::layout::{DescriptorSetLayout, DescriptorSetLayoutDesc};
use crate::descriptors::pool::DescriptorPool;
use crate::error::{GfxError, GfxResult};

/// 一次写入所携带的资源信息
#[derive(Clone, Copy, Debug)]
pub enum DescriptorResource {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
}
impl DescriptorResource {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Image(_) => "image",
        }
    }

    fn accepts(&self, ty: vk::DescriptorType) -> bool {
        match self {
            Self::Buffer(_) => matches!(
                ty,
                vk::DescriptorType::UNIFORM_BUFFER
                    | vk::DescriptorType::STORAGE_BUFFER
                    | vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
                    | vk::DescriptorType::STORAGE_BUFFER_DYNAMIC
            ),
            Self::Image(_) => matches!(
                ty,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER
                    | vk::DescriptorType::SAMPLED_IMAGE
                    | vk::DescriptorType::STORAGE_IMAGE
                    | vk::DescriptorType::SAMPLER
                    | vk::DescriptorType::INPUT_ATTACHMENT
            ),
        }
    }
}

/// 针对一个 layout 累积 (binding, resource)，在 [`Self::build`] 时一次性分配并写入
///
/// 写入在分配之前完成校验；校验或分配失败时不会产生任何 set。
pub struct DescriptorWriter<'a> {
    layout: &'a DescriptorSetLayout,
    pool: &'a mut DescriptorPool,
    writes: Vec<(u32, DescriptorResource)>,
}
impl<'a> DescriptorWriter<'a> {
    pub fn new(layout: &'a DescriptorSetLayout, pool: &'a mut DescriptorPool) -> Self {
        Self {
            layout,
            pool,
            writes: Vec::new(),
        }
    }

    /// builder
    #[inline]
    pub fn write_buffer(mut self, binding: u32, info: vk::DescriptorBufferInfo) -> Self {
        self.writes.push((binding, DescriptorResource::Buffer(info)));
        self
    }

    /// builder
    #[inline]
    pub fn write_image(mut self, binding: u32, info: vk::DescriptorImageInfo) -> Self {
        self.writes.push((binding, DescriptorResource::Image(info)));
        self
    }

    pub fn build(self, name: impl AsRef<str>) -> GfxResult<vk::DescriptorSet> {
        validate_writes(self.layout.desc(), self.layout.name(), &self.writes)?;

        let set = self.pool.allocate(self.layout)?;

        let vk_writes = self
            .writes
            .iter()
            .map(|(binding, resource)| {
                // 已经校验过 binding 存在
                let ty = self.layout.desc().binding(*binding).map(|b| b.descriptor_type).unwrap_or_default();
                let write = vk::WriteDescriptorSet::default().dst_set(set).dst_binding(*binding).descriptor_type(ty);
                match resource {
                    DescriptorResource::Buffer(info) => write.buffer_info(std::slice::from_ref(info)),
                    DescriptorResource::Image(info) => write.image_info(std::slice::from_ref(info)),
                }
            })
            .collect_vec();

        let device = self.pool.device();
        unsafe { device.update_descriptor_sets(&vk_writes, &[]) };
        device.set_object_debug_name(set, format!("GfxDescriptorSet::{}", name.as_ref()));
        Ok(set)
    }
}

/// 检查写入与 layout 一一对应：binding 已声明、资源种类匹配、没有重复，
/// 且 layout 声明的每个 binding 都被写入
pub fn validate_writes(
    layout: &DescriptorSetLayoutDesc,
    layout_name: &str,
    writes: &[(u32, DescriptorResource)],
) -> GfxResult<()> {
    for (binding, resource) in writes {
        let Some(desc) = layout.binding(*binding) else {
            return Err(GfxError::UnknownBinding {
                binding: *binding,
                layout: layout_name.to_string(),
            });
        };
        if !resource.accepts(desc.descriptor_type) {
            return Err(GfxError::DescriptorTypeMismatch {
                binding: *binding,
                expected: desc.descriptor_type,
                actual: resource.kind_name(),
            });
        }
    }
    if let Some(dup) = writes.iter().map(|(binding, _)| *binding).sorted().tuple_windows().find(|(a, b)| a == b) {
        return Err(GfxError::DuplicateBinding(dup.0));
    }
    if let Some(missing) = layout.bindings().iter().find(|b| writes.iter().all(|(binding, _)| *binding != b.binding)) {
        return Err(GfxError::MissingBinding {
            binding: missing.binding,
            layout: layout_name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::layout::DescriptorSetLayoutBuilder;

    fn global_layout() -> DescriptorSetLayoutDesc {
        DescriptorSetLayoutBuilder::new()
            .add_binding(0, vk::DescriptorType::UNIFORM_BUFFER, vk::ShaderStageFlags::ALL_GRAPHICS)
            .add_binding(1, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, vk::ShaderStageFlags::FRAGMENT)
            .build_desc()
            .unwrap()
    }

    fn buffer() -> DescriptorResource {
        DescriptorResource::Buffer(vk::DescriptorBufferInfo::default().range(vk::WHOLE_SIZE))
    }

    fn image() -> DescriptorResource {
        DescriptorResource::Image(vk::DescriptorImageInfo::default())
    }

    #[test]
    fn matching_writes_pass() {
        validate_writes(&global_layout(), "global", &[(0, buffer()), (1, image())]).unwrap();
    }

    #[test]
    fn undeclared_binding_is_rejected() {
        let err = validate_writes(&global_layout(), "global", &[(0, buffer()), (2, image())]).unwrap_err();
        assert!(matches!(err, GfxError::UnknownBinding { binding: 2, .. }));
    }

    #[test]
    fn missing_binding_is_rejected() {
        let err = validate_writes(&global_layout(), "global", &[(0, buffer())]).unwrap_err();
        assert!(matches!(err, GfxError::MissingBinding { binding: 1, ref layout } if layout == "global"));

        let err = validate_writes(&global_layout(), "global", &[]).unwrap_err();
        assert!(matches!(err, GfxError::MissingBinding { binding: 0, .. }));
    }

    #[test]
    fn resource_kind_must_match_binding() {
        let err = validate_writes(&global_layout(), "global", &[(0, image())]).unwrap_err();
        assert!(matches!(
            err,
            GfxError::DescriptorTypeMismatch {
                binding: 0,
                expected: vk::DescriptorType::UNIFORM_BUFFER,
                actual: "image"
            }
        ));
    }

    #[test]
    fn binding_written_twice_is_rejected() {
        let err = validate_writes(&global_layout(), "global", &[(1, image()), (0, buffer()), (1, image())]).unwrap_err();
        assert!(matches!(err, GfxError::DuplicateBinding(1)));
    }
}
