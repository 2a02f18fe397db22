use std::fmt::Display;
use std::rc::Rc;

use ash::vk;
use indexmap::IndexMap;

use crate::descriptors::layout::{DescriptorSetLayout, DescriptorSetLayoutDesc};
use crate::error::{GfxError, GfxResult};
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;

/// pool 中被计数的资源种类
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolResourceKind {
    Sets,
    Descriptor(vk::DescriptorType),
}
impl Display for PoolResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sets => write!(f, "descriptor sets"),
            Self::Descriptor(ty) => write!(f, "{:?} descriptors", ty),
        }
    }
}

/// pool 容量的 CPU 侧记账
///
/// 分配前先在这里预留，任何一项超出容量都会整体失败，不会留下部分预留。
#[derive(Clone, Debug)]
pub struct PoolBudget {
    max_sets: u32,
    used_sets: u32,
    /// descriptor type -> (容量, 已使用)
    descriptors: IndexMap<vk::DescriptorType, (u32, u32)>,
}
impl PoolBudget {
    pub fn new(max_sets: u32, pool_sizes: &[vk::DescriptorPoolSize]) -> Self {
        let mut descriptors: IndexMap<vk::DescriptorType, (u32, u32)> = IndexMap::new();
        for size in pool_sizes {
            descriptors.entry(size.ty).or_insert((0, 0)).0 += size.descriptor_count;
        }
        Self {
            max_sets,
            used_sets: 0,
            descriptors,
        }
    }

    #[inline]
    pub fn remaining_sets(&self) -> u32 {
        self.max_sets - self.used_sets
    }

    #[inline]
    pub fn remaining(&self, ty: vk::DescriptorType) -> u32 {
        self.descriptors.get(&ty).map_or(0, |(cap, used)| cap - used)
    }

    /// 为一个 layout 的 set 预留容量，要么全部成功，要么不做任何修改
    pub fn try_reserve(&mut self, layout: &DescriptorSetLayoutDesc, pool_name: &str) -> GfxResult<()> {
        if self.remaining_sets() == 0 {
            return Err(GfxError::PoolExhausted {
                pool: pool_name.to_string(),
                kind: PoolResourceKind::Sets,
                requested: 1,
                available: 0,
            });
        }

        let counts = layout.descriptor_counts();
        for &(ty, requested) in &counts {
            let available = self.remaining(ty);
            if requested > available {
                return Err(GfxError::PoolExhausted {
                    pool: pool_name.to_string(),
                    kind: PoolResourceKind::Descriptor(ty),
                    requested,
                    available,
                });
            }
        }

        self.used_sets += 1;
        for (ty, requested) in counts {
            if let Some((_, used)) = self.descriptors.get_mut(&ty) {
                *used += requested;
            }
        }
        Ok(())
    }

    /// 撤销一次 [`Self::try_reserve`]
    pub fn release(&mut self, layout: &DescriptorSetLayoutDesc) {
        self.used_sets = self.used_sets.saturating_sub(1);
        for (ty, count) in layout.descriptor_counts() {
            if let Some((_, used)) = self.descriptors.get_mut(&ty) {
                *used = used.saturating_sub(count);
            }
        }
    }
}

/// ```ignore
/// let pool = DescriptorPoolBuilder::new()
///     .max_sets(MAX_FRAMES_IN_FLIGHT + mesh_count)
///     .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, MAX_FRAMES_IN_FLIGHT)
///     .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, MAX_FRAMES_IN_FLIGHT + mesh_count)
///     .build(&device, "global")?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct DescriptorPoolBuilder {
    flags: vk::DescriptorPoolCreateFlags,
    max_sets: u32,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
}
impl DescriptorPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// builder
    #[inline]
    pub fn max_sets(mut self, max_sets: u32) -> Self {
        self.max_sets = max_sets;
        self
    }

    /// builder
    #[inline]
    pub fn add_pool_size(mut self, ty: vk::DescriptorType, count: u32) -> Self {
        self.pool_sizes.push(vk::DescriptorPoolSize { ty, descriptor_count: count });
        self
    }

    /// builder
    #[inline]
    pub fn pool_flags(mut self, flags: vk::DescriptorPoolCreateFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn budget(&self) -> PoolBudget {
        PoolBudget::new(self.max_sets, &self.pool_sizes)
    }

    pub fn build(self, device: &Rc<GfxDevice>, name: impl AsRef<str>) -> GfxResult<DescriptorPool> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .flags(self.flags)
            .max_sets(self.max_sets)
            .pool_sizes(&self.pool_sizes);
        let handle = unsafe { device.create_descriptor_pool(&create_info, None)? };

        let pool = DescriptorPool {
            handle,
            budget: self.budget(),
            device: device.clone(),
            name: name.as_ref().to_string(),
        };
        device.set_debug_name(&pool, &name);
        log::info!("descriptor pool created: {} (max sets: {})", pool.name, self.max_sets);
        Ok(pool)
    }
}

/// 固定容量的描述符池
///
/// 分配出的 set 跟随 pool 一起释放
pub struct DescriptorPool {
    handle: vk::DescriptorPool,
    budget: PoolBudget,

    device: Rc<GfxDevice>,
    name: String,
}
impl DescriptorPool {
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }

    #[inline]
    pub fn budget(&self) -> &PoolBudget {
        &self.budget
    }

    #[inline]
    pub fn device(&self) -> &Rc<GfxDevice> {
        &self.device
    }

    /// 分配一个符合 layout 的 set，超出容量时在调用 Vulkan 之前失败
    pub fn allocate(&mut self, layout: &DescriptorSetLayout) -> GfxResult<vk::DescriptorSet> {
        self.budget.try_reserve(layout.desc(), &self.name)?;

        let set_layout = layout.handle();
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.handle)
            .set_layouts(std::slice::from_ref(&set_layout));
        match unsafe { self.device.allocate_descriptor_sets(&alloc_info) } {
            Ok(sets) => Ok(sets[0]),
            Err(e) => {
                self.budget.release(layout.desc());
                Err(e.into())
            }
        }
    }
}
impl Drop for DescriptorPool {
    fn drop(&mut self) {
        log::info!("Destroying DescriptorPool: {}", self.name);
        unsafe { self.device.destroy_descriptor_pool(self.handle, None) };
    }
}
impl DebugType for DescriptorPool {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
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

    fn texture_layout() -> DescriptorSetLayoutDesc {
        DescriptorSetLayoutBuilder::new()
            .add_binding(0, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, vk::ShaderStageFlags::FRAGMENT)
            .build_desc()
            .unwrap()
    }

    #[test]
    fn set_capacity_is_enforced() {
        let mut budget = DescriptorPoolBuilder::new()
            .max_sets(2)
            .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 10)
            .budget();
        let layout = texture_layout();

        budget.try_reserve(&layout, "test").unwrap();
        budget.try_reserve(&layout, "test").unwrap();
        let err = budget.try_reserve(&layout, "test").unwrap_err();
        assert!(matches!(
            err,
            GfxError::PoolExhausted { kind: PoolResourceKind::Sets, available: 0, .. }
        ));
        assert_eq!(budget.remaining(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 8);
    }

    #[test]
    fn per_kind_capacity_failure_leaves_budget_untouched() {
        // uniform 足够，但 sampler 不够：整个 set 失败，uniform 也不被占用
        let mut budget = DescriptorPoolBuilder::new()
            .max_sets(4)
            .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, 2)
            .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1)
            .budget();
        let layout = global_layout();

        budget.try_reserve(&layout, "test").unwrap();
        let err = budget.try_reserve(&layout, "test").unwrap_err();
        assert!(matches!(
            err,
            GfxError::PoolExhausted {
                kind: PoolResourceKind::Descriptor(vk::DescriptorType::COMBINED_IMAGE_SAMPLER),
                requested: 1,
                available: 0,
                ..
            }
        ));
        assert_eq!(budget.remaining_sets(), 3);
        assert_eq!(budget.remaining(vk::DescriptorType::UNIFORM_BUFFER), 1);
    }

    #[test]
    fn undeclared_kind_has_no_capacity() {
        let mut budget = DescriptorPoolBuilder::new()
            .max_sets(4)
            .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, 4)
            .budget();
        assert!(budget.try_reserve(&texture_layout(), "test").is_err());
        assert_eq!(budget.remaining_sets(), 4);
    }

    #[test]
    fn release_restores_capacity() {
        let mut budget = DescriptorPoolBuilder::new()
            .max_sets(1)
            .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1)
            .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1)
            .budget();
        let layout = texture_layout();
        assert_eq!(budget.remaining(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 2);

        budget.try_reserve(&layout, "test").unwrap();
        budget.release(&layout);
        assert_eq!(budget.remaining_sets(), 1);

        budget.try_reserve(&layout, "test").unwrap();
        assert!(budget.try_reserve(&layout, "test").is_err());
        // 失败的预留不占用容量
        assert_eq!(budget.remaining(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 1);
        budget.release(&layout);
        assert_eq!(budget.remaining_sets(), 1);
        assert_eq!(budget.remaining(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 2);
    }
}
