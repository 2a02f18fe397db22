use std::fmt::Display;

use ash::vk;
use serde::{Deserialize, Serialize};

/// 同时在 GPU 上执行的帧数；每一帧拥有独立的 uniform buffer 与全局 descriptor set
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// 全局 uniform 中点光源数组的容量，超出的光源不参与光照
pub const MAX_LIGHTS: usize = 10;

/// 环境光，w 为强度
pub const DEFAULT_AMBIENT: [f32; 4] = [0.01, 0.01, 0.01, 1.0];

/// 可以在运行时切换的 MSAA 等级
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsaaLevel {
    #[default]
    X1,
    X2,
    X4,
    X8,
}
impl MsaaLevel {
    #[inline]
    pub fn sample_count(self) -> vk::SampleCountFlags {
        match self {
            Self::X1 => vk::SampleCountFlags::TYPE_1,
            Self::X2 => vk::SampleCountFlags::TYPE_2,
            Self::X4 => vk::SampleCountFlags::TYPE_4,
            Self::X8 => vk::SampleCountFlags::TYPE_8,
        }
    }
}
impl Display for MsaaLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let samples = match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
        };
        write!(f, "MSAA x{samples}")
    }
}

pub struct FrameCounter {
    /// 当前的帧序号，一直累加
    frame_id: u64,
}
// new & init
impl FrameCounter {
    pub fn new(init_frame_id: u64) -> Self {
        Self { frame_id: init_frame_id }
    }
}
// update
impl FrameCounter {
    #[inline]
    pub fn next_frame(&mut self) {
        self.frame_id = self.frame_id.wrapping_add(1);
    }
}
// getters
impl FrameCounter {
    #[inline]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// 当前帧使用的 in-flight 槽位
    #[inline]
    pub fn frame_index(&self) -> usize {
        (self.frame_id % MAX_FRAMES_IN_FLIGHT as u64) as usize
    }

    #[inline]
    pub fn frame_name(&self) -> String {
        format!("[F{}-{}]", self.frame_id, self.frame_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_cycles_through_slots() {
        let mut counter = FrameCounter::new(0);
        let mut slots = vec![];
        for _ in 0..5 {
            slots.push(counter.frame_index());
            counter.next_frame();
        }
        assert_eq!(slots, vec![0, 1, 0, 1, 0]);
        assert_eq!(counter.frame_id(), 5);
    }

    #[test]
    fn msaa_levels_map_to_sample_counts() {
        assert_eq!(MsaaLevel::X4.sample_count(), vk::SampleCountFlags::TYPE_4);
        assert_eq!(MsaaLevel::default(), MsaaLevel::X1);
        assert_eq!(MsaaLevel::X8.to_string(), "MSAA x8");
    }
}
