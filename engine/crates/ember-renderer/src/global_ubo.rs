use glam::{Mat4, Vec4};

use crate::render_settings::{DEFAULT_AMBIENT, MAX_LIGHTS};

/// 全局 uniform 中的一个点光源
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    /// w = 1
    pub position: Vec4,
    /// w 为光照强度
    pub color: Vec4,
}

/// 每个 in-flight 帧一份的全局 uniform，binding 0
///
/// 布局与 shader 中的 std140 block 一致：
/// `proj, view, invView, ambient, lights[MAX_LIGHTS], numLights`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUbo {
    pub projection: Mat4,
    pub view: Mat4,
    /// 最后一列是相机的世界坐标
    pub inverse_view: Mat4,
    pub ambient_light_color: Vec4,
    pub point_lights: [PointLight; MAX_LIGHTS],
    num_lights: i32,
    _padding: [i32; 3],
}
impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ambient_light_color: Vec4::from_array(DEFAULT_AMBIENT),
            point_lights: [PointLight::default(); MAX_LIGHTS],
            num_lights: 0,
            _padding: [0; 3],
        }
    }
}
impl GlobalUbo {
    /// 相机矩阵，默认环境光，没有点光源
    pub fn with_camera(projection: Mat4, view: Mat4, inverse_view: Mat4) -> Self {
        Self {
            projection,
            view,
            inverse_view,
            ..Default::default()
        }
    }

    #[inline]
    pub fn num_lights(&self) -> usize {
        self.num_lights as usize
    }

    /// 写入下一个空闲槽位；数组已满时返回 false，光源被丢弃
    pub fn push_light(&mut self, light: PointLight) -> bool {
        let index = self.num_lights();
        if index >= MAX_LIGHTS {
            return false;
        }
        self.point_lights[index] = light;
        self.num_lights += 1;
        true
    }

    #[inline]
    pub fn active_lights(&self) -> &[PointLight] {
        &self.point_lights[..self.num_lights()]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_shader_block() {
        assert_eq!(size_of::<PointLight>(), 32);
        assert_eq!(size_of::<GlobalUbo>(), 3 * 64 + 16 + MAX_LIGHTS * 32 + 16);
        assert_eq!(std::mem::offset_of!(GlobalUbo, point_lights), 208);
        assert_eq!(std::mem::offset_of!(GlobalUbo, num_lights), 528);
    }

    #[test]
    fn lights_beyond_capacity_are_dropped() {
        let mut ubo = GlobalUbo::default();
        for i in 0..MAX_LIGHTS + 3 {
            let accepted = ubo.push_light(PointLight {
                position: Vec4::new(i as f32, 0.0, 0.0, 1.0),
                color: Vec4::ONE,
            });
            assert_eq!(accepted, i < MAX_LIGHTS);
        }
        assert_eq!(ubo.num_lights(), MAX_LIGHTS);
        assert_eq!(ubo.active_lights().last().map(|l| l.position.x), Some((MAX_LIGHTS - 1) as f32));
    }

    #[test]
    fn bytes_read_back_identically() {
        let mut ubo = GlobalUbo::default();
        let lights = [
            PointLight {
                position: Vec4::new(1.5, -2.5, 0.125, 1.0),
                color: Vec4::new(1.0, 0.1, 0.1, 0.2),
            },
            PointLight {
                position: Vec4::new(-3.0, 0.0, 7.75, 1.0),
                color: Vec4::new(0.1, 0.1, 1.0, 3.0),
            },
        ];
        lights.iter().for_each(|l| {
            ubo.push_light(*l);
        });

        // 模拟 map 出来的内存
        let mut mapped = vec![0u8; size_of::<GlobalUbo>()];
        mapped.copy_from_slice(ubo.as_bytes());
        let read_back: GlobalUbo = bytemuck::pod_read_unaligned(&mapped);
        assert_eq!(read_back.active_lights(), &lights);
        assert_eq!(read_back.num_lights(), 2);
    }
}
