use glam::{EulerRot, Mat4, Vec3};

/// 投影 + 视图矩阵
///
/// 坐标约定：+X 向右，-Y 向上，+Z 向前；深度范围 0..1。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,
}
impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
        }
    }
}
// getters
impl Camera {
    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn inverse_view(&self) -> Mat4 {
        self.inverse_view
    }

    /// 相机的世界坐标，取自 inverse view 的最后一列
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.inverse_view.w_axis.truncate()
    }
}
// tools
impl Camera {
    /// # param
    /// * fovy - 竖直方向的视角，弧度
    pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Mat4::perspective_lh(fovy, aspect, near, far);
    }

    /// 由位置和 YXZ 欧拉角构建视图矩阵
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        self.inverse_view =
            Mat4::from_translation(position) * Mat4::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z);
        self.view = self.inverse_view.inverse();
    }
}
