use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// 平移 + 欧拉角旋转 + 非均匀缩放
///
/// 旋转按 Y(yaw) - X(pitch) - Z(roll) 的顺序组合，单位为弧度。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformComponent {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}
impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}
impl TransformComponent {
    #[inline]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// translate * Ry * Rx * Rz * scale
    pub fn mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.translation)
    }

    /// 模型矩阵左上 3x3 的逆转置，扩展为 4x4
    pub fn normal_matrix(&self) -> Mat4 {
        let rotation = Mat3::from_quat(self.rotation_quat());
        let inv_scale = Mat3::from_diagonal(self.scale.recip());
        Mat4::from_mat3(rotation * inv_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_matrix_is_inverse_transpose_of_model() {
        let t = TransformComponent {
            translation: Vec3::new(1.0, -2.0, 3.0),
            rotation: Vec3::new(0.3, 1.1, -0.4),
            scale: Vec3::new(2.0, 0.5, 3.0),
        };
        let expected = Mat4::from_mat3(Mat3::from_mat4(t.mat4()).inverse().transpose());
        assert!(t.normal_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(TransformComponent::default().mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = TransformComponent {
            translation: Vec3::new(0.0, -2.5, -5.0),
            ..Default::default()
        };
        assert_eq!(t.mat4().w_axis.truncate(), Vec3::new(0.0, -2.5, -5.0));
    }
}
