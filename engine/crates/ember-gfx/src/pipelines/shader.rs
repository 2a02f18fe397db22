use std::ffi::CStr;
use std::path::{Path, PathBuf};

use ash::vk;

use crate::error::{GfxError, GfxResult};
use crate::foundation::debug_utils::DebugType;
use crate::foundation::device::GfxDevice;

/// 只在 pipeline 创建期间存活，pipeline 创建完成后即可销毁
pub struct ShaderModule<'a> {
    handle: vk::ShaderModule,
    device: &'a GfxDevice,
}
impl<'a> ShaderModule<'a> {
    /// # param
    /// * path - 编译好的 spv 文件路径
    pub fn new(device: &'a GfxDevice, path: &Path) -> GfxResult<Self> {
        let shader_load_err = |source| GfxError::ShaderLoad {
            path: path.to_path_buf(),
            source,
        };
        let mut file = std::fs::File::open(path).map_err(shader_load_err)?;
        let shader_code = ash::util::read_spv(&mut file).map_err(shader_load_err)?;

        let shader_module_info = vk::ShaderModuleCreateInfo::default().code(&shader_code);
        let handle = unsafe { device.create_shader_module(&shader_module_info, None)? };

        let shader_module = Self { handle, device };
        device.set_debug_name(&shader_module, path.to_string_lossy());
        Ok(shader_module)
    }

    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }
}
impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe { self.device.destroy_shader_module(self.handle, None) };
    }
}
impl DebugType for ShaderModule<'_> {
    fn debug_type_name() -> &'static str {
        "GfxShaderModule"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

#[derive(Clone, Debug)]
pub struct ShaderStageInfo {
    pub stage: vk::ShaderStageFlags,
    pub entry_point: &'static CStr,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_spv_reports_path() {
        let path = Path::new("definitely/not/here/simple_shader.vert.spv");
        let source = std::fs::File::open(path).map(|_| ()).unwrap_err();
        let err = GfxError::ShaderLoad {
            path: path.to_path_buf(),
            source,
        };
        assert!(err.to_string().contains("simple_shader.vert.spv"));
    }
}
