use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ember_crate_tools::resource::EmberPath;
use serde::{Deserialize, Serialize};

use crate::render_settings::MsaaLevel;

/// 三个 draw system 使用的 shader，名字不带 `.spv` 后缀，位于 `shaders/` 下
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub simple_vert: String,
    pub simple_frag: String,
    pub light_vert: String,
    pub light_frag: String,
    pub skybox_vert: String,
    pub skybox_frag: String,
}
impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            simple_vert: "simple_shader.vert".to_string(),
            simple_frag: "simple_shader.frag".to_string(),
            light_vert: "light.vert".to_string(),
            light_frag: "light.frag".to_string(),
            skybox_vert: "skybox.vert".to_string(),
            skybox_frag: "skybox.frag".to_string(),
        }
    }
}
impl ShaderConfig {
    #[inline]
    pub fn spv_path(name: &str) -> PathBuf {
        EmberPath::shader_path(name)
    }
}

/// 透视投影参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}
impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// 渲染器配置，TOML 中缺省的字段使用默认值
///
/// 资源路径为相对 `assets/` 的路径，也可以是绝对路径。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub shaders: ShaderConfig,
    pub camera: CameraConfig,
    pub msaa: MsaaLevel,

    /// 没有漫反射贴图的网格使用的纹理
    pub fallback_texture: PathBuf,
    /// left, right, bottom, top, front, back
    pub skybox_faces: [PathBuf; 6],
    pub models: Vec<PathBuf>,
}
impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shaders: ShaderConfig::default(),
            camera: CameraConfig::default(),
            msaa: MsaaLevel::X1,
            fallback_texture: PathBuf::from("textures/white.png"),
            skybox_faces: ["left", "right", "bottom", "top", "front", "back"]
                .map(|face| PathBuf::from(format!("textures/skybox/{face}.tga"))),
            models: vec![PathBuf::from("models/city/city.obj")],
        }
    }
}
impl RendererConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("failed to read config: {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("failed to parse config: {:?}", path))
    }

    #[inline]
    pub fn fallback_texture_path(&self) -> PathBuf {
        EmberPath::resolve_asset(&self.fallback_texture)
    }

    #[inline]
    pub fn skybox_face_paths(&self) -> [PathBuf; 6] {
        self.skybox_faces.each_ref().map(EmberPath::resolve_asset)
    }

    #[inline]
    pub fn model_paths(&self) -> Vec<PathBuf> {
        self.models.iter().map(EmberPath::resolve_asset).collect()
    }
}
