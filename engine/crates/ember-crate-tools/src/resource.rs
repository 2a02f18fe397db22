use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导），
/// 相对路径会被解析到 `assets/`、`shaders/` 目录下。
///
/// ```ignore
/// let obj = EmberPath::assets_path("models/smooth_vase.obj"); // assets/models/smooth_vase.obj
/// let spv = EmberPath::shader_path("simple_shader.vert");      // shaders/simple_shader.vert.spv
/// ```
pub struct EmberPath;
impl EmberPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // engine/crates/ember-crate-tools -> workspace root
        Path::new(env!("CARGO_MANIFEST_DIR")).ancestors().nth(3).map(Path::to_path_buf).unwrap_or_default()
    }

    /// 获取 `assets/` 目录下的文件路径
    pub fn assets_path(filename: impl AsRef<Path>) -> PathBuf {
        Self::workspace_path().join("assets").join(filename)
    }

    /// 获取 `shaders/` 目录下编译好的 SPIR-V 路径，自动追加 `.spv` 后缀
    pub fn shader_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("shaders").join(format!("{filename}.spv"))
    }

    /// 绝对路径保持不变，相对路径解析到 `assets/` 下
    pub fn resolve_asset(path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() { path.to_path_buf() } else { Self::assets_path(path) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_path_appends_spv() {
        let path = EmberPath::shader_path("light.frag");
        assert_eq!(path.file_name().and_then(|s| s.to_str()), Some("light.frag.spv"));
        assert!(path.starts_with(EmberPath::workspace_path()));
    }

    #[test]
    fn resolve_asset_keeps_absolute_paths() {
        let abs = EmberPath::workspace_path().join("somewhere").join("white.png");
        assert_eq!(EmberPath::resolve_asset(&abs), abs);
        assert_eq!(EmberPath::resolve_asset("textures/white.png"), EmberPath::assets_path("textures/white.png"));
    }
}
