use std::rc::Rc;

use anyhow::Context;
use ember_asset::image_loader::{load_cubemap, load_texture};
use ember_asset::obj_loader::load_model;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::resources::cubemap::GfxCubemap;
use ember_gfx::resources::texture::GfxTexture;
use ember_renderer::RendererConfig;
use ember_scene::components::entity::SceneEntity;
use ember_scene::components::transform::TransformComponent;
use ember_scene::entity_store::EntityStore;
use ember_scene::texture_registry::TextureRegistry;
use glam::Vec3;

/// 相机初始位置（+X 右，-Y 上，+Z 前）
pub const VIEWER_START: Vec3 = Vec3::new(0.0, -2.0, -12.5);

pub const MAIN_LIGHT_POSITION: Vec3 = Vec3::new(0.0, -2.5, -5.0);

/// 加载完成的场景及其 GPU 资源
pub struct SceneAssets {
    pub store: EntityStore,
    pub textures: TextureRegistry<GfxTexture>,
    pub skybox: GfxCubemap,
}

pub fn viewer_transform() -> TransformComponent {
    TransformComponent {
        translation: VIEWER_START,
        ..Default::default()
    }
}

/// 场景上方一个静止的白色点光源
pub fn default_lights() -> Vec<SceneEntity> {
    let mut main = SceneEntity::make_light(1.0, 0.1, Vec3::ONE);
    main.transform.translation = MAIN_LIGHT_POSITION;
    vec![main]
}

/// 加载 fallback 纹理、skybox、配置中的模型与默认光源
pub fn load_default_scene(device: &Rc<GfxDevice>, config: &RendererConfig) -> anyhow::Result<SceneAssets> {
    let _span = tracy_client::span!("load_default_scene");

    let fallback_path = config.fallback_texture_path();
    let fallback = load_texture(device, &fallback_path)
        .with_context(|| format!("failed to load fallback texture: {:?}", fallback_path))?;
    let mut textures = TextureRegistry::new(fallback);

    let skybox = load_cubemap(device, &config.skybox_face_paths(), "skybox").context("failed to load skybox")?;

    let mut store = EntityStore::new();
    for path in config.model_paths() {
        let meshes =
            load_model(device, &path, &mut textures).with_context(|| format!("failed to load model: {:?}", path))?;
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let model = store.register_model(name, meshes);
        store.insert(SceneEntity::with_model(model));
    }

    for light in default_lights() {
        store.insert(light);
    }

    log::info!(
        "default scene loaded: {} entities, {} meshes, {} textures",
        store.entity_count(),
        store.total_mesh_count(),
        textures.len()
    );

    Ok(SceneAssets { store, textures, skybox })
}
