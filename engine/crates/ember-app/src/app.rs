use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context;
use crossbeam_channel::Receiver;
use ember_crate_tools::init_log::init_log;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::resources::texture::GfxTexture;
use ember_renderer::render_settings::MsaaLevel;
use ember_renderer::scene_renderer::SceneRenderer;
use ember_renderer::systems::light_system::LightSystem;
use ember_renderer::{FrameOrchestrator, RenderTarget, RendererConfig};
use ember_scene::camera::Camera;
use ember_scene::components::transform::TransformComponent;
use ember_scene::entity_store::EntityStore;
use ember_scene::texture_registry::TextureRegistry;

use crate::default_scene::{SceneAssets, load_default_scene, viewer_transform};
use crate::input_controller::InputController;
use crate::platform::input_event::InputEvent;
use crate::render_command::{PendingCommands, RenderCommand, render_command_channel};

/// 初始化日志并读取配置；没有给出路径时使用默认配置
pub fn bootstrap(config_path: Option<&Path>) -> anyhow::Result<RendererConfig> {
    init_log();
    match config_path {
        Some(path) => {
            let config = RendererConfig::from_file(path)?;
            log::info!("config loaded from {:?}", path);
            Ok(config)
        }
        None => {
            log::info!("no config file given, using defaults");
            Ok(RendererConfig::default())
        }
    }
}

/// 把配置中的初始 MSAA 写入 device，需要在创建 render target 之前调用
pub fn configure_device(device: &GfxDevice, config: &RendererConfig) {
    let applied = device.set_msaa_samples(config.msaa.sample_count());
    log::info!("initial msaa: {} (device uses {:?})", config.msaa, applied);
}

/// 一次迭代之后外层循环该做什么
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppStatus {
    Continue,
    Exit,
}

/// 把输入、场景与渲染器串成帧循环
///
/// 窗口与 swapchain 由 `T` 提供。创建 `T` 之前先调用 [`configure_device`]，
/// 使 render pass 的采样数与配置一致。
pub struct EngineApp<T: RenderTarget> {
    renderer: SceneRenderer,
    store: EntityStore,
    textures: TextureRegistry<GfxTexture>,
    orchestrator: FrameOrchestrator,
    target: T,

    camera: Camera,
    viewer: TransformComponent,
    controller: InputController,
    commands: Receiver<RenderCommand>,
    /// 默认关闭，光源保持加载时的位置
    light_orbit: bool,

    config: RendererConfig,
    last_frame: Instant,
    device: Rc<GfxDevice>,
}
// new & init
impl<T: RenderTarget> EngineApp<T> {
    pub fn new(device: &Rc<GfxDevice>, target: T, config: RendererConfig) -> anyhow::Result<Self> {
        let SceneAssets { store, textures, skybox } = load_default_scene(device, &config)?;
        let renderer = SceneRenderer::new(device, &config, target.render_pass(), skybox, &store, &textures)
            .context("failed to create scene renderer")?;

        let (sender, commands) = render_command_channel();
        Ok(Self {
            renderer,
            store,
            textures,
            orchestrator: FrameOrchestrator::new(),
            target,
            camera: Camera::default(),
            viewer: viewer_transform(),
            controller: InputController::new(sender),
            commands,
            light_orbit: false,
            config,
            last_frame: Instant::now(),
            device: device.clone(),
        })
    }
}
// getters
impl<T: RenderTarget> EngineApp<T> {
    #[inline]
    pub fn controller(&self) -> &InputController {
        &self.controller
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn viewer(&self) -> &TransformComponent {
        &self.viewer
    }
}
// tools
impl<T: RenderTarget> EngineApp<T> {
    #[inline]
    pub fn handle_event(&mut self, event: &InputEvent) {
        self.controller.handle_event(event);
    }

    /// 一次迭代：处理命令 -> 输入与动画 -> 相机 -> 绘制
    ///
    /// 场景只在这里、绘制之前被修改。
    pub fn step(&mut self) -> anyhow::Result<AppStatus> {
        let pending = PendingCommands::drain(&self.commands);
        if pending.exit {
            return Ok(AppStatus::Exit);
        }
        if let Some(level) = pending.msaa {
            self.apply_msaa(level)?;
        }
        if pending.toggle_light_orbit {
            self.light_orbit = !self.light_orbit;
            log::info!("light orbit: {}", self.light_orbit);
        }

        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.controller.process_mouse_movement(frame_time, &mut self.viewer);
        self.controller.move_in_space(frame_time, &mut self.viewer);
        if self.light_orbit {
            LightSystem::animate_lights(&mut self.store, frame_time);
        }

        self.camera.set_view_yxz(self.viewer.translation, self.viewer.rotation);
        let projection = &self.config.camera;
        self.camera.set_perspective_projection(
            projection.fov_deg.to_radians(),
            self.target.aspect_ratio(),
            projection.near,
            projection.far,
        );

        self.renderer
            .draw_frame(&mut self.orchestrator, &mut self.target, &self.camera, &self.store, frame_time)
            .context("failed to draw frame")?;
        Ok(AppStatus::Continue)
    }

    /// 切换 MSAA 后重建 target 与所有依赖采样数的资源
    fn apply_msaa(&mut self, level: MsaaLevel) -> anyhow::Result<()> {
        let _span = tracy_client::span!("EngineApp::apply_msaa");

        let applied = self.device.set_msaa_samples(level.sample_count());
        log::info!("switching to {} (device uses {:?})", level, applied);

        let renderer = &mut self.renderer;
        let store = &self.store;
        let textures = &self.textures;
        self.orchestrator
            .reset_resources(&mut self.target, |target| renderer.rebuild(target.render_pass(), store, textures))
            .context("failed to rebuild render resources")
    }

    /// 退出前等待 GPU 空闲
    pub fn shutdown(&self) -> anyhow::Result<()> {
        self.target.wait_idle().context("failed to wait for device idle")
    }
}
