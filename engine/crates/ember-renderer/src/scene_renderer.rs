use std::rc::Rc;

use ash::vk;
use ember_gfx::GfxResult;
use ember_gfx::descriptors::layout::{DescriptorSetLayout, DescriptorSetLayoutBuilder};
use ember_gfx::descriptors::pool::{DescriptorPool, DescriptorPoolBuilder};
use ember_gfx::descriptors::writer::DescriptorWriter;
use ember_gfx::foundation::device::GfxDevice;
use ember_gfx::pipelines::graphics_pipeline::PipelineBinding;
use ember_gfx::resources::buffer::GfxBuffer;
use ember_gfx::resources::cubemap::GfxCubemap;
use ember_gfx::resources::texture::GfxTexture;
use ember_scene::camera::Camera;
use ember_scene::entity_store::EntityStore;
use ember_scene::guid_new_type::{MeshHandle, TextureHandle};
use ember_scene::texture_registry::TextureRegistry;
use slotmap::SecondaryMap;

use crate::config::{RendererConfig, ShaderConfig};
use crate::frame_info::FrameInfo;
use crate::frame_orchestrator::{FrameError, FrameOrchestrator, RenderTarget};
use crate::global_ubo::GlobalUbo;
use crate::render_settings::MAX_FRAMES_IN_FLIGHT;
use crate::systems::light_system::LightSystem;
use crate::systems::simple_render_system::SimpleRenderSystem;
use crate::systems::skybox_render_system::SkyboxRenderSystem;

/// 三个 draw system 录制时使用的 pipeline
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneBindings {
    pub skybox: PipelineBinding,
    pub simple: PipelineBinding,
    pub light: PipelineBinding,
}

/// 全局 pool 的容量
///
/// 每个 in-flight 帧一个全局 set（uniform + cubemap），每个网格一个纹理 set。
pub fn scene_pool_builder(mesh_count: usize) -> DescriptorPoolBuilder {
    let frames = MAX_FRAMES_IN_FLIGHT as u32;
    let meshes = mesh_count as u32;
    DescriptorPoolBuilder::new()
        .max_sets(frames + meshes)
        .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, frames)
        .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, frames + meshes)
}

/// set 0：binding 0 为全局 uniform，binding 1 为 skybox cubemap
pub fn global_layout_builder() -> DescriptorSetLayoutBuilder {
    DescriptorSetLayoutBuilder::new()
        .add_binding(0, vk::DescriptorType::UNIFORM_BUFFER, vk::ShaderStageFlags::ALL_GRAPHICS)
        .add_binding(1, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, vk::ShaderStageFlags::FRAGMENT)
}

/// set 1：binding 0 为漫反射贴图
pub fn texture_layout_builder() -> DescriptorSetLayoutBuilder {
    DescriptorSetLayoutBuilder::new().add_binding(
        0,
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        vk::ShaderStageFlags::FRAGMENT,
    )
}

/// 为每个网格创建纹理 set；没有贴图的网格使用 fallback 纹理
pub fn assign_texture_sets<T>(
    scene: &EntityStore,
    textures: &TextureRegistry<T>,
    mut make_set: impl FnMut(TextureHandle, &T) -> GfxResult<vk::DescriptorSet>,
) -> GfxResult<SecondaryMap<MeshHandle, vk::DescriptorSet>> {
    let mut sets = SecondaryMap::new();
    for (mesh_handle, mesh) in scene.meshes() {
        let texture_handle = textures.resolve_handle(mesh.diffuse);
        let set = make_set(texture_handle, textures.resolve(Some(texture_handle)))?;
        sets.insert(mesh_handle, set);
    }
    Ok(sets)
}

/// 根据相机与光源填充这一帧的全局 uniform
pub fn frame_uniforms(frame: &FrameInfo) -> GlobalUbo {
    let mut ubo = GlobalUbo::with_camera(
        frame.camera.projection(),
        frame.camera.view(),
        frame.camera.inverse_view(),
    );
    LightSystem::update(frame, &mut ubo);
    ubo
}

/// 在 FrameAcquired 阶段调用：写入并 flush uniform -> 开始 pass -> skybox -> 不透明物体 -> 光源 -> 结束 pass
///
/// 光源包含半透明混合，必须最后绘制。
pub fn record_scene<T: RenderTarget + ?Sized>(
    orchestrator: &mut FrameOrchestrator,
    target: &T,
    frame: &FrameInfo,
    bindings: &SceneBindings,
    upload_ubo: impl FnOnce(&GlobalUbo) -> GfxResult<()>,
) -> Result<(), FrameError> {
    let ubo = frame_uniforms(frame);
    upload_ubo(&ubo)?;

    orchestrator.begin_render_pass(target)?;
    orchestrator.ensure_pass_active()?;
    SkyboxRenderSystem::record(bindings.skybox, frame);
    SimpleRenderSystem::record(bindings.simple, frame);
    LightSystem::record(bindings.light, frame);
    orchestrator.end_render_pass(target)
}

/// 依赖 MSAA 与 render pass 的资源，切换 MSAA 时整体重建
struct SceneResources {
    skybox_system: SkyboxRenderSystem,
    simple_system: SimpleRenderSystem,
    light_system: LightSystem,

    global_sets: Vec<vk::DescriptorSet>,
    texture_sets: SecondaryMap<MeshHandle, vk::DescriptorSet>,
    ubo_buffers: Vec<GfxBuffer>,

    _texture_layout: DescriptorSetLayout,
    _global_layout: DescriptorSetLayout,
    _pool: DescriptorPool,
}
impl SceneResources {
    fn new(
        device: &Rc<GfxDevice>,
        shaders: &ShaderConfig,
        render_pass: vk::RenderPass,
        skybox: &GfxCubemap,
        scene: &EntityStore,
        textures: &TextureRegistry<GfxTexture>,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("SceneResources::new");

        let mut pool = scene_pool_builder(scene.total_mesh_count()).build(device, "scene-pool")?;
        let global_layout = global_layout_builder().build(device, "global-set-layout")?;
        let texture_layout = texture_layout_builder().build(device, "texture-set-layout")?;

        let ubo_buffers = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|i| GfxBuffer::new_uniform_buffer(device, size_of::<GlobalUbo>() as vk::DeviceSize, format!("global-ubo-{i}")))
            .collect::<GfxResult<Vec<_>>>()?;

        let global_sets = ubo_buffers
            .iter()
            .enumerate()
            .map(|(i, ubo)| {
                DescriptorWriter::new(&global_layout, &mut pool)
                    .write_buffer(0, ubo.descriptor_info())
                    .write_image(1, skybox.descriptor_image_info())
                    .build(format!("global-set-{i}"))
            })
            .collect::<GfxResult<Vec<_>>>()?;

        let texture_sets = assign_texture_sets(scene, textures, |handle, texture| {
            DescriptorWriter::new(&texture_layout, &mut pool)
                .write_image(0, texture.descriptor_image_info())
                .build(format!("texture-set-{:?}", handle))
        })?;

        let spv = ShaderConfig::spv_path;
        let skybox_system = SkyboxRenderSystem::new(
            device,
            render_pass,
            global_layout.handle(),
            &spv(&shaders.skybox_vert),
            &spv(&shaders.skybox_frag),
        )?;
        let simple_system = SimpleRenderSystem::new(
            device,
            render_pass,
            &[global_layout.handle(), texture_layout.handle()],
            &spv(&shaders.simple_vert),
            &spv(&shaders.simple_frag),
        )?;
        let light_system = LightSystem::new(
            device,
            render_pass,
            global_layout.handle(),
            &spv(&shaders.light_vert),
            &spv(&shaders.light_frag),
        )?;

        log::info!(
            "scene resources built: {} global sets, {} texture sets, msaa {:?}",
            global_sets.len(),
            texture_sets.len(),
            device.msaa_samples()
        );
        Ok(Self {
            skybox_system,
            simple_system,
            light_system,
            global_sets,
            texture_sets,
            ubo_buffers,
            _texture_layout: texture_layout,
            _global_layout: global_layout,
            _pool: pool,
        })
    }

    fn bindings(&self) -> SceneBindings {
        SceneBindings {
            skybox: self.skybox_system.binding(),
            simple: self.simple_system.binding(),
            light: self.light_system.binding(),
        }
    }
}

/// 持有 descriptor pool、全局 layout、每帧的 uniform buffer 以及三个 draw system
pub struct SceneRenderer {
    resources: SceneResources,
    skybox: GfxCubemap,
    shaders: ShaderConfig,
    device: Rc<GfxDevice>,
}
// new & init
impl SceneRenderer {
    pub fn new(
        device: &Rc<GfxDevice>,
        config: &RendererConfig,
        render_pass: vk::RenderPass,
        skybox: GfxCubemap,
        scene: &EntityStore,
        textures: &TextureRegistry<GfxTexture>,
    ) -> GfxResult<Self> {
        let resources = SceneResources::new(device, &config.shaders, render_pass, &skybox, scene, textures)?;
        Ok(Self {
            resources,
            skybox,
            shaders: config.shaders.clone(),
            device: device.clone(),
        })
    }

    /// 重建 pool、layout、uniform buffer、pipeline 与所有 descriptor set
    ///
    /// 调用者需要保证设备已经空闲（见 [`FrameOrchestrator::reset_resources`]）。
    pub fn rebuild(
        &mut self,
        render_pass: vk::RenderPass,
        scene: &EntityStore,
        textures: &TextureRegistry<GfxTexture>,
    ) -> GfxResult<()> {
        self.resources = SceneResources::new(&self.device, &self.shaders, render_pass, &self.skybox, scene, textures)?;
        Ok(())
    }
}
// getters
impl SceneRenderer {
    #[inline]
    pub fn bindings(&self) -> SceneBindings {
        self.resources.bindings()
    }

    #[inline]
    pub fn texture_sets(&self) -> &SecondaryMap<MeshHandle, vk::DescriptorSet> {
        &self.resources.texture_sets
    }

    #[inline]
    pub fn global_sets(&self) -> &[vk::DescriptorSet] {
        &self.resources.global_sets
    }
}
// tools
impl SceneRenderer {
    /// 执行一帧；target 不可用时返回 `Ok(false)`
    pub fn draw_frame<T: RenderTarget + ?Sized>(
        &self,
        orchestrator: &mut FrameOrchestrator,
        target: &mut T,
        camera: &Camera,
        scene: &EntityStore,
        frame_time: f32,
    ) -> Result<bool, FrameError> {
        let _span = tracy_client::span!("SceneRenderer::draw_frame");

        let Some(frame) = orchestrator.begin_frame(target)? else {
            return Ok(false);
        };

        let recorded = {
            let target: &T = target;
            let frame_info = FrameInfo {
                frame_index: frame.frame_index,
                frame_time,
                cmd: target.draw_commands(),
                camera,
                global_descriptor_set: self.resources.global_sets[frame.frame_index],
                texture_descriptor_sets: &self.resources.texture_sets,
                scene,
            };
            let ubo_buffer = &self.resources.ubo_buffers[frame.frame_index];
            record_scene(orchestrator, target, &frame_info, &self.resources.bindings(), |ubo| {
                ubo_buffer.write_pod(ubo)?;
                ubo_buffer.flush_all()
            })
        };
        if let Err(e) = recorded {
            orchestrator.abandon_frame();
            return Err(e);
        }

        orchestrator.end_frame(target)?;
        Ok(true)
    }
}
impl Drop for SceneRenderer {
    fn drop(&mut self) {
        log::info!("Destroying SceneRenderer: {} texture sets", self.resources.texture_sets.len());
    }
}
