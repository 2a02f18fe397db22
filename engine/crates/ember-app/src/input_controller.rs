use crossbeam_channel::Sender;
use ember_renderer::render_settings::MsaaLevel;
use ember_scene::components::transform::TransformComponent;
use glam::Vec3;

use crate::platform::input_event::{ElementState, InputEvent, KeyCode, MouseButton};
use crate::platform::input_state::InputState;
use crate::render_command::RenderCommand;

/// pitch 的限制范围，避免翻转
pub const PITCH_LIMIT: f32 = 1.5;

#[derive(Clone, Copy, Debug)]
pub struct KeyMappings {
    pub move_left: KeyCode,
    pub move_right: KeyCode,
    pub move_forward: KeyCode,
    pub move_backward: KeyCode,
    pub move_up: KeyCode,
    pub move_down: KeyCode,
}
impl Default for KeyMappings {
    fn default() -> Self {
        Self {
            move_left: KeyCode::KeyA,
            move_right: KeyCode::KeyD,
            move_forward: KeyCode::KeyW,
            move_backward: KeyCode::KeyS,
            move_up: KeyCode::Space,
            move_down: KeyCode::ControlLeft,
        }
    }
}

/// 第一人称的相机控制器
///
/// 坐标系：+X 右，-Y 上，+Z 前。光标捕获状态与上一帧鼠标位置都保存在这里，
/// 窗口层根据 [`Self::cursor_captured`] 设置光标的 grab 模式。
pub struct InputController {
    pub keys: KeyMappings,
    pub move_speed: f32,
    pub look_speed: f32,

    state: InputState,
    cursor_captured: bool,
    first_mouse: bool,
    last_mouse: [f64; 2],

    commands: Sender<RenderCommand>,
}
// new & init
impl InputController {
    pub fn new(commands: Sender<RenderCommand>) -> Self {
        Self {
            keys: KeyMappings::default(),
            move_speed: 3.0,
            look_speed: 1.5,
            state: InputState::default(),
            cursor_captured: false,
            first_mouse: true,
            last_mouse: [0.0; 2],
            commands,
        }
    }
}
// getters
impl InputController {
    #[inline]
    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    #[inline]
    pub fn input_state(&self) -> &InputState {
        &self.state
    }
}
// tools
impl InputController {
    /// 处理一个窗口事件；功能键转换为 [`RenderCommand`]
    pub fn handle_event(&mut self, event: &InputEvent) {
        self.state.apply(event);

        match event {
            InputEvent::KeyboardInput {
                key_code,
                state: ElementState::Pressed,
            } => {
                let command = match key_code {
                    KeyCode::F1 => Some(RenderCommand::SetMsaa(MsaaLevel::X1)),
                    KeyCode::F2 => Some(RenderCommand::SetMsaa(MsaaLevel::X2)),
                    KeyCode::F4 => Some(RenderCommand::SetMsaa(MsaaLevel::X4)),
                    KeyCode::F8 => Some(RenderCommand::SetMsaa(MsaaLevel::X8)),
                    KeyCode::KeyL => Some(RenderCommand::ToggleLightOrbit),
                    KeyCode::Escape => Some(RenderCommand::Exit),
                    _ => None,
                };
                if let Some(command) = command {
                    self.send(command);
                }
            }
            InputEvent::MouseButtonInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
            } => {
                self.cursor_captured = !self.cursor_captured;
                if self.cursor_captured {
                    self.first_mouse = true;
                }
                log::debug!("cursor captured: {}", self.cursor_captured);
            }
            _ => {}
        }
    }

    /// 光标被捕获时，根据鼠标位移更新 yaw / pitch
    pub fn process_mouse_movement(&mut self, dt: f32, transform: &mut TransformComponent) {
        if !self.cursor_captured {
            return;
        }

        let [x, y] = self.state.mouse_position();
        if self.first_mouse {
            self.last_mouse = [x, y];
            self.first_mouse = false;
        }

        let offset_x = (x - self.last_mouse[0]) as f32 * self.look_speed;
        let offset_y = (self.last_mouse[1] - y) as f32 * self.look_speed;
        self.last_mouse = [x, y];

        transform.rotation.y += offset_x * dt;
        transform.rotation.x = (transform.rotation.x + offset_y * dt).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// 沿 yaw / pitch 决定的前方与右方移动；上下沿世界 -Y / +Y
    pub fn move_in_space(&self, dt: f32, transform: &mut TransformComponent) {
        let yaw = transform.rotation.y;
        let pitch = transform.rotation.x;

        let forward = Vec3::new(pitch.cos() * yaw.sin(), -pitch.sin(), pitch.cos() * yaw.cos());
        let right = Vec3::new(forward.z, 0.0, -forward.x);

        let pressed = |key| self.state.is_key_pressed(key);
        let mut move_dir = Vec3::ZERO;
        if pressed(self.keys.move_forward) {
            move_dir += forward;
        }
        if pressed(self.keys.move_backward) {
            move_dir -= forward;
        }
        if pressed(self.keys.move_right) {
            move_dir += right;
        }
        if pressed(self.keys.move_left) {
            move_dir -= right;
        }
        if pressed(self.keys.move_up) {
            move_dir.y -= 1.0;
        }
        if pressed(self.keys.move_down) {
            move_dir.y += 1.0;
        }

        if move_dir.length_squared() > f32::EPSILON {
            transform.translation += self.move_speed * dt * move_dir.normalize();
        }
    }

    fn send(&self, command: RenderCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("render command dropped, receiver closed: {:?}", command);
        }
    }
}
