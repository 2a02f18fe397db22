use std::collections::HashMap;

use crate::platform::input_event::{ElementState, InputEvent, KeyCode};

/// 记录输入信息
#[derive(Default, Clone)]
pub struct InputState {
    /// 当前的鼠标位置 pixel
    pub crt_mouse_pos: [f64; 2],
    pub key_pressed: HashMap<KeyCode, bool>,
}
impl InputState {
    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyboardInput { key_code, state } => {
                self.key_pressed.insert(*key_code, *state == ElementState::Pressed);
            }
            InputEvent::MouseMoved { physical_position } => {
                self.crt_mouse_pos = *physical_position;
            }
            _ => {}
        }
    }

    /// 检查键盘按键是否被按下
    #[inline]
    pub fn is_key_pressed(&self, key_code: KeyCode) -> bool {
        self.key_pressed.get(&key_code).copied().unwrap_or(false)
    }

    #[inline]
    pub fn mouse_position(&self) -> [f64; 2] {
        self.crt_mouse_pos
    }
}
