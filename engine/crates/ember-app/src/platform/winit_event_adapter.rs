use winit::event::{KeyEvent, WindowEvent};
use winit::keyboard::PhysicalKey;

use crate::platform::input_event::{ElementState, InputEvent, KeyCode, MouseButton};

pub struct WinitEventAdapter {}
impl WinitEventAdapter {
    pub fn from_winit_event(event: &WindowEvent) -> InputEvent {
        match event {
            WindowEvent::CursorMoved { position, .. } => InputEvent::MouseMoved {
                physical_position: [position.x, position.y],
            },
            WindowEvent::MouseInput { state, button, .. } => InputEvent::MouseButtonInput {
                button: Self::button_from_winit(*button),
                state: Self::state_from_winit(*state),
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => InputEvent::KeyboardInput {
                key_code: Self::key_from_winit(*key_code),
                state: Self::state_from_winit(*state),
            },
            WindowEvent::Resized(physical_size) => InputEvent::Resized {
                physical_width: physical_size.width,
                physical_height: physical_size.height,
            },
            _ => InputEvent::Other,
        }
    }

    fn button_from_winit(button: winit::event::MouseButton) -> MouseButton {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }

    pub fn key_from_winit(key: winit::keyboard::KeyCode) -> KeyCode {
        use winit::keyboard::KeyCode as K;
        match key {
            K::KeyW => KeyCode::KeyW,
            K::KeyA => KeyCode::KeyA,
            K::KeyS => KeyCode::KeyS,
            K::KeyD => KeyCode::KeyD,
            K::Space => KeyCode::Space,
            K::ControlLeft => KeyCode::ControlLeft,
            K::KeyL => KeyCode::KeyL,
            K::F1 => KeyCode::F1,
            K::F2 => KeyCode::F2,
            K::F4 => KeyCode::F4,
            K::F8 => KeyCode::F8,
            K::Escape => KeyCode::Escape,
            _ => KeyCode::Other,
        }
    }

    fn state_from_winit(state: winit::event::ElementState) -> ElementState {
        match state {
            winit::event::ElementState::Pressed => ElementState::Pressed,
            winit::event::ElementState::Released => ElementState::Released,
        }
    }
}
