pub mod input_event;
pub mod input_state;
pub mod winit_event_adapter;
