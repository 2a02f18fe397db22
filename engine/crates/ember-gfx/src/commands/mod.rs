pub mod barrier;
pub mod command_buffer;
pub mod draw_commands;
