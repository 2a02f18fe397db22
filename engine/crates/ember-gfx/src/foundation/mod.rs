pub mod debug_utils;
pub mod device;
