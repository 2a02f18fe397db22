use std::path::PathBuf;

use ash::vk;

use crate::descriptors::pool::PoolResourceKind;

pub type GfxResult<T> = Result<T, GfxError>;

#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    #[error("vulkan call failed: {0}")]
    Vk(#[from] vk::Result),

    #[error("descriptor binding {0} is declared more than once")]
    DuplicateBinding(u32),

    #[error("descriptor binding {binding} is not declared in layout `{layout}`")]
    UnknownBinding { binding: u32, layout: String },

    #[error("descriptor binding {binding} of layout `{layout}` was never written")]
    MissingBinding { binding: u32, layout: String },

    #[error("descriptor binding {binding} expects {expected:?}, but a {actual} resource was written")]
    DescriptorTypeMismatch {
        binding: u32,
        expected: vk::DescriptorType,
        actual: &'static str,
    },

    #[error("descriptor pool `{pool}` exhausted: {kind} requested {requested}, only {available} left")]
    PoolExhausted {
        pool: String,
        kind: PoolResourceKind,
        requested: u32,
        available: u32,
    },

    #[error("cubemap face {face} is {actual:?}, expected {expected:?} like face 0")]
    CubemapFaceMismatch {
        face: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("pixel data has {actual} bytes, expected {expected}")]
    PixelDataSize { expected: usize, actual: usize },

    #[error("buffer `{0}` is not host mapped")]
    NotMapped(String),

    #[error("write of {len} bytes at offset {offset} overflows buffer `{name}` of {capacity} bytes")]
    WriteOutOfRange {
        name: String,
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("failed to load shader `{path}`: {source}")]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
