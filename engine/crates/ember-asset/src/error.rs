use std::path::PathBuf;

use ember_gfx::GfxError;

pub type AssetResult<T> = Result<T, AssetError>;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode image `{path}`: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load obj `{path}`: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("invalid cubemap faces: {0}")]
    Cubemap(#[source] GfxError),

    #[error("failed to create gpu resource for `{name}`: {source}")]
    Gpu {
        name: String,
        #[source]
        source: GfxError,
    },
}
impl AssetError {
    pub(crate) fn gpu(name: impl Into<String>) -> impl FnOnce(GfxError) -> Self {
        let name = name.into();
        move |source| Self::Gpu { name, source }
    }
}
