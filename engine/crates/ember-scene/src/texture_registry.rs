use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use slotmap::SlotMap;

use crate::guid_new_type::TextureHandle;

/// 按稳定句柄索引的纹理 arena
///
/// 创建时必须提供 fallback 纹理，因此任何网格都能解析到一个有效纹理：
/// 没有漫反射贴图、或句柄已失效时都会得到 fallback。
/// 同一路径只会加载一次。
pub struct TextureRegistry<T> {
    textures: SlotMap<TextureHandle, Rc<T>>,
    by_path: IndexMap<PathBuf, TextureHandle>,
    fallback: TextureHandle,
}
// new & init
impl<T> TextureRegistry<T> {
    pub fn new(fallback: T) -> Self {
        let mut textures = SlotMap::with_key();
        let fallback = textures.insert(Rc::new(fallback));
        Self {
            textures,
            by_path: IndexMap::new(),
            fallback,
        }
    }
}
// getters
impl<T> TextureRegistry<T> {
    #[inline]
    pub fn fallback_handle(&self) -> TextureHandle {
        self.fallback
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    #[inline]
    pub fn handle_of(&self, path: &Path) -> Option<TextureHandle> {
        self.by_path.get(path).copied()
    }

    /// 把可选的纹理句柄解析为实际使用的句柄
    pub fn resolve_handle(&self, handle: Option<TextureHandle>) -> TextureHandle {
        handle
            .filter(|handle| self.textures.contains_key(*handle))
            .unwrap_or(self.fallback)
    }

    pub fn resolve(&self, handle: Option<TextureHandle>) -> &Rc<T> {
        // fallback 在 new 时插入且永不移除
        &self.textures[self.resolve_handle(handle)]
    }
}
// tools
impl<T> TextureRegistry<T> {
    pub fn insert(&mut self, texture: T) -> TextureHandle {
        self.textures.insert(Rc::new(texture))
    }

    /// 路径已加载时直接返回已有句柄，否则调用 `load` 加载
    pub fn get_or_load<E>(&mut self, path: &Path, load: impl FnOnce(&Path) -> Result<T, E>) -> Result<TextureHandle, E> {
        if let Some(handle) = self.by_path.get(path) {
            return Ok(*handle);
        }
        let handle = self.insert(load(path)?);
        self.by_path.insert(path.to_path_buf(), handle);
        log::debug!("texture registered: {}", path.display());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_texture_resolves_to_fallback() {
        let mut registry = TextureRegistry::new("white");
        let brick = registry.insert("brick");

        assert_eq!(**registry.resolve(None), "white");
        assert_eq!(**registry.resolve(Some(brick)), "brick");
        assert_eq!(registry.resolve_handle(None), registry.fallback_handle());
    }

    #[test]
    fn same_path_loads_once() {
        let mut registry = TextureRegistry::new(0u32);
        let mut loads = 0;
        let path = Path::new("Textures/brick.png");

        let a = registry
            .get_or_load(path, |_| {
                loads += 1;
                Ok::<_, ()>(7)
            })
            .unwrap();
        let b = registry
            .get_or_load(path, |_| {
                loads += 1;
                Ok::<_, ()>(8)
            })
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(loads, 1);
        assert_eq!(**registry.resolve(Some(a)), 7);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut registry = TextureRegistry::new(0u32);
        let path = Path::new("missing.png");
        assert!(registry.get_or_load(path, |_| Err("decode")).is_err());
        assert_eq!(registry.handle_of(path), None);
        assert_eq!(registry.len(), 1);
    }
}
