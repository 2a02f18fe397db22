use slotmap::new_key_type;

new_key_type! { pub struct EntityHandle; }
new_key_type! { pub struct ModelHandle; }
new_key_type! { pub struct MeshHandle; }
new_key_type! { pub struct TextureHandle; }
