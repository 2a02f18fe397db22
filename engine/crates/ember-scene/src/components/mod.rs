pub mod entity;
pub mod mesh;
pub mod transform;
pub mod vertex;
