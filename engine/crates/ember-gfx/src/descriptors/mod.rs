pub mod layout;
pub mod pool;
pub mod writer;
