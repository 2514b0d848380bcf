pub mod export;
pub mod feed_structs;
pub mod loader;
