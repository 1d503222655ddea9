//! Persistence
//!
//! Architecture cache, image cache, and the hero image file. Every write goes
//! through [`write_atomic`].

pub mod architecture_cache;
mod atomic;
pub mod hero_image;
pub mod image_cache;

pub use architecture_cache::{ArchitectureCache, CachedArchitecture};
pub use atomic::write_atomic;
pub use hero_image::{image_reference, write_hero_image};
pub use image_cache::ImageCache;
