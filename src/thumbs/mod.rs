//! Thumbnail rendering with identity-keyed parse memoization

mod cache;
mod render;

pub use cache::IdentityCache;
pub use render::{DEFAULT_THUMBNAIL_SCALE, RenderView, Thumbnailer};
