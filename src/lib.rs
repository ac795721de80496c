// Engine modules; the CLI in main.rs is a thin shell over these.
pub mod compress;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod pagesize;
#[cfg(feature = "thumbnails")]
pub mod thumbs;

// Re-export the core entry points
pub use document::{DocumentHandle, LoadOptions};
pub use error::{Error, Result};
