//! # Catalog Read Path
//!
//! Item listings for buyers, served from a [`SearchIndex`] with the primary item store as
//! fallback, and the sync channel that keeps index documents current.

pub mod index;
pub mod reader;
pub mod sync;

pub use index::*;
pub use reader::*;
pub use sync::*;
