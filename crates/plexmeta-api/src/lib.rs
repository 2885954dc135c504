pub mod plex;
pub mod traits;

pub use traits::{CatalogService, Episode, Library, MetadataPatch, Season, Show};
