//! Package assembly: collection database, media and the `.apkg` archive

pub mod media;
mod writer;

pub use media::{MediaEntry, MediaError, MediaFetcher, MediaFilter, MediaMap};
pub use writer::{Package, COLLECTION_ENTRY, MEDIA_MANIFEST_ENTRY};
