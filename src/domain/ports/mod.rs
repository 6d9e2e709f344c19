mod artwork_source_port;
mod metadata_sink_port;

pub use artwork_source_port::ArtworkSource;
pub use metadata_sink_port::MetadataSink;
