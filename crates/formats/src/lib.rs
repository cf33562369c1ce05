pub mod feed;
pub mod polyline;
pub mod scene_ingest;

pub use feed::*;
pub use polyline::{MalformedRoute, decode as decode_polyline, encode as encode_polyline};
pub use scene_ingest::*;
