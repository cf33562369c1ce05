pub mod area;
pub mod id_set;
pub mod intent;
pub mod marker;
pub mod scene;

pub use area::*;
pub use id_set::*;
pub use intent::*;
pub use marker::*;
pub use scene::*;
