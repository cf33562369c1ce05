pub mod bounds;
pub mod coord;
pub mod ids;
pub mod time;
pub mod validate;

// Foundation crate: small, well-tested geographic primitives only.
pub use bounds::*;
pub use coord::*;
pub use ids::*;
pub use time::*;
pub use validate::*;
