pub mod noop;
pub mod recording;
pub mod surface;

pub use noop::*;
pub use recording::*;
pub use surface::*;
