pub mod animation;
pub mod event_bus;
pub mod frame;
pub mod metrics;

pub use animation::*;
pub use event_bus::*;
pub use frame::*;
pub use metrics::*;
