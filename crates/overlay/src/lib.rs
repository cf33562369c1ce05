//! Overlay synchronization engine.
//!
//! Keeps a stateful map surface (markers, a route, an incident pin and
//! disaster-area polygons) consistent with a declarative [`scene::Scene`]
//! rebuilt by the UI on every update, issuing only the adapter calls needed to
//! move from what is rendered to what is wanted.

pub mod config;
pub mod error;
pub mod readiness;
pub mod reconciler;
pub mod rendered;
pub mod viewport;

pub use config::*;
pub use error::*;
pub use readiness::*;
pub use reconciler::*;
pub use rendered::*;
pub use viewport::*;
