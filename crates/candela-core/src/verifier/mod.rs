pub mod domain;
pub mod quorum;
pub mod verify;

pub use domain::*;
pub use quorum::*;
pub use verify::*;
