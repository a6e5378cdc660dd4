pub mod faces;
pub mod full_frame;
pub mod replay;

pub use faces::{NoFaceFinder, ReplayFaceFinder};
pub use full_frame::FullFrameBackend;
pub use replay::ReplayBackend;
