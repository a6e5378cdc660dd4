//! Seams to the external detectors.
//!
//! The object detector and the face finder are collaborators, not part of the
//! engine. This module defines the traits they are adapted through, the raw
//! and validated detection types, and a few in-crate backends used by the CLI
//! and by tests.

mod backend;
pub mod backends;
mod registry;
mod result;

pub use backend::{DetectorBackend, FaceFinder};
pub use backends::{FullFrameBackend, NoFaceFinder, ReplayBackend, ReplayFaceFinder};
pub use registry::BackendRegistry;
pub use result::{Detection, RawDetection, PERSON_CLASS_ID};
