//! headwire - head-orientation overlay
//!
//! Streams attitude samples (pitch/roll/yaw) from a motion sensor,
//! offsets them against a calibration baseline captured at session
//! start, and drives a wireframe 3D head plus three per-axis bars.
//!
//! The first sample after a stream (re)start becomes the baseline; every
//! sample is rendered relative to it, with the pitch axis sign-inverted.

pub mod attitude;
pub mod error;
pub mod overlay;
pub mod session;
pub mod source;

pub use attitude::{progress, Attitude};
pub use error::{SessionError, SourceError};
pub use session::{display_rotation, SessionState, TrackingSession};
pub use source::{open_source, AttitudeSource, ReplaySource, SerialSource, SourceStatus, WireSample};
