//! Tracking session: calibration baseline and relative display rotation.

use crate::attitude::Attitude;
use crate::error::SessionError;

/// Lifecycle of a tracking session. Terminal only at process exit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    NotStarted,
    WaitingForFirstSample,
    Running,
}

/// Owns the calibration offset and the newest raw sample.
///
/// The first sample ingested after a (re)start becomes the calibration
/// offset and is never recomputed for the rest of the session. All later
/// samples are reported relative to it.
#[derive(Debug, Default)]
pub struct TrackingSession {
    offset: Option<Attitude>,
    latest: Option<Attitude>,
    state: SessionState,
}

/// Rotation applied to the head node: current minus offset per axis,
/// with the pitch axis sign-inverted so the mesh nods toward the viewer.
pub fn display_rotation(current: Attitude, offset: Attitude) -> Attitude {
    Attitude {
        pitch: -(current.pitch - offset.pitch),
        roll: current.roll - offset.roll,
        yaw: current.yaw - offset.yaw,
    }
}

impl TrackingSession {
    pub fn new() -> TrackingSession {
        TrackingSession::default()
    }

    /// Begin waiting for the first sample.
    pub fn start(&mut self) {
        if self.state == SessionState::NotStarted {
            self.state = SessionState::WaitingForFirstSample;
        }
    }

    /// Feed one sample. The first one since start/restart is captured as
    /// the calibration offset; every one becomes the newest raw sample.
    pub fn ingest(&mut self, sample: Attitude) {
        if self.offset.is_none() {
            self.offset = Some(sample);
        }
        self.latest = Some(sample);
        self.state = SessionState::Running;
    }

    /// Discard the baseline; the next sample recalibrates.
    pub fn restart(&mut self) {
        self.offset = None;
        self.latest = None;
        self.state = SessionState::WaitingForFirstSample;
    }

    /// Offset-relative rotation for the newest sample.
    pub fn display_rotation(&self) -> Result<Attitude, SessionError> {
        let offset = self.offset.ok_or(SessionError::NotCalibrated)?;
        let current = self.latest.ok_or(SessionError::NotCalibrated)?;
        Ok(display_rotation(current, offset))
    }

    pub fn offset(&self) -> Option<Attitude> {
        self.offset
    }

    /// Newest raw (uncalibrated) sample, as shown on the bars.
    pub fn latest(&self) -> Option<Attitude> {
        self.latest
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_becomes_offset() {
        let mut session = TrackingSession::new();
        session.start();
        session.ingest(Attitude::new(0.1, 0.0, 0.2));
        session.ingest(Attitude::new(0.5, -0.3, 0.9));

        assert_eq!(session.offset(), Some(Attitude::new(0.1, 0.0, 0.2)));
        assert_eq!(session.latest(), Some(Attitude::new(0.5, -0.3, 0.9)));
    }

    #[test]
    fn first_sample_renders_at_identity() {
        let mut session = TrackingSession::new();
        session.start();
        session.ingest(Attitude::new(0.1, 0.0, 0.2));

        assert_eq!(session.display_rotation(), Ok(Attitude::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn later_samples_render_relative_to_offset() {
        let mut session = TrackingSession::new();
        session.start();
        session.ingest(Attitude::new(0.1, 0.0, 0.2));
        session.ingest(Attitude::new(0.15, 0.0, 0.2));

        let rotation = session.display_rotation().unwrap();
        assert!((rotation.pitch - -0.05).abs() < 1e-6);
        assert_eq!(rotation.roll, 0.0);
        assert_eq!(rotation.yaw, 0.0);
    }

    #[test]
    fn pitch_is_sign_inverted_only() {
        let rotation = display_rotation(
            Attitude::new(0.4, 0.3, -0.2),
            Attitude::new(0.1, 0.1, 0.1),
        );
        assert!((rotation.pitch - -0.3).abs() < 1e-6);
        assert!((rotation.roll - 0.2).abs() < 1e-6);
        assert!((rotation.yaw - -0.3).abs() < 1e-6);
    }

    #[test]
    fn rotation_before_calibration_is_an_error() {
        let mut session = TrackingSession::new();
        assert_eq!(session.display_rotation(), Err(SessionError::NotCalibrated));
        session.start();
        assert_eq!(session.display_rotation(), Err(SessionError::NotCalibrated));
    }

    #[test]
    fn restart_discards_offset_and_recalibrates() {
        let mut session = TrackingSession::new();
        session.start();
        session.ingest(Attitude::new(0.1, 0.0, 0.2));
        session.restart();

        assert_eq!(session.state(), SessionState::WaitingForFirstSample);
        assert_eq!(session.display_rotation(), Err(SessionError::NotCalibrated));

        session.ingest(Attitude::new(0.3, 0.0, 0.0));
        assert_eq!(session.offset(), Some(Attitude::new(0.3, 0.0, 0.0)));
        assert_eq!(session.display_rotation(), Ok(Attitude::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn state_walks_not_started_waiting_running() {
        let mut session = TrackingSession::new();
        assert_eq!(session.state(), SessionState::NotStarted);
        session.start();
        assert_eq!(session.state(), SessionState::WaitingForFirstSample);
        session.ingest(Attitude::default());
        assert_eq!(session.state(), SessionState::Running);
    }
}
