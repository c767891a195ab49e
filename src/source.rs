//! Attitude sources: a live serial stream and a recorded-file replay.

use std::io::BufRead;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::attitude::Attitude;
use crate::error::SourceError;

const RECONNECT_DELAY: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// One line of the JSON-lines wire format.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct WireSample {
    /// Milliseconds since the previous sample.
    #[serde(default)]
    pub dt: f32,
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

impl WireSample {
    pub fn attitude(&self) -> Attitude {
        Attitude::new(self.pitch, self.roll, self.yaw)
    }
}

/// Where a source currently stands, for the status line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceStatus {
    /// Connected, no sample decoded yet.
    Waiting,
    /// Delivering; the payload is seconds of stream time.
    Live(f32),
    /// Device gone; reconnect pending.
    Offline,
}

/// Single-consumer feed of attitude samples, polled once per frame.
pub trait AttitudeSource: Send + Sync {
    /// Advance per rendered frame and report status.
    fn tick(&mut self) -> SourceStatus;

    /// Newest sample, or `None` before the first arrives.
    fn latest(&self) -> Option<Attitude>;

    /// Bumps whenever the stream (re)starts and the session baseline must
    /// be recaptured: serial reconnect, replay wrap-around.
    fn generation(&self) -> u64;
}

/// Open the right source for a path: device nodes stream live over
/// serial, anything else replays a recorded file.
pub fn open_source(path: &str, baud: u32) -> crate::error::Result<Box<dyn AttitudeSource>> {
    if path.starts_with("/dev/") || path.starts_with("COM") {
        Ok(Box::new(SerialSource::start(path, baud)?))
    } else {
        Ok(Box::new(ReplaySource::load(path)?))
    }
}

#[derive(Debug, Default)]
struct Shared {
    open: bool,
    time_ms: f32,
    sample: Option<Attitude>,
    generation: u64,
}

/// Live stream from a serial device. A reader thread decodes one JSON
/// sample per line into a shared slot; the render loop polls the slot.
#[derive(Debug)]
pub struct SerialSource {
    shared: Arc<RwLock<Shared>>,
}

impl SerialSource {
    /// Probe the device and start the reader thread.
    ///
    /// A missing device node means the platform has no motion capability
    /// to offer, reported up front rather than retried forever.
    pub fn start(path: &str, baud: u32) -> Result<SerialSource, SourceError> {
        if !Path::new(path).exists() {
            return Err(SourceError::Unavailable(format!("no such device: {path}")));
        }

        let shared = Arc::new(RwLock::new(Shared::default()));
        let data = shared.clone();
        let path = path.to_string();
        thread::spawn(move || read_forever(&path, baud, data));

        Ok(SerialSource { shared })
    }
}

fn read_forever(path: &str, baud: u32, shared: Arc<RwLock<Shared>>) {
    loop {
        let port = loop {
            match serialport::new(path, baud).timeout(READ_TIMEOUT).open() {
                Ok(port) => break port,
                Err(e) => {
                    debug!(path, error = %e, "open failed, retrying");
                    thread::sleep(RECONNECT_DELAY);
                }
            }
        };
        info!(path, "connected");
        {
            let mut s = shared.write().unwrap();
            s.open = true;
            s.time_ms = 0.0;
            s.sample = None;
            s.generation += 1;
        }

        let reader = std::io::BufReader::new(port);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    use std::io::ErrorKind::*;
                    match e.kind() {
                        BrokenPipe | TimedOut | UnexpectedEof => break,
                        _ => continue,
                    }
                }
            };
            let wire: WireSample = match serde_json::from_str(&line) {
                Ok(wire) => wire,
                Err(e) => {
                    debug!(error = %e, "skipping malformed sample");
                    continue;
                }
            };

            let mut s = shared.write().unwrap();
            s.time_ms += wire.dt;
            s.sample = Some(wire.attitude());
        }

        info!(path, "disconnected");
        let mut s = shared.write().unwrap();
        s.open = false;
        s.sample = None;
    }
}

impl AttitudeSource for SerialSource {
    fn tick(&mut self) -> SourceStatus {
        let s = self.shared.read().unwrap();
        match (s.open, s.sample) {
            (false, _) => SourceStatus::Offline,
            (true, None) => SourceStatus::Waiting,
            (true, Some(_)) => SourceStatus::Live(s.time_ms * 0.001),
        }
    }

    fn latest(&self) -> Option<Attitude> {
        self.shared.read().unwrap().sample
    }

    fn generation(&self) -> u64 {
        self.shared.read().unwrap().generation
    }
}

/// Replays a recorded JSON-lines file, one sample per rendered frame,
/// looping forever. Each wrap-around counts as a fresh session.
#[derive(Debug)]
pub struct ReplaySource {
    samples: Vec<WireSample>,
    frame: usize,
    time_ms: f32,
    generation: u64,
    started: bool,
}

impl ReplaySource {
    pub fn load(path: &str) -> Result<ReplaySource, SourceError> {
        let file = std::fs::File::open(path)
            .map_err(|e| SourceError::Unavailable(format!("{path}: {e}")))?;
        let mut samples = Vec::new();
        for line in std::io::BufReader::new(file).lines() {
            let line = line?;
            match serde_json::from_str(&line) {
                Ok(wire) => samples.push(wire),
                Err(_) => continue,
            }
        }
        if samples.is_empty() {
            return Err(SourceError::Unavailable(format!("{path}: no samples")));
        }
        info!(path, count = samples.len(), "replay loaded");

        Ok(ReplaySource {
            samples,
            frame: 0,
            time_ms: 0.0,
            generation: 0,
            started: false,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AttitudeSource for ReplaySource {
    fn tick(&mut self) -> SourceStatus {
        if !self.started {
            self.started = true;
        } else {
            self.frame = (self.frame + 1) % self.samples.len();
            if self.frame == 0 {
                self.generation += 1;
                self.time_ms = 0.0;
            }
        }
        self.time_ms += self.samples[self.frame].dt;
        SourceStatus::Live(self.time_ms * 0.001)
    }

    fn latest(&self) -> Option<Attitude> {
        if self.started {
            Some(self.samples[self.frame].attitude())
        } else {
            None
        }
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn replay_file(name: &str, lines: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        path
    }

    #[test]
    fn wire_sample_decodes_named_fields() {
        let wire: WireSample =
            serde_json::from_str(r#"{"dt":16.6,"pitch":0.1,"roll":-0.2,"yaw":0.3}"#).unwrap();
        assert_eq!(wire.dt, 16.6);
        assert_eq!(wire.attitude(), Attitude::new(0.1, -0.2, 0.3));
    }

    #[test]
    fn wire_sample_dt_is_optional() {
        let wire: WireSample =
            serde_json::from_str(r#"{"pitch":0.0,"roll":0.0,"yaw":0.0}"#).unwrap();
        assert_eq!(wire.dt, 0.0);
    }

    #[test]
    fn replay_skips_malformed_lines() {
        let path = replay_file(
            "headwire_replay_malformed.jsonl",
            "garbage\n{\"pitch\":0.1,\"roll\":0.0,\"yaw\":0.2}\n{\"pitch\":}\n",
        );
        let replay = ReplaySource::load(path.to_str().unwrap()).unwrap();
        assert_eq!(replay.len(), 1);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn replay_steps_one_sample_per_tick() {
        let path = replay_file(
            "headwire_replay_steps.jsonl",
            "{\"pitch\":0.1,\"roll\":0.0,\"yaw\":0.0}\n{\"pitch\":0.2,\"roll\":0.0,\"yaw\":0.0}\n",
        );
        let mut replay = ReplaySource::load(path.to_str().unwrap()).unwrap();

        assert_eq!(replay.latest(), None);
        replay.tick();
        assert_eq!(replay.latest().unwrap().pitch, 0.1);
        replay.tick();
        assert_eq!(replay.latest().unwrap().pitch, 0.2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn replay_wrap_bumps_generation() {
        let path = replay_file(
            "headwire_replay_wrap.jsonl",
            "{\"pitch\":0.1,\"roll\":0.0,\"yaw\":0.0}\n{\"pitch\":0.2,\"roll\":0.0,\"yaw\":0.0}\n",
        );
        let mut replay = ReplaySource::load(path.to_str().unwrap()).unwrap();

        replay.tick();
        replay.tick();
        assert_eq!(replay.generation(), 0);
        replay.tick();
        assert_eq!(replay.generation(), 1);
        assert_eq!(replay.latest().unwrap().pitch, 0.1);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = ReplaySource::load("/nonexistent/headwire.jsonl").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[test]
    fn empty_file_is_unavailable() {
        let path = replay_file("headwire_replay_empty.jsonl", "");
        let err = ReplaySource::load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_serial_device_is_unavailable() {
        let err = SerialSource::start("/dev/headwire-does-not-exist", 460_800).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
