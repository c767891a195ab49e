//! Head orientation as pitch/roll/yaw angles.

/// An attitude sample: intrinsic pitch, roll and yaw in radians.
///
/// Each angle is typically within [-π, π] as delivered by the sensor.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

impl Attitude {
    pub fn new(pitch: f32, roll: f32, yaw: f32) -> Attitude {
        Attitude { pitch, roll, yaw }
    }
}

/// Map an angle onto a progress-bar fraction via `(angle + 1) / 2`.
///
/// Deliberately unclamped: angles are radians and range beyond ±1, so the
/// result can leave [0, 1]. The UI clamps at paint time only.
pub fn progress(angle: f32) -> f32 {
    (angle + 1.0) / 2.0
}
