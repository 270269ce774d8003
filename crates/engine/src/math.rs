//! Orientation helpers shared by free-look and camera focus.
//!
//! Convention: +Y is up, forward is -Z, right-handed. Body yaw spins about
//! +Y; a positive viewpoint pitch tilts the forward vector upward.

use glam::{Mat3, Quat, Vec3};

/// Horizontal magnitudes below this are treated as "looking straight up/down".
pub const HORIZONTAL_EPSILON: f32 = 1e-4;

pub const PITCH_LIMIT_DEGREES: f32 = 90.0;

/// Wraps an angle in degrees into `[-180, 180)`.
pub fn normalize_degrees(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn clamp_pitch(pitch_degrees: f32) -> f32 {
    pitch_degrees.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES)
}

/// Projection of `forward` onto the horizontal plane, or `None` when the
/// remaining magnitude is negligible.
pub fn horizontal_direction(forward: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(forward.x, 0.0, forward.z);
    let length = flat.length();
    if length < HORIZONTAL_EPSILON || !length.is_finite() {
        return None;
    }
    Some(flat / length)
}

/// Yaw (radians about +Y) whose forward vector points along `direction`.
pub fn yaw_facing(direction: Vec3) -> f32 {
    (-direction.x).atan2(-direction.z)
}

/// Rotation whose forward (-Z) axis points along `direction`.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    let forward = direction.try_normalize()?;
    let right = forward
        .cross(up)
        .try_normalize()
        .or_else(|| forward.cross(Vec3::Z).try_normalize())?;
    let true_up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, true_up, -forward)).normalize())
}

/// Pitch in degrees encoded by a viewpoint's local rotation, unclamped.
pub fn pitch_degrees_of(local_rotation: Quat) -> f32 {
    let forward = local_rotation * Vec3::NEG_Z;
    let horizontal = Vec3::new(forward.x, 0.0, forward.z).length();
    normalize_degrees(forward.y.atan2(horizontal).to_degrees())
}

pub fn angle_between_degrees(a: Quat, b: Quat) -> f32 {
    a.angle_between(b).to_degrees()
}
