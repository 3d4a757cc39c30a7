//! Mathematical types for the spatial transform hierarchy.
//!
//! These are the canonical representations used across the engine:
//! the scene graph stores them, the event bus carries them, and external
//! collaborators (physics sync, navigation queries) consume them.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D vector - position, scale, direction
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All-ones vector (identity scale)
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Componentwise comparison within `epsilon`.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Componentwise product - used for scale composition.
impl std::ops::Mul for Vec3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

/// Componentwise quotient - used for scale decomposition.
///
/// Zero scale components are degenerate; the scene graph documents scale
/// as non-zero per axis.
impl std::ops::Div for Vec3 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Builds a rotation of `radians` around `axis`.
    ///
    /// The axis is normalized internally; a zero axis yields identity.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, radians: f32) -> Self {
        let len = axis.length();
        if len <= f32::EPSILON {
            return Self::IDENTITY;
        }
        let half = radians * 0.5;
        let s = half.sin() / len;
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Conjugate. For unit quaternions this is the inverse.
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector by this quaternion.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2(q x (q x v))
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Componentwise comparison within `epsilon`.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
            && (self.w - other.w).abs() <= epsilon
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product: applying `self * rhs` rotates by `rhs` first.
impl std::ops::Mul for Quaternion {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

/// Transform - position + rotation + non-uniform scale
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Rotation
    pub rotation: Quaternion,
    /// Scale (per axis, must be non-zero on every axis)
    pub scale: Vec3,
}

impl Transform {
    /// Creates a new transform
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, Vec3::ONE);

    /// Creates a translation-only transform.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quaternion::IDENTITY, Vec3::ONE)
    }

    /// Composes a parent world transform with a local transform.
    ///
    /// This is the scene graph's composition rule:
    /// `world = compose(parent.world, local)`.
    #[must_use]
    pub fn compose(parent: Self, local: Self) -> Self {
        Self {
            position: parent.position + parent.rotation.rotate(parent.scale * local.position),
            rotation: parent.rotation * local.rotation,
            scale: parent.scale * local.scale,
        }
    }

    /// Expresses this world transform relative to a parent world transform.
    ///
    /// Inverse of [`Transform::compose`]:
    /// `compose(parent, world.relative_to(parent)) == world`.
    #[must_use]
    pub fn relative_to(self, parent: Self) -> Self {
        let inv_rotation = parent.rotation.conjugate();
        Self {
            position: inv_rotation.rotate(self.position - parent.position) / parent.scale,
            rotation: inv_rotation * self.rotation,
            scale: self.scale / parent.scale,
        }
    }

    /// Comparison within `epsilon` on every component.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        self.position.approx_eq(other.position, epsilon)
            && self.rotation.approx_eq(other.rotation, epsilon)
            && self.scale.approx_eq(other.scale, epsilon)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1.0e-5;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0); // 1*4 + 2*5 + 3*6
        assert_eq!(a.cross(b), Vec3::new(-3.0, 6.0, -3.0));
        assert_eq!(a * b, Vec3::new(4.0, 10.0, 18.0));
    }

    #[test]
    fn test_quaternion_rotate() {
        // Quarter turn around Z maps +X to +Y.
        let q = Quaternion::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2);
        let rotated = q.rotate(Vec3::X);
        assert!(rotated.approx_eq(Vec3::Y, EPS));
    }

    #[test]
    fn test_quaternion_conjugate_undoes_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 1.3);
        let v = Vec3::new(2.0, -3.0, 5.0);
        let back = q.conjugate().rotate(q.rotate(v));
        assert!(back.approx_eq(v, EPS));
    }

    #[test]
    fn test_compose_identity() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::from_axis_angle(Vec3::Y, 0.7),
            Vec3::new(2.0, 2.0, 2.0),
        );
        assert!(Transform::compose(Transform::IDENTITY, t).approx_eq(t, EPS));
        assert!(Transform::compose(t, Transform::IDENTITY).approx_eq(t, EPS));
    }

    #[test]
    fn test_relative_to_round_trip() {
        let parent = Transform::new(
            Vec3::new(10.0, 0.0, -4.0),
            Quaternion::from_axis_angle(Vec3::Z, 0.9),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let world = Transform::new(
            Vec3::new(-1.0, 6.0, 2.0),
            Quaternion::from_axis_angle(Vec3::X, -0.4),
            Vec3::new(1.0, 3.0, 2.0),
        );

        let local = world.relative_to(parent);
        assert!(Transform::compose(parent, local).approx_eq(world, EPS));
    }

    #[test]
    fn test_transform_bytemuck() {
        let t = Transform::IDENTITY;
        let bytes: &[u8] = bytemuck::bytes_of(&t);
        assert_eq!(bytes.len(), 40); // 3 + 4 + 3 floats
    }
}
