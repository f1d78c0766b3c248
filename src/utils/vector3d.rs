use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D { x, y, z }
    }

    pub fn zeros() -> Self {
        Vector3D::new(0.0, 0.0, 0.0)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    pub fn unit(&self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            *self
        } else {
            Vector3D::new(self.x / mag, self.y / mag, self.z / mag)
        }
    }

    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        Vector3D::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn angle(&self, other: &Vector3D) -> f64 {
        if self.magnitude() == 0.0 || other.magnitude() == 0.0 {
            return 0.0;
        }
        self.cross(other).magnitude().atan2(self.dot(other))
    }

    pub fn rotate_about(&self, axis: &Vector3D, angle: f64) -> Vector3D {
        let k = axis.unit();
        let (sin, cos) = angle.sin_cos();
        *self * cos + k.cross(self) * sin + k * (k.dot(self) * (1.0 - cos))
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        Vector3D::new(values[0], values[1], values[2])
    }
}

impl Sum for Vector3D {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vector3D::zeros(), |a, b| a + b)
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Vector3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Vector3D::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vector3D> for f64 {
    type Output = Vector3D;

    fn mul(self, vector: Vector3D) -> Vector3D {
        Vector3D::new(self * vector.x, self * vector.y, self * vector.z)
    }
}

impl Div<f64> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Vector3D::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_cross_product_of_basis_vectors() {
        let x = Vector3D::new(1.0, 0.0, 0.0);
        let y = Vector3D::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vector3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_unit_of_zero_vector() {
        assert_eq!(Vector3D::zeros().unit(), Vector3D::zeros());
    }

    #[test]
    fn test_angle_between_orthogonal_vectors() {
        let a = Vector3D::new(3.0, 0.0, 0.0);
        let b = Vector3D::new(0.0, 0.0, 2.0);
        assert_relative_eq!(a.angle(&b), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_about_z() {
        let x = Vector3D::new(1.0, 0.0, 0.0);
        let rotated = x.rotate_about(&Vector3D::new(0.0, 0.0, 1.0), PI / 2.0);
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_preserves_magnitude() {
        let v = Vector3D::new(1.0, -2.0, 3.5);
        let rotated = v.rotate_about(&Vector3D::new(0.3, 0.4, -1.2), 0.7);
        assert_relative_eq!(rotated.magnitude(), v.magnitude(), epsilon = 1e-12);
    }
}
