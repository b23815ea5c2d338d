//! Math utilities and types
//!
//! Provides the 4x4 matrix math used by the 2D draw pipeline. Matrices are
//! column-major `f32` (nalgebra storage), and all 2D transforms act on the
//! XY plane with Z left untouched.

pub use nalgebra::{Matrix4, Point3, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Extension trait for Mat4 with the operations the 2D pipeline needs
pub trait Mat4Ext {
    /// Orthographic projection with near plane -1 and far plane 1
    fn ortho(left: f32, right: f32, bottom: f32, top: f32) -> Mat4;

    /// Matrix product `self * other`
    fn multiply(&self, other: &Mat4) -> Mat4;

    /// Post-multiply by a translation in the XY plane
    fn translated(&self, x: f32, y: f32) -> Mat4;

    /// Post-multiply by a scale in the XY plane
    fn scaled(&self, x: f32, y: f32) -> Mat4;

    /// Post-multiply by a rotation about the Z axis, in degrees
    fn rotated(&self, degrees: f32) -> Mat4;

    /// Inverse of the matrix, `None` when it is singular
    fn inverse(&self) -> Option<Mat4>;

    /// Transform a 2D point (z = 0, w = 1)
    fn transform_point_2d(&self, x: f32, y: f32) -> (f32, f32);
}

impl Mat4Ext for Mat4 {
    fn ortho(left: f32, right: f32, bottom: f32, top: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, -1.0, 1.0)
    }

    fn multiply(&self, other: &Mat4) -> Mat4 {
        self * other
    }

    fn translated(&self, x: f32, y: f32) -> Mat4 {
        self * Mat4::new_translation(&Vec3::new(x, y, 0.0))
    }

    fn scaled(&self, x: f32, y: f32) -> Mat4 {
        self * Mat4::new_nonuniform_scaling(&Vec3::new(x, y, 1.0))
    }

    fn rotated(&self, degrees: f32) -> Mat4 {
        self * Mat4::from_axis_angle(&Vec3::z_axis(), degrees * constants::DEG_TO_RAD)
    }

    fn inverse(&self) -> Option<Mat4> {
        self.try_inverse()
    }

    fn transform_point_2d(&self, x: f32, y: f32) -> (f32, f32) {
        let point = self.transform_point(&Point3::new(x, y, 0.0));
        (point.x, point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_leaves_points_unchanged() {
        let (x, y) = Mat4::identity().transform_point_2d(3.0, -4.0);
        assert_relative_eq!(x, 3.0);
        assert_relative_eq!(y, -4.0);
    }

    #[test]
    fn test_ortho_maps_pixel_corners_to_ndc() {
        // Pixel space, y down
        let projection = Mat4::ortho(0.0, 640.0, 480.0, 0.0);

        let (x, y) = projection.transform_point_2d(0.0, 0.0);
        assert_relative_eq!(x, -1.0);
        assert_relative_eq!(y, 1.0);

        let (x, y) = projection.transform_point_2d(640.0, 480.0);
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, -1.0);
    }

    #[test]
    fn test_transforms_compose_in_call_order() {
        // translate then scale: the scale applies to the point first
        let m = Mat4::identity().translated(10.0, 5.0).scaled(2.0, 3.0);
        let (x, y) = m.transform_point_2d(1.0, 1.0);
        assert_relative_eq!(x, 12.0);
        assert_relative_eq!(y, 8.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let m = Mat4::identity().rotated(90.0);
        let (x, y) = m.transform_point_2d(1.0, 0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_round_trips_point() {
        let m = Mat4::identity().translated(7.0, -2.0).rotated(30.0).scaled(2.0, 0.5);
        let inv = m.inverse().expect("matrix should be invertible");
        let (x, y) = m.transform_point_2d(3.0, 4.0);
        let (bx, by) = inv.transform_point_2d(x, y);
        assert_relative_eq!(bx, 3.0, epsilon = 1e-4);
        assert_relative_eq!(by, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = Mat4::identity().scaled(0.0, 1.0);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_multiply_matches_operator() {
        let a = Mat4::identity().translated(1.0, 2.0);
        let b = Mat4::identity().scaled(3.0, 3.0);
        assert_relative_eq!(a.multiply(&b), a * b);
    }
}
