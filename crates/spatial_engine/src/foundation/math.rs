//! Math types shared by every spatial structure
//!
//! All geometry is single precision. Vectors and matrices come straight from
//! nalgebra; matrices follow its column-vector convention (`clip = m * v`).

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Tolerance used by the "is this zero / parallel" checks of the
/// intersection routines.
pub const EPSILON: f32 = 1e-6;

/// Looser tolerance for plane-distance comparisons, where the inputs have
/// already gone through a normalization.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Component-wise absolute value.
#[inline]
pub fn abs3(v: &Vec3) -> Vec3 {
    v.map(f32::abs)
}

/// Component-wise absolute value.
#[inline]
pub fn abs2(v: &Vec2) -> Vec2 {
    v.map(f32::abs)
}

/// Extension trait for building camera matrices used to drive frusta
pub trait Mat4Ext {
    /// Right-handed perspective projection with a `[0, 1]` depth range
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        // The camera looks down -Z; clip w = -z_view, depth maps near..far to 0..1.
        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = (near * far) / (near - far);
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        Mat4::new(
            right.x, right.y, right.z, -right.dot(&eye),
            camera_up.x, camera_up.y, camera_up.z, -camera_up.dot(&eye),
            -forward.x, -forward.y, -forward.z, forward.dot(&eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perspective_maps_near_and_far_to_depth_range() {
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);

        let near = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);

        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(3.0, 4.0, 5.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let transformed = view.transform_point(&nalgebra::Point3::from(eye));
        assert_relative_eq!(transformed.coords, Vec3::zeros(), epsilon = 1e-5);
    }
}
