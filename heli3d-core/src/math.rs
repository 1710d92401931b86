//! Vector and matrix helpers.
//!
//! All matrices are nalgebra column-major, the same layout the GPU expects for
//! uniform upload. Composition uses column vectors throughout:
//! `multiply(a, b)` applies `b` first, then `a`.

use nalgebra::{Matrix3, Matrix4, Vector3};
use std::f32::consts::TAU;

use crate::error::MathError;

/// Determinants below this magnitude are treated as singular
pub const SINGULAR_EPSILON: f32 = 1e-10;

/// Sum of elementwise products
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32, MathError> {
    if a.len() != b.len() {
        return Err(MathError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Elementwise `a[i] - b[i]`
pub fn subtract(a: &[f32], b: &[f32]) -> Result<Vec<f32>, MathError> {
    if a.len() != b.len() {
        return Err(MathError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

pub fn cross(a: &Vector3<f32>, b: &Vector3<f32>) -> Vector3<f32> {
    a.cross(b)
}

/// Scale `v` to unit length. Zero or non-finite input is rejected rather
/// than producing NaN components.
pub fn normalize(v: &Vector3<f32>) -> Result<Vector3<f32>, MathError> {
    let length_squared = v.dot(v);
    if !length_squared.is_finite() {
        return Err(MathError::NonFinite);
    }
    if length_squared == 0.0 {
        return Err(MathError::DegenerateVector);
    }
    Ok(v.unscale(length_squared.sqrt()))
}

/// Matrix product `a * b`
pub fn multiply(a: &Matrix4<f32>, b: &Matrix4<f32>) -> Matrix4<f32> {
    a * b
}

/// Inverse-transpose of the upper-left 3x3 block.
///
/// Returns [`MathError::SingularMatrix`] when the block has (near) zero
/// determinant; callers decide on a fallback.
pub fn normal_matrix(model_view: &Matrix4<f32>) -> Result<Matrix3<f32>, MathError> {
    ensure_finite(model_view)?;
    let upper: Matrix3<f32> = model_view.fixed_view::<3, 3>(0, 0).into_owned();
    if upper.determinant().abs() < SINGULAR_EPSILON {
        return Err(MathError::SingularMatrix);
    }
    let inverse = upper.try_inverse().ok_or(MathError::SingularMatrix)?;
    Ok(inverse.transpose())
}

pub fn ensure_finite(m: &Matrix4<f32>) -> Result<(), MathError> {
    if m.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(MathError::NonFinite)
    }
}

/// Wrap an angle into `[0, 2π)`
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), Ok(32.0));
        assert_eq!(dot(&[], &[]), Ok(0.0));
    }

    #[test]
    fn test_dot_dimension_mismatch() {
        assert_eq!(
            dot(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(MathError::DimensionMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_subtract() {
        assert_eq!(subtract(&[3.0, 2.0, 1.0], &[1.0, 1.0, 1.0]), Ok(vec![2.0, 1.0, 0.0]));
        assert!(subtract(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_cross_right_handed() {
        let z = cross(&Vector3::x(), &Vector3::y());
        assert!((z - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_normalize_unit_length() {
        for v in [
            Vector3::new(3.0, 4.0, 0.0),
            Vector3::new(-0.001, 0.002, 0.0005),
            Vector3::new(120.0, -7.0, 33.0),
        ] {
            let n = normalize(&v).unwrap();
            assert!((n.norm() - 1.0).abs() < 1e-5);
            assert!(n.dot(&v) > 0.0);
        }
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(&Vector3::zeros()), Err(MathError::DegenerateVector));
        assert_eq!(
            normalize(&Vector3::new(f32::NAN, 0.0, 0.0)),
            Err(MathError::NonFinite)
        );
    }

    #[test]
    fn test_multiply_associative() {
        let a = Matrix4::new_translation(&Vector3::new(1.0, -2.0, 3.0));
        let b = Matrix4::new_rotation(Vector3::new(0.3, -1.2, 0.7));
        let c = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 0.5, 4.0));
        let left = multiply(&multiply(&a, &b), &c);
        let right = multiply(&a, &multiply(&b, &c));
        assert!((left - right).norm() < 1e-5);
    }

    #[test]
    fn test_multiply_applies_right_operand_first() {
        let translate = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let scale = Matrix4::new_scaling(2.0);
        let p = multiply(&translate, &scale).transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        // scaled to 2, then moved to 3
        assert!((p.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_nonuniform_scale() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 2.0, 5.0));
        let n = normal_matrix(&m).unwrap();
        let expected = Matrix3::from_diagonal(&Vector3::new(1.0, 0.5, 0.2));
        assert!((n - expected).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_of_rotation_is_rotation() {
        let m = Matrix4::new_rotation(Vector3::new(0.2, 0.4, -0.9));
        let n = normal_matrix(&m).unwrap();
        let upper: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
        assert!((n - upper).norm() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_singular() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(&m), Err(MathError::SingularMatrix));

        let mut bad = Matrix4::identity();
        bad[(0, 0)] = f32::INFINITY;
        assert_eq!(normal_matrix(&bad), Err(MathError::NonFinite));
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_angle(-0.5) - (TAU - 0.5)).abs() < 1e-5);
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!(wrap_angle(-1e-9) < TAU);
    }
}
