//! Axis conversion and the combined export transform.
use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ExportError, ExportResult};

/// A signed coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "Y")]
    Y,
    #[serde(rename = "Z")]
    Z,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "-Z")]
    NegZ,
}

impl Axis {
    /// Unit vector pointing along this axis
    pub fn vector(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
            Axis::NegX => -Vector3::x(),
            Axis::NegY => -Vector3::y(),
            Axis::NegZ => -Vector3::z(),
        }
    }

    /// Index of the underlying unsigned axis (0 = X, 1 = Y, 2 = Z)
    pub fn index(self) -> usize {
        match self {
            Axis::X | Axis::NegX => 0,
            Axis::Y | Axis::NegY => 1,
            Axis::Z | Axis::NegZ => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" | "+X" => Ok(Axis::X),
            "Y" | "+Y" => Ok(Axis::Y),
            "Z" | "+Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            other => Err(format!("unknown axis '{other}', expected one of X, Y, Z, -X, -Y, -Z")),
        }
    }
}

/// Forward/up axis pair describing a coordinate frame.
///
/// The host frame is forward `Y`, up `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOrientation", into = "RawOrientation")]
pub struct Orientation {
    forward: Axis,
    up: Axis,
}

#[derive(Serialize, Deserialize)]
struct RawOrientation {
    forward: Axis,
    up: Axis,
}

impl TryFrom<RawOrientation> for Orientation {
    type Error = ExportError;

    fn try_from(raw: RawOrientation) -> Result<Self, Self::Error> {
        Orientation::new(raw.forward, raw.up)
    }
}

impl From<Orientation> for RawOrientation {
    fn from(o: Orientation) -> Self {
        RawOrientation {
            forward: o.forward,
            up: o.up,
        }
    }
}

impl Orientation {
    /// Host default: forward `Y`, up `Z`
    pub const HOST: Orientation = Orientation {
        forward: Axis::Y,
        up: Axis::Z,
    };

    pub fn new(forward: Axis, up: Axis) -> ExportResult<Self> {
        if forward.index() == up.index() {
            return Err(ExportError::InvalidOrientation { forward, up });
        }
        Ok(Self { forward, up })
    }

    pub fn forward(&self) -> Axis {
        self.forward
    }

    pub fn up(&self) -> Axis {
        self.up
    }

    /// Rotation whose columns are the frame's right, forward and up vectors
    fn basis(&self) -> Matrix3<f32> {
        let forward = self.forward.vector();
        let up = self.up.vector();
        let right = forward.cross(&up);
        Matrix3::from_columns(&[right, forward, up])
    }

    /// Rotation taking host-frame coordinates into this frame
    pub fn conversion_matrix(&self) -> Matrix3<f32> {
        Transform::axis_conversion(&Orientation::HOST, self)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::HOST
    }
}

/// Transform builder for export-space transformations
pub struct Transform;

impl Transform {
    /// Rotation mapping `from`'s forward, up and right axes onto `to`'s.
    ///
    /// Always a proper rotation (determinant +1).
    pub fn axis_conversion(from: &Orientation, to: &Orientation) -> Matrix3<f32> {
        to.basis() * from.basis().transpose()
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Orientation remap times uniform scale
    pub fn global_matrix(orientation: &Orientation, scale: f32) -> Matrix4<f32> {
        orientation.conversion_matrix().to_homogeneous() * Matrix4::new_scaling(scale)
    }

    /// True when the matrix flips handedness
    pub fn is_negative(matrix: &Matrix4<f32>) -> bool {
        matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const AXES: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::NegX, Axis::NegY, Axis::NegZ];

    #[test]
    fn test_host_orientation_is_identity() {
        let m = Orientation::default().conversion_matrix();
        assert_relative_eq!(m, Matrix3::identity());
    }

    #[test]
    fn test_same_axis_rejected() {
        assert!(Orientation::new(Axis::Y, Axis::NegY).is_err());
        assert!(Orientation::new(Axis::Z, Axis::Z).is_err());
    }

    #[test]
    fn test_every_conversion_is_a_rotation() {
        for forward in AXES {
            for up in AXES {
                let Ok(orientation) = Orientation::new(forward, up) else {
                    continue;
                };
                let m = orientation.conversion_matrix();
                assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-6);
                assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_conversion_maps_host_axes() {
        // Y-up convention: forward -Z, up Y
        let orientation = Orientation::new(Axis::NegZ, Axis::Y).unwrap();
        let m = orientation.conversion_matrix();
        assert_relative_eq!(m * Vector3::y(), -Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(m * Vector3::z(), Vector3::y(), epsilon = 1e-6);
        assert_relative_eq!(m * Vector3::x(), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn test_global_matrix_scales() {
        let m = Transform::global_matrix(&Orientation::default(), 2.0);
        let p = m.transform_point(&Point3::new(1.0, -2.0, 3.0));
        assert_relative_eq!(p, Point3::new(2.0, -4.0, 6.0));
        assert!(!Transform::is_negative(&m));
    }

    #[test]
    fn test_mirror_is_negative() {
        let m = Transform::scale_matrix(-1.0, 1.0, 1.0);
        assert!(Transform::is_negative(&m));
        let t = Transform::translation_matrix(5.0, 0.0, 0.0);
        assert!(!Transform::is_negative(&t));
    }

    #[test]
    fn test_axis_parse_round_trip() {
        for axis in AXES {
            assert_eq!(axis.to_string().parse::<Axis>(), Ok(axis));
        }
        assert_eq!("-z".parse::<Axis>(), Ok(Axis::NegZ));
        assert!("W".parse::<Axis>().is_err());
    }
}
