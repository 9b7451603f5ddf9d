use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// A value that can be uploaded to a shader uniform.
///
/// Each variant maps to exactly one backend upload call. Matrices are sent
/// column-major without transposition, which is glam's native layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl Uniform {
    /// GLSL type name of the value, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat2(_) => "mat2",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
        }
    }

    /// Number of scalar components sent to the backend.
    pub fn component_count(&self) -> usize {
        match self {
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => 1,
            Self::Vec2(_) => 2,
            Self::Vec3(_) => 3,
            Self::Vec4(_) | Self::Mat2(_) => 4,
            Self::Mat3(_) => 9,
            Self::Mat4(_) => 16,
        }
    }
}

impl From<bool> for Uniform {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Uniform {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for Uniform {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec2> for Uniform {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for Uniform {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for Uniform {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<Mat2> for Uniform {
    fn from(value: Mat2) -> Self {
        Self::Mat2(value)
    }
}

impl From<Mat3> for Uniform {
    fn from(value: Mat3) -> Self {
        Self::Mat3(value)
    }
}

impl From<Mat4> for Uniform {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

impl From<[f32; 2]> for Uniform {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(Vec2::from_array(value))
    }
}

impl From<[f32; 3]> for Uniform {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(Vec3::from_array(value))
    }
}

impl From<[f32; 4]> for Uniform {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(Vec4::from_array(value))
    }
}

impl From<(f32, f32)> for Uniform {
    fn from((x, y): (f32, f32)) -> Self {
        Self::Vec2(Vec2::new(x, y))
    }
}

impl From<(f32, f32, f32)> for Uniform {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self::Vec3(Vec3::new(x, y, z))
    }
}

impl From<(f32, f32, f32, f32)> for Uniform {
    fn from((x, y, z, w): (f32, f32, f32, f32)) -> Self {
        Self::Vec4(Vec4::new(x, y, z, w))
    }
}
