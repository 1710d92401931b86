/// Error types shared by the core and the drawing backends
use strum::Display;
use thiserror::Error;

/// Faults raised by the vector/matrix layer
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MathError {
    #[error("dimension mismatch: {left} vs {right} components")]
    DimensionMismatch { left: usize, right: usize },

    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    #[error("matrix is singular and has no inverse")]
    SingularMatrix,

    #[error("matrix contains non-finite components")]
    NonFinite,
}

/// Invalid perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid projection range: near={near}, far={far} (need 0 < near < far < inf)")]
    InvalidRange { near: f32, far: f32 },

    #[error("invalid vertical field of view: {0} rad")]
    InvalidFieldOfView(f32),

    #[error("invalid aspect ratio: {0}")]
    InvalidAspect(f32),
}

/// Malformed mesh data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },

    #[error("{normals} normals supplied for {vertices} vertices")]
    NormalCount { vertices: usize, normals: usize },

    #[error("flat {0} array length {1} is not a multiple of 3")]
    FlatLength(&'static str, usize),

    #[error("{0} vertices cannot be addressed with 16-bit indices")]
    TooManyVertices(usize),
}

/// Shader stage named in compile diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Errors surfaced by a drawing backend or by frame submission
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("failed to link shader program: {0}")]
    ProgramLink(String),

    #[error("failed to create {0}")]
    ResourceCreation(&'static str),

    #[error("no uploaded mesh with handle {0}")]
    UnknownMesh(usize),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors loading or validating a demo configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_stage_in_compile_message() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        let err = RenderError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to compile fragment shader: 0:3: syntax error"
        );
    }
}
