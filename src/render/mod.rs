//! OpenGL rendering: the context handle, shader programs and the host glue
//! that draws the triangle.
pub mod backend;
pub mod context;
pub mod mesh;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod uniform;

pub use backend::{ProgramId, ShaderBackend, ShaderId, UniformLocation};
pub use context::GlContext;
pub use mesh::{Mesh, Vertex};
pub use scene::Scene;
pub use shader::{ProgramBuild, ShaderError, ShaderProgram, ShaderStage};
pub use texture::Texture;
pub use uniform::Uniform;
