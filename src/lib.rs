pub mod config;
pub mod render;

// Re-export commonly used types
pub use config::HarnessConfig;
pub use render::context::GlContext;
pub use render::scene::Scene;
pub use render::shader::{ProgramBuild, ShaderError, ShaderProgram, ShaderStage};
pub use render::uniform::Uniform;
