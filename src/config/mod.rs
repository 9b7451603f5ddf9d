pub mod core;
pub mod rendering;
pub mod window;

pub use self::core::{ConfigError, HarnessConfig};
pub use self::rendering::{RenderConfig, ShaderConfig};
pub use self::window::{ContextConfig, WindowConfig};
