use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Draw polygon outlines instead of filled faces.
    pub wireframe: bool,
    pub clear_color: [f32; 4],
    /// Rotation of the transform uniform, in radians per second.
    pub spin_speed: f32,
    pub tint: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            wireframe: cfg!(feature = "wireframe"),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            spin_speed: 1.0,
            tint: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shaders/basic.vert"),
            fragment: PathBuf::from("shaders/basic.frag"),
        }
    }
}
