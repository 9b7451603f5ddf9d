use std::time::Duration;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use log::{info, warn};

use super::context::GlContext;
use super::mesh::Mesh;
use super::shader::ShaderProgram;
use super::texture::Texture;
use crate::config::HarnessConfig;

pub const TEXTURE_UNIT: u32 = 0;

/// Rotation about Z applied to the geometry after `elapsed`.
pub fn transform_at(elapsed: Duration, spin_speed: f32) -> Mat4 {
    Mat4::from_rotation_z(elapsed.as_secs_f32() * spin_speed)
}

/// Everything drawn each frame: one program, one mesh, an optional texture.
pub struct Scene {
    program: ShaderProgram,
    mesh: Mesh,
    texture: Option<Texture>,
    clear_color: [f32; 4],
    spin_speed: f32,
    tint: Vec3,
}

impl Scene {
    pub fn new(gl: &GlContext, config: &HarnessConfig) -> Result<Self> {
        let shaders = &config.shaders;
        let mut program = ShaderProgram::new(gl, &shaders.vertex, &shaders.fragment)
            .with_context(|| {
                format!(
                    "Failed to build shader program from {:?} and {:?}",
                    shaders.vertex, shaders.fragment
                )
            })?;

        let mesh = match Mesh::triangle(gl) {
            Ok(mesh) => mesh,
            Err(e) => {
                program.delete(gl);
                return Err(e);
            }
        };

        let texture = config
            .texture
            .as_ref()
            .and_then(|path| match Texture::from_file(gl, path) {
                Ok(texture) => {
                    info!(
                        "Loaded texture {:?} ({}x{})",
                        path,
                        texture.width(),
                        texture.height()
                    );
                    Some(texture)
                }
                Err(e) => {
                    warn!("Failed to load texture: {:#}", e);
                    None
                }
            });

        gl.set_wireframe(config.rendering.wireframe);

        Ok(Self {
            program,
            mesh,
            texture,
            clear_color: config.rendering.clear_color,
            spin_speed: config.rendering.spin_speed,
            tint: Vec3::from_array(config.rendering.tint),
        })
    }

    pub fn draw(&self, gl: &GlContext, elapsed: Duration) {
        gl.clear(self.clear_color);

        self.program.set_used(gl);
        self.program
            .set_uniform(gl, "transform", transform_at(elapsed, self.spin_speed));
        self.program
            .set_uniform_3f(gl, "tint", self.tint.x, self.tint.y, self.tint.z);
        self.program
            .set_uniform(gl, "use_texture", self.texture.is_some());

        if let Some(texture) = &self.texture {
            self.program
                .set_uniform_1i(gl, "container", TEXTURE_UNIT as i32);
            texture.bind(gl, TEXTURE_UNIT);
        }

        self.mesh.draw(gl);
    }

    /// Frees every GPU object. The context must still be current.
    pub fn destroy(&mut self, gl: &GlContext) {
        self.program.delete(gl);
        self.mesh.delete(gl);
        if let Some(texture) = &mut self.texture {
            texture.delete(gl);
        }
    }
}
