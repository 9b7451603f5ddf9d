use std::mem;
use std::num::NonZeroU32;

use anyhow::{bail, Result};
use bytemuck::{Pod, Zeroable};
use gl::types::*;

use super::context::GlContext;

/// Interleaved vertex layout: position, colour, texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], colour: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            colour,
            tex_coords,
        }
    }
}

pub const TRIANGLE: [Vertex; 3] = [
    // right, red
    Vertex::new([0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
    // left, green
    Vertex::new([-0.5, -0.5, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
    // top, blue
    Vertex::new([0.0, 0.5, 0.0], [0.0, 0.0, 1.0], [0.5, 1.0]),
];

/// (location, component count, byte offset) of each vertex attribute.
fn attributes() -> [(GLuint, GLint, usize); 3] {
    [
        (0, 3, mem::offset_of!(Vertex, position)),
        (1, 3, mem::offset_of!(Vertex, colour)),
        (2, 2, mem::offset_of!(Vertex, tex_coords)),
    ]
}

/// A vertex array object with one static vertex buffer.
pub struct Mesh {
    vao: Option<NonZeroU32>,
    vbo: Option<NonZeroU32>,
    vertex_count: usize,
}

impl Mesh {
    pub fn new(gl: &GlContext, vertices: &[Vertex]) -> Result<Self> {
        let mut vao = 0;
        let mut vbo = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);
        }

        let mut mesh = Self {
            vao: NonZeroU32::new(vao),
            vbo: NonZeroU32::new(vbo),
            vertex_count: vertices.len(),
        };
        let (Some(vao), Some(vbo)) = (mesh.vao, mesh.vbo) else {
            mesh.delete(gl);
            bail!("Failed to allocate vertex array or buffer");
        };

        let data: &[u8] = bytemuck::cast_slice(vertices);
        let stride = mem::size_of::<Vertex>() as GLsizei;
        unsafe {
            gl::BindVertexArray(vao.get());
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo.get());
            gl::BufferData(
                gl::ARRAY_BUFFER,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            for (location, size, offset) in attributes() {
                gl::VertexAttribPointer(
                    location,
                    size,
                    gl::FLOAT,
                    gl::FALSE,
                    stride,
                    offset as *const _,
                );
                gl::EnableVertexAttribArray(location);
            }

            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
            gl::BindVertexArray(0);
        }

        log::debug!("Uploaded mesh with {} vertices", mesh.vertex_count);
        Ok(mesh)
    }

    pub fn triangle(gl: &GlContext) -> Result<Self> {
        Self::new(gl, &TRIANGLE)
    }

    pub fn draw(&self, gl: &GlContext) {
        let Some(vao) = self.vao else {
            return;
        };
        unsafe {
            gl::BindVertexArray(vao.get());
        }
        gl.draw_triangles(0, self.vertex_count);
    }

    /// Frees the vertex array and buffer. Calling it again does nothing.
    pub fn delete(&mut self, _gl: &GlContext) {
        unsafe {
            if let Some(vao) = self.vao.take() {
                gl::DeleteVertexArrays(1, &vao.get());
            }
            if let Some(vbo) = self.vbo.take() {
                gl::DeleteBuffers(1, &vbo.get());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(mem::size_of::<Vertex>(), 8 * mem::size_of::<f32>());
        let offsets: Vec<usize> = attributes().iter().map(|(_, _, offset)| *offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn test_triangle_bytes() {
        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE);
        assert_eq!(bytes.len(), 3 * mem::size_of::<Vertex>());
        assert_eq!(TRIANGLE[2].tex_coords, [0.5, 1.0]);
    }
}
