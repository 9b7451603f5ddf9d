use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::num::NonZeroU32;

use gl::types::*;

use super::backend::{ProgramId, ShaderBackend, ShaderId, UniformLocation};
use super::shader::ShaderStage;
use super::uniform::Uniform;

/// Handle to the OpenGL context that is current on this thread.
///
/// Every GPU operation in the crate takes a `&GlContext`. The handle is
/// neither `Send` nor `Sync`, so it cannot reach a thread where the context
/// is not current.
pub struct GlContext {
    _not_send: PhantomData<*const ()>,
}

impl GlContext {
    /// Loads the OpenGL function pointers.
    ///
    /// # Safety
    ///
    /// A context must be current on the calling thread and stay current for
    /// as long as the returned handle is used.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self {
            _not_send: PhantomData,
        }
    }

    pub fn viewport(&self, width: NonZeroU32, height: NonZeroU32) {
        unsafe {
            gl::Viewport(0, 0, width.get() as GLsizei, height.get() as GLsizei);
        }
    }

    pub fn clear(&self, colour: [f32; 4]) {
        let [r, g, b, a] = colour;
        unsafe {
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    pub fn set_wireframe(&self, wireframe: bool) {
        let mode = if wireframe { gl::LINE } else { gl::FILL };
        unsafe {
            gl::PolygonMode(gl::FRONT_AND_BACK, mode);
        }
    }

    pub fn draw_triangles(&self, first: i32, count: usize) {
        unsafe {
            gl::DrawArrays(gl::TRIANGLES, first, count as GLsizei);
        }
    }

    /// Human readable `GL_VERSION` string.
    pub fn version(&self) -> String {
        unsafe {
            let version = gl::GetString(gl::VERSION);
            if version.is_null() {
                return String::from("unknown");
            }
            std::ffi::CStr::from_ptr(version as *const _)
                .to_string_lossy()
                .into_owned()
        }
    }
}

/// Reads an info log of `len` bytes through `fetch`.
fn read_info_log(len: GLint, fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    if len <= 0 {
        return String::new();
    }

    let mut buffer = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    fetch(len, &mut written, buffer.as_mut_ptr() as *mut GLchar);
    buffer.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buffer).trim_end().to_owned()
}

impl ShaderBackend for GlContext {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        let kind = match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        };
        NonZeroU32::new(unsafe { gl::CreateShader(kind) }).map(ShaderId)
    }

    fn compile_shader(&self, shader: ShaderId, source: &str) -> bool {
        let id = shader.0.get();
        let source_ptr = source.as_ptr() as *const GLchar;
        let source_len = source.len() as GLint;
        let mut success = 0;

        unsafe {
            gl::ShaderSource(id, 1, &source_ptr, &source_len);
            gl::CompileShader(id);
            gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let id = shader.0.get();
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len);
        }
        read_info_log(len, |size, written, buffer| unsafe {
            gl::GetShaderInfoLog(id, size, written, buffer);
        })
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe {
            gl::DeleteShader(shader.0.get());
        }
    }

    fn create_program(&self) -> Option<ProgramId> {
        NonZeroU32::new(unsafe { gl::CreateProgram() }).map(ProgramId)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe {
            gl::AttachShader(program.0.get(), shader.0.get());
        }
    }

    fn link_program(&self, program: ProgramId) -> bool {
        let id = program.0.get();
        let mut success = 0;
        unsafe {
            gl::LinkProgram(id);
            gl::GetProgramiv(id, gl::LINK_STATUS, &mut success);
        }
        success != 0
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let id = program.0.get();
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut len);
        }
        read_info_log(len, |size, written, buffer| unsafe {
            gl::GetProgramInfoLog(id, size, written, buffer);
        })
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe {
            gl::DeleteProgram(program.0.get());
        }
    }

    fn use_program(&self, program: ProgramId) {
        unsafe {
            gl::UseProgram(program.0.get());
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program.0.get(), name.as_ptr()) };
        (location >= 0).then_some(UniformLocation(location))
    }

    fn upload_uniform(&self, location: UniformLocation, value: &Uniform) {
        let location = location.0;
        unsafe {
            match UploadCall::for_uniform(value) {
                UploadCall::Uniform1i(value) => gl::Uniform1i(location, value),
                UploadCall::Uniform1f(value) => gl::Uniform1f(location, value),
                UploadCall::Uniform2fv(v) => gl::Uniform2fv(location, 1, v.as_ptr()),
                UploadCall::Uniform3fv(v) => gl::Uniform3fv(location, 1, v.as_ptr()),
                UploadCall::Uniform4fv(v) => gl::Uniform4fv(location, 1, v.as_ptr()),
                UploadCall::UniformMatrix2fv(m) => {
                    gl::UniformMatrix2fv(location, 1, TRANSPOSE_MATRICES, m.as_ptr())
                }
                UploadCall::UniformMatrix3fv(m) => {
                    gl::UniformMatrix3fv(location, 1, TRANSPOSE_MATRICES, m.as_ptr())
                }
                UploadCall::UniformMatrix4fv(m) => {
                    gl::UniformMatrix4fv(location, 1, TRANSPOSE_MATRICES, m.as_ptr())
                }
            }
        }
    }
}

/// glam matrices are already column-major.
const TRANSPOSE_MATRICES: GLboolean = gl::FALSE;

/// The GL entry point a uniform value is sent through, with its payload.
///
/// Each variant is named after the `gl` function it calls and carries
/// exactly as many floats as that function reads.
#[derive(Debug, Clone, Copy, PartialEq)]
enum UploadCall {
    Uniform1i(GLint),
    Uniform1f(GLfloat),
    Uniform2fv([GLfloat; 2]),
    Uniform3fv([GLfloat; 3]),
    Uniform4fv([GLfloat; 4]),
    UniformMatrix2fv([GLfloat; 4]),
    UniformMatrix3fv([GLfloat; 9]),
    UniformMatrix4fv([GLfloat; 16]),
}

impl UploadCall {
    fn for_uniform(value: &Uniform) -> Self {
        match *value {
            Uniform::Bool(value) => Self::Uniform1i(value as GLint),
            Uniform::Int(value) => Self::Uniform1i(value),
            Uniform::Float(value) => Self::Uniform1f(value),
            Uniform::Vec2(vec) => Self::Uniform2fv(vec.to_array()),
            Uniform::Vec3(vec) => Self::Uniform3fv(vec.to_array()),
            Uniform::Vec4(vec) => Self::Uniform4fv(vec.to_array()),
            Uniform::Mat2(matrix) => Self::UniformMatrix2fv(matrix.to_cols_array()),
            Uniform::Mat3(matrix) => Self::UniformMatrix3fv(matrix.to_cols_array()),
            Uniform::Mat4(matrix) => Self::UniformMatrix4fv(matrix.to_cols_array()),
        }
    }

    fn component_count(&self) -> usize {
        match self {
            Self::Uniform1i(_) | Self::Uniform1f(_) => 1,
            Self::Uniform2fv(v) => v.len(),
            Self::Uniform3fv(v) => v.len(),
            Self::Uniform4fv(v) | Self::UniformMatrix2fv(v) => v.len(),
            Self::UniformMatrix3fv(m) => m.len(),
            Self::UniformMatrix4fv(m) => m.len(),
        }
    }
}
