//! Vertex + fragment shader programs.
//!
//! A program is built in one pass: both sources are read, both stages are
//! compiled, the program is linked, and the intermediate shader objects are
//! deleted. Any step may fail without stopping the ones after it; every
//! failure is logged when it happens and collected in a [`ProgramBuild`] so
//! the caller decides whether it is fatal.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use thiserror::Error;

use super::backend::{ProgramId, ShaderBackend, ShaderId, UniformLocation};
use super::uniform::Uniform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("VERTEX"),
            Self::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("ERROR::SHADER::FILE_NOT_SUCCESSFULLY_READ\n{stage} source {path:?}: {source}")]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ERROR::SHADER::{stage}::COMPILATION_FAILED\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("ERROR::SHADER::PROGRAM::LINK_FAILED\n{log}")]
    Link { log: String },
    #[error("ERROR::SHADER::{object}::ALLOCATION_FAILED")]
    Allocation { object: &'static str },
}

/// Outcome of the tolerant build pipeline.
#[derive(Debug)]
pub struct ProgramBuild {
    program: ShaderProgram,
    failures: Vec<ShaderError>,
}

impl ProgramBuild {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty() && self.program.is_linked()
    }

    /// Failures in the order they happened.
    pub fn failures(&self) -> &[ShaderError] {
        &self.failures
    }

    /// Keeps the program whatever happened. A failed program renders with
    /// backend-defined results.
    pub fn into_program(self) -> ShaderProgram {
        self.program
    }

    /// Returns the program if it linked cleanly. Otherwise the program is
    /// deleted and the first failure is returned, since later failures are
    /// usually consequences of it.
    pub fn into_result<B: ShaderBackend>(self, gl: &B) -> Result<ShaderProgram, ShaderError> {
        let ok = self.is_ok();
        let Self {
            mut program,
            failures,
        } = self;

        if ok {
            return Ok(program);
        }

        program.delete(gl);
        Err(failures.into_iter().next().unwrap_or(ShaderError::Link {
            log: String::from("program did not link"),
        }))
    }
}

/// A linked vertex + fragment program.
///
/// The program does not hold on to its context; every call takes the
/// context handle explicitly. Call [`ShaderProgram::delete`] before the
/// context goes away.
#[derive(Debug)]
pub struct ShaderProgram {
    id: Option<ProgramId>,
    linked: bool,
}

impl ShaderProgram {
    /// Builds a program from two source files and fails on the first problem.
    pub fn new<B: ShaderBackend>(
        gl: &B,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        Self::build(gl, vertex_path, fragment_path).into_result(gl)
    }

    pub fn new_from_source<B: ShaderBackend>(
        gl: &B,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        Self::build_from_source(gl, vertex_source, fragment_source).into_result(gl)
    }

    /// Runs the whole pipeline over two source files. An unreadable file is
    /// compiled as empty source.
    pub fn build<B: ShaderBackend>(
        gl: &B,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> ProgramBuild {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let mut failures = Vec::new();

        let vertex_source = read_source(ShaderStage::Vertex, vertex_path, &mut failures);
        let fragment_source = read_source(ShaderStage::Fragment, fragment_path, &mut failures);

        let build = Self::link_sources(gl, &vertex_source, &fragment_source, failures);
        if build.is_ok() {
            info!(
                "Linked shader program {} from {:?} and {:?}",
                build.program.describe(),
                vertex_path,
                fragment_path
            );
        }
        build
    }

    pub fn build_from_source<B: ShaderBackend>(
        gl: &B,
        vertex_source: &str,
        fragment_source: &str,
    ) -> ProgramBuild {
        Self::link_sources(gl, vertex_source, fragment_source, Vec::new())
    }

    fn link_sources<B: ShaderBackend>(
        gl: &B,
        vertex_source: &str,
        fragment_source: &str,
        mut failures: Vec<ShaderError>,
    ) -> ProgramBuild {
        let vertex = compile_stage(gl, ShaderStage::Vertex, vertex_source, &mut failures);
        let fragment = compile_stage(gl, ShaderStage::Fragment, fragment_source, &mut failures);
        let shaders = [vertex, fragment];

        let id = gl.create_program();
        let mut linked = false;
        match id {
            Some(program) => {
                for shader in shaders.iter().flatten() {
                    gl.attach_shader(program, *shader);
                }
                linked = gl.link_program(program);
                if !linked {
                    let log = gl.program_info_log(program);
                    record(&mut failures, ShaderError::Link { log });
                }
            }
            None => record(&mut failures, ShaderError::Allocation { object: "PROGRAM" }),
        }

        for shader in shaders.into_iter().flatten() {
            gl.delete_shader(shader);
        }

        ProgramBuild {
            program: ShaderProgram { id, linked },
            failures,
        }
    }

    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Makes this the active program for subsequent draw calls.
    pub fn set_used<B: ShaderBackend>(&self, gl: &B) {
        match self.id {
            Some(id) => gl.use_program(id),
            None => debug!("set_used on a shader program without a backend object"),
        }
    }

    /// Looks the name up on every call; nothing is cached.
    pub fn uniform_location<B: ShaderBackend>(
        &self,
        gl: &B,
        name: &str,
    ) -> Option<UniformLocation> {
        if !self.linked {
            return None;
        }
        gl.uniform_location(self.id?, name)
    }

    /// Sets a uniform on this program, which must be the active one.
    ///
    /// Names the program does not actively use are ignored.
    pub fn set_uniform<B: ShaderBackend>(&self, gl: &B, name: &str, value: impl Into<Uniform>) {
        let value = value.into();
        match self.uniform_location(gl, name) {
            Some(location) => gl.upload_uniform(location, &value),
            None => debug!(
                "Uniform '{}' ({}) not active in program {}, skipped",
                name,
                value.kind(),
                self.describe()
            ),
        }
    }

    pub fn set_uniform_1i<B: ShaderBackend>(&self, gl: &B, name: &str, value: i32) {
        self.set_uniform(gl, name, value);
    }

    pub fn set_uniform_1f<B: ShaderBackend>(&self, gl: &B, name: &str, value: f32) {
        self.set_uniform(gl, name, value);
    }

    pub fn set_uniform_2f<B: ShaderBackend>(&self, gl: &B, name: &str, x: f32, y: f32) {
        self.set_uniform(gl, name, (x, y));
    }

    pub fn set_uniform_3f<B: ShaderBackend>(&self, gl: &B, name: &str, x: f32, y: f32, z: f32) {
        self.set_uniform(gl, name, (x, y, z));
    }

    pub fn set_uniform_4f<B: ShaderBackend>(
        &self,
        gl: &B,
        name: &str,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    ) {
        self.set_uniform(gl, name, (x, y, z, w));
    }

    /// Frees the program object. Calling it again does nothing.
    pub fn delete<B: ShaderBackend>(&mut self, gl: &B) {
        if let Some(id) = self.id.take() {
            gl.delete_program(id);
        }
        self.linked = false;
    }

    fn describe(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| String::from("<none>"))
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            warn!("Shader program {} dropped without delete(), GPU object leaked", id);
        }
    }
}

fn record(failures: &mut Vec<ShaderError>, failure: ShaderError) {
    error!("{}", failure);
    failures.push(failure);
}

fn read_source(stage: ShaderStage, path: &Path, failures: &mut Vec<ShaderError>) -> String {
    fs::read_to_string(path).unwrap_or_else(|source| {
        record(
            failures,
            ShaderError::Read {
                stage,
                path: path.to_path_buf(),
                source,
            },
        );
        String::new()
    })
}

fn compile_stage<B: ShaderBackend>(
    gl: &B,
    stage: ShaderStage,
    source: &str,
    failures: &mut Vec<ShaderError>,
) -> Option<ShaderId> {
    let Some(shader) = gl.create_shader(stage) else {
        record(failures, ShaderError::Allocation { object: stage_object(stage) });
        return None;
    };

    if !gl.compile_shader(shader, source) {
        let log = gl.shader_info_log(shader);
        record(failures, ShaderError::Compile { stage, log });
    }
    Some(shader)
}

fn stage_object(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "VERTEX",
        ShaderStage::Fragment => "FRAGMENT",
    }
}
