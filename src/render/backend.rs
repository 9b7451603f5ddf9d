//! The graphics primitives a [`ShaderProgram`](super::shader::ShaderProgram)
//! needs from its context.

use std::num::NonZeroU32;

use super::shader::ShaderStage;
use super::uniform::Uniform;

/// Name of a compiled shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub NonZeroU32);

/// Name of a program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub NonZeroU32);

/// Location of an active uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shader-object and program-object operations of a graphics context.
///
/// Creation calls return `None` when the backend refuses to allocate a name.
/// Every method must be called on the thread that owns the context.
pub trait ShaderBackend {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId>;

    /// Submits `source` and compiles it, returning the compile status.
    fn compile_shader(&self, shader: ShaderId, source: &str) -> bool;

    fn shader_info_log(&self, shader: ShaderId) -> String;

    fn delete_shader(&self, shader: ShaderId);

    fn create_program(&self) -> Option<ProgramId>;

    fn attach_shader(&self, program: ProgramId, shader: ShaderId);

    /// Links the program, returning the link status.
    fn link_program(&self, program: ProgramId) -> bool;

    fn program_info_log(&self, program: ProgramId) -> String;

    fn delete_program(&self, program: ProgramId);

    fn use_program(&self, program: ProgramId);

    /// `None` for names the linked program does not actively use.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn upload_uniform(&self, location: UniformLocation, value: &Uniform);
}

#[cfg(test)]
pub(crate) mod recording {
    //! In-memory backend that records every call and fakes a tiny GLSL
    //! front end: a stage compiles when it has a `#version` line and a
    //! `main`, a program links when every fragment `in` has a matching
    //! vertex `out`.

    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::num::NonZeroU32;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        CreateShader(ShaderStage),
        CompileShader(ShaderId),
        DeleteShader(ShaderId),
        CreateProgram,
        AttachShader(ProgramId, ShaderId),
        LinkProgram(ProgramId),
        DeleteProgram(ProgramId),
        UseProgram(ProgramId),
        Upload(UniformLocation, Uniform),
    }

    struct FakeShader {
        stage: ShaderStage,
        source: String,
        compiled: bool,
    }

    #[derive(Default)]
    struct FakeProgram {
        attached: Vec<ShaderId>,
        linked: bool,
        log: String,
        uniforms: Vec<String>,
    }

    #[derive(Default)]
    pub struct RecordingBackend {
        next_name: Cell<u32>,
        shaders: RefCell<HashMap<ShaderId, FakeShader>>,
        programs: RefCell<HashMap<ProgramId, FakeProgram>>,
        calls: RefCell<Vec<Call>>,
        pub refuse_programs: Cell<bool>,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn uploads(&self) -> Vec<(UniformLocation, Uniform)> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    Call::Upload(location, value) => Some((*location, *value)),
                    _ => None,
                })
                .collect()
        }

        pub fn live_shaders(&self) -> usize {
            self.shaders.borrow().len()
        }

        pub fn live_programs(&self) -> usize {
            self.programs.borrow().len()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }

        fn next_name(&self) -> NonZeroU32 {
            let name = self.next_name.get() + 1;
            self.next_name.set(name);
            NonZeroU32::new(name).expect("names start at 1")
        }
    }

    /// Names declared by `<qualifier> <type> <name>;` lines.
    fn declared(source: &str, qualifier: &str) -> Vec<String> {
        source
            .lines()
            .filter_map(|line| {
                let mut words = line.trim().trim_end_matches(';').split_whitespace();
                if words.next() != Some(qualifier) {
                    return None;
                }
                words.nth(1).map(str::to_owned)
            })
            .collect()
    }

    impl ShaderBackend for RecordingBackend {
        fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
            self.record(Call::CreateShader(stage));
            let id = ShaderId(self.next_name());
            self.shaders.borrow_mut().insert(
                id,
                FakeShader {
                    stage,
                    source: String::new(),
                    compiled: false,
                },
            );
            Some(id)
        }

        fn compile_shader(&self, shader: ShaderId, source: &str) -> bool {
            self.record(Call::CompileShader(shader));
            let mut shaders = self.shaders.borrow_mut();
            let Some(fake) = shaders.get_mut(&shader) else {
                return false;
            };
            fake.source = source.to_owned();
            fake.compiled =
                source.trim_start().starts_with("#version") && source.contains("void main");
            fake.compiled
        }

        fn shader_info_log(&self, shader: ShaderId) -> String {
            match self.shaders.borrow().get(&shader) {
                Some(fake) if !fake.compiled => "0:1(1): error: syntax error".to_owned(),
                _ => String::new(),
            }
        }

        fn delete_shader(&self, shader: ShaderId) {
            self.record(Call::DeleteShader(shader));
            self.shaders.borrow_mut().remove(&shader);
        }

        fn create_program(&self) -> Option<ProgramId> {
            self.record(Call::CreateProgram);
            if self.refuse_programs.get() {
                return None;
            }
            let id = ProgramId(self.next_name());
            self.programs.borrow_mut().insert(id, FakeProgram::default());
            Some(id)
        }

        fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
            self.record(Call::AttachShader(program, shader));
            if let Some(fake) = self.programs.borrow_mut().get_mut(&program) {
                fake.attached.push(shader);
            }
        }

        fn link_program(&self, program: ProgramId) -> bool {
            self.record(Call::LinkProgram(program));
            let shaders = self.shaders.borrow();
            let mut programs = self.programs.borrow_mut();
            let Some(fake) = programs.get_mut(&program) else {
                return false;
            };

            let attached: Vec<&FakeShader> = fake
                .attached
                .iter()
                .filter_map(|id| shaders.get(id))
                .collect();
            let stage_source = |stage: ShaderStage| {
                attached
                    .iter()
                    .find(|shader| shader.stage == stage && shader.compiled)
                    .map(|shader| shader.source.as_str())
            };

            match (
                stage_source(ShaderStage::Vertex),
                stage_source(ShaderStage::Fragment),
            ) {
                (Some(vertex), Some(fragment)) => {
                    let outputs = declared(vertex, "out");
                    let missing: Vec<String> = declared(fragment, "in")
                        .into_iter()
                        .filter(|input| !outputs.contains(input))
                        .collect();
                    if missing.is_empty() {
                        fake.linked = true;
                        fake.uniforms = declared(vertex, "uniform");
                        fake.uniforms.extend(declared(fragment, "uniform"));
                    } else {
                        fake.log = format!(
                            "error: fragment shader input(s) {} not written by vertex shader",
                            missing.join(", ")
                        );
                    }
                }
                _ => fake.log = "error: linking with uncompiled/missing shader".to_owned(),
            }
            fake.linked
        }

        fn program_info_log(&self, program: ProgramId) -> String {
            self.programs
                .borrow()
                .get(&program)
                .map(|fake| fake.log.clone())
                .unwrap_or_default()
        }

        fn delete_program(&self, program: ProgramId) {
            self.record(Call::DeleteProgram(program));
            self.programs.borrow_mut().remove(&program);
        }

        fn use_program(&self, program: ProgramId) {
            self.record(Call::UseProgram(program));
        }

        fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
            let programs = self.programs.borrow();
            let fake = programs.get(&program).filter(|fake| fake.linked)?;
            fake.uniforms
                .iter()
                .position(|uniform| uniform == name)
                .map(|index| UniformLocation(index as i32))
        }

        fn upload_uniform(&self, location: UniformLocation, value: &Uniform) {
            self.record(Call::Upload(location, *value));
        }
    }
}
