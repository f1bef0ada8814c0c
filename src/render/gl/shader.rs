// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Shader programs. The glsl below compiles both as glsl es 100 and as
//! desktop glsl 120; the per-profile header line is prefixed at compile
//! time. Compile or link failure is logged with the full driver info log
//! and reported as an error so the factory can fall back to the null
//! backend instead of crashing the process.

use glow::HasContext;
use log::error;

/// built-in program selector carried in draw commands
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Program {
    /// solid color geometry
    Shape = 0,
    /// textured geometry, also used for glyph atlases
    Texture = 1,
}

pub const PROGRAM_COUNT: usize = 2;

const SHAPE_VERTEX_SRC: &str = r#"
attribute vec2 a_position;
uniform mat4 u_projection;
uniform mat4 u_modelView;
void main() {
    gl_Position = u_projection * u_modelView * vec4(a_position, 0.0, 1.0);
    gl_PointSize = 1.0;
}
"#;

const SHAPE_FRAGMENT_SRC: &str = r#"
uniform vec4 u_color;
void main() {
    gl_FragColor = u_color;
}
"#;

const TEXTURE_VERTEX_SRC: &str = r#"
attribute vec2 a_position;
attribute vec2 a_texCoord;
uniform mat4 u_projection;
uniform mat4 u_modelView;
varying vec2 v_texCoord;
void main() {
    v_texCoord = a_texCoord;
    gl_Position = u_projection * u_modelView * vec4(a_position, 0.0, 1.0);
}
"#;

const TEXTURE_FRAGMENT_SRC: &str = r#"
uniform sampler2D u_texture;
uniform vec4 u_color;
varying vec2 v_texCoord;
void main() {
    gl_FragColor = texture2D(u_texture, v_texCoord) * u_color;
}
"#;

pub struct GlShader {
    pub program: glow::Program,
    pub u_projection: Option<glow::UniformLocation>,
    pub u_model_view: Option<glow::UniformLocation>,
    pub u_color: Option<glow::UniformLocation>,
}

impl GlShader {
    pub fn new(
        gl: &glow::Context,
        ver: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, String> {
        unsafe {
            let vertex_shader = compile(gl, glow::VERTEX_SHADER, ver, vertex_source)?;
            let fragment_shader = compile(gl, glow::FRAGMENT_SHADER, ver, fragment_source)?;

            let program = gl.create_program()?;
            gl.attach_shader(program, vertex_shader);
            gl.attach_shader(program, fragment_shader);
            // attribute slots are shared across programs so the state
            // machine can keep vertex pointers when switching shaders
            gl.bind_attrib_location(program, 0, "a_position");
            gl.bind_attrib_location(program, 1, "a_texCoord");
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            gl.detach_shader(program, vertex_shader);
            gl.detach_shader(program, fragment_shader);
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);
            if !linked {
                let info = gl.get_program_info_log(program);
                gl.delete_program(program);
                error!("Program Linking Error: {}", info);
                return Err(format!("program link failed: {}", info));
            }

            let u_projection = gl.get_uniform_location(program, "u_projection");
            let u_model_view = gl.get_uniform_location(program, "u_modelView");
            let u_color = gl.get_uniform_location(program, "u_color");

            Ok(Self {
                program,
                u_projection,
                u_model_view,
                u_color,
            })
        }
    }

    /// compile one of the built-in programs
    pub fn build(gl: &glow::Context, ver: &str, which: Program) -> Result<Self, String> {
        match which {
            Program::Shape => Self::new(gl, ver, SHAPE_VERTEX_SRC, SHAPE_FRAGMENT_SRC),
            Program::Texture => {
                let shader = Self::new(gl, ver, TEXTURE_VERTEX_SRC, TEXTURE_FRAGMENT_SRC)?;
                // the sampler always reads unit 0, set it once
                unsafe {
                    gl.use_program(Some(shader.program));
                    let loc = gl.get_uniform_location(shader.program, "u_texture");
                    gl.uniform_1_i32(loc.as_ref(), 0);
                    gl.use_program(None);
                }
                Ok(shader)
            }
        }
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(Some(self.program));
        }
    }

    pub fn free(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
        }
    }
}

unsafe fn compile(
    gl: &glow::Context,
    kind: u32,
    ver: &str,
    source: &str,
) -> Result<glow::Shader, String> {
    let shader = gl.create_shader(kind)?;
    gl.shader_source(shader, &format!("{}\n{}", ver, source));
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let info = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        let stage = if kind == glow::VERTEX_SHADER {
            "Vertex"
        } else {
            "Fragment"
        };
        error!("{} Shader Compilation Error: {}", stage, info);
        return Err(format!("shader compile failed: {}", info));
    }
    Ok(shader)
}
