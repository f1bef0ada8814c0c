// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! opengl backend codes...
//! A frame is recorded into queue (vertex staging + command log) and
//! replayed once at swap time through state, which filters redundant
//! gl state changes before they reach the driver.

pub mod canvas;
pub mod color;
pub mod command;
pub mod graphics;
pub mod queue;
pub mod shader;
pub mod state;
pub mod texture;
pub mod transform;
pub mod vertex;
pub mod view;

/// shading language flavor of the backend, prefixed to every
/// shader source like a #version line
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GlProfile {
    /// desktop opengl 2.1, glsl 120
    LegacyGl,
    /// opengl es 2.0, glsl es 100
    Gles2,
}

impl GlProfile {
    pub fn shader_header(&self) -> &'static str {
        match self {
            GlProfile::LegacyGl => "#version 120\n",
            GlProfile::Gles2 => "#version 100\nprecision mediump float;\n",
        }
    }
}
