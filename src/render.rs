// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Render module, it exposes the backend trait and the opengl backend.
//! graphics: the Graphics trait, screen modes, the null backend and the
//! factory that falls back to it.
//! gl: the deferred opengl renderer.

pub mod gl;
pub mod graphics;
