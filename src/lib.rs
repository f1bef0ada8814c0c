// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! RustCanvas is a rust 2d graphics library for mini-games.
//! It offers an immediate-style drawing api (clear, point, line, triangle,
//! rectangle, circle, texture, text) on top of a deferred command renderer:
//! every drawing call only records vertex data and a command, and the whole
//! frame is replayed against the GPU once at swap time.
//!
//! Two backends are provided: an opengl backend (gles2 or legacy gl2,
//! driven through glow) and a null backend that swallows every call.
//! The null backend is substituted automatically when the gl backend
//! can not start, so callers never have to crash on a bad driver.
//!
//! Windowing, input polling, audio and text shaping are collaborators.
//! The library only consumes a display size and screen mode from the
//! window layer and hands pointer coordinate conversion back to it.
//!
//! An optional fixed-resolution canvas can be composited into the real
//! window with letterboxing, to keep pixel games resolution independent.

/// max depth of the model matrix stack
pub const MAX_MATRIX_DEPTH: usize = 32;

/// circles are drawn as fixed-resolution regular polygons
pub const CIRCLE_VERTEX_COUNT: usize = 32;

/// log
pub mod log;

/// common tools and data structures:
/// path helpers and the generational handle table
pub mod util;

/// Render module, the core of the library.
/// graphics: the backend trait, screen mode and the null backend.
/// gl: the opengl backend, split into
/// command recording, vertex staging, render state filtering,
/// shaders, textures, surfaces and the canvas compositor.
pub mod render;
