// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! The backend trait and its selection. The window layer hands over a
//! display size and a screen mode at startup; everything after that
//! goes through the Graphics trait. When the gl backend can not start
//! (missing functions, shader failure) the factory logs the reason and
//! substitutes the null backend, so the caller keeps running blind
//! instead of crashing.

use crate::render::gl::color::Color;
use crate::render::gl::graphics::GlGraphics;
use crate::render::gl::GlProfile;
use crate::util::handle::Handle;
use log::error;

/// how the backend reacts to the window being resized
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScreenMode {
    /// keep the initial view, the image stretches with the window
    Default,
    /// reset the view to match the new display size
    UpdateViewOnResize,
    /// draw into a fixed-resolution canvas, letterboxed into the window
    UseCanvasWithFixedResolution,
}

/// initialization input from the windowing collaborator
#[derive(Clone, Copy, Debug)]
pub struct DisplayInfo {
    pub width: i32,
    pub height: i32,
    pub screen_mode: ScreenMode,
    /// logical resolution, only read in canvas mode
    pub canvas_width: i32,
    pub canvas_height: i32,
}

pub trait Graphics {
    /// false for the null backend, true when a gpu is really driven
    fn is_initialized(&self) -> bool;

    /// end of frame: upload staged vertices, replay the command log,
    /// reset the transform stack and re-arm the next frame
    fn swap(&mut self);

    fn notify_display_resize(&mut self, width: i32, height: i32);

    /// window-space pointer position to drawing-space coordinates
    fn conv_cursor(&self, x: f32, y: f32) -> (f32, f32);
    fn conv_cursor_delta(&self, dx: f32, dy: f32) -> (f32, f32);

    /// view of whichever render target is currently active
    fn set_view(&mut self, x: f32, y: f32, w: f32, h: f32, rotation: f32);
    fn reset_view(&mut self);

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, x: f32, y: f32);
    fn rotate(&mut self, degrees: f32);

    fn clear(&mut self, color: Color);
    fn draw_point(&mut self, x: f32, y: f32, color: Color);
    fn draw_line(&mut self, ax: f32, ay: f32, bx: f32, by: f32, color: Color);
    fn draw_triangle(&mut self, vertices: &[f32; 6], outline: Color, fill: Color);
    fn draw_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, outline: Color, fill: Color);
    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, outline: Color, fill: Color);

    /// blank texture, channels 1..=4
    fn create_texture(&mut self, w: i32, h: i32, channels: i32) -> Handle;
    /// decoded through the image collaborator
    #[cfg(feature = "image")]
    fn load_texture(&mut self, bytes: &[u8]) -> Handle;
    fn update_texture(&mut self, texture: Handle, x: i32, y: i32, w: i32, h: i32, pixels: &[u8]);
    fn delete_texture(&mut self, texture: Handle);
    fn set_texture_smooth(&mut self, texture: Handle, smooth: bool);
    fn texture_size(&self, texture: Handle) -> Option<(i32, i32)>;
    fn draw_texture(&mut self, texture: Handle, x: f32, y: f32, w: f32, h: f32);
    #[allow(clippy::too_many_arguments)]
    fn draw_subtexture(
        &mut self,
        texture: Handle,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        rx: f32,
        ry: f32,
        rw: f32,
        rh: f32,
    );

    /// pre-shaped glyph quads (x, y, u, v per vertex, four per glyph)
    /// against an atlas texture; shaping is the text collaborator's job
    fn draw_text(&mut self, atlas: Handle, color: Color, quads: &[f32]);

    fn create_surface(&mut self, w: i32, h: i32) -> Handle;
    fn delete_surface(&mut self, surface: Handle);
    fn set_surface(&mut self, surface: Handle);
    fn reset_surface(&mut self);
    fn draw_surface(&mut self, surface: Handle, x: f32, y: f32, w: f32, h: f32);
}

/// backend that swallows everything, substituted when gl can not start
pub struct NullGraphics;

impl NullGraphics {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullGraphics {
    fn default() -> Self {
        Self::new()
    }
}

impl Graphics for NullGraphics {
    fn is_initialized(&self) -> bool {
        false
    }
    fn swap(&mut self) {}
    fn notify_display_resize(&mut self, _width: i32, _height: i32) {}
    fn conv_cursor(&self, x: f32, y: f32) -> (f32, f32) {
        (x, y)
    }
    fn conv_cursor_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx, dy)
    }
    fn set_view(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _rotation: f32) {}
    fn reset_view(&mut self) {}
    fn push_matrix(&mut self) {}
    fn pop_matrix(&mut self) {}
    fn translate(&mut self, _x: f32, _y: f32) {}
    fn scale(&mut self, _x: f32, _y: f32) {}
    fn rotate(&mut self, _degrees: f32) {}
    fn clear(&mut self, _color: Color) {}
    fn draw_point(&mut self, _x: f32, _y: f32, _color: Color) {}
    fn draw_line(&mut self, _ax: f32, _ay: f32, _bx: f32, _by: f32, _color: Color) {}
    fn draw_triangle(&mut self, _vertices: &[f32; 6], _outline: Color, _fill: Color) {}
    fn draw_rectangle(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _outline: Color, _fill: Color) {
    }
    fn draw_circle(&mut self, _x: f32, _y: f32, _radius: f32, _outline: Color, _fill: Color) {}
    fn create_texture(&mut self, _w: i32, _h: i32, _channels: i32) -> Handle {
        Handle::NONE
    }
    #[cfg(feature = "image")]
    fn load_texture(&mut self, _bytes: &[u8]) -> Handle {
        Handle::NONE
    }
    fn update_texture(
        &mut self,
        _texture: Handle,
        _x: i32,
        _y: i32,
        _w: i32,
        _h: i32,
        _pixels: &[u8],
    ) {
    }
    fn delete_texture(&mut self, _texture: Handle) {}
    fn set_texture_smooth(&mut self, _texture: Handle, _smooth: bool) {}
    fn texture_size(&self, _texture: Handle) -> Option<(i32, i32)> {
        None
    }
    fn draw_texture(&mut self, _texture: Handle, _x: f32, _y: f32, _w: f32, _h: f32) {}
    fn draw_subtexture(
        &mut self,
        _texture: Handle,
        _x: f32,
        _y: f32,
        _w: f32,
        _h: f32,
        _rx: f32,
        _ry: f32,
        _rw: f32,
        _rh: f32,
    ) {
    }
    fn draw_text(&mut self, _atlas: Handle, _color: Color, _quads: &[f32]) {}
    fn create_surface(&mut self, _w: i32, _h: i32) -> Handle {
        Handle::NONE
    }
    fn delete_surface(&mut self, _surface: Handle) {}
    fn set_surface(&mut self, _surface: Handle) {}
    fn reset_surface(&mut self) {}
    fn draw_surface(&mut self, _surface: Handle, _x: f32, _y: f32, _w: f32, _h: f32) {}
}

/// build the gl backend, falling back to the null backend when the
/// driver refuses to play along
pub fn create_graphics(
    gl: glow::Context,
    profile: GlProfile,
    display: &DisplayInfo,
) -> Box<dyn Graphics> {
    match GlGraphics::new(gl, profile, display) {
        Ok(g) => Box::new(g),
        Err(e) => {
            error!("gl backend unavailable, using null graphics: {}", e);
            Box::new(NullGraphics::new())
        }
    }
}
