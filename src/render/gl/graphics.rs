// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! GlGraphics, the opengl backend. Owns the gl context, the shader
//! programs, the texture and surface tables and the frame queue.
//! Drawing calls record; swap uploads the staged vertices, replays the
//! command log through the state machine and re-arms the next frame.
//!
//! Resource creation and deletion run immediately (they need the gpu
//! anyway); only drawing and state changes are deferred. Creation can
//! disturb gl bindings mid-frame, so the touched caches are invalidated
//! and the next replay rebinds them.

use crate::render::gl::canvas::CanvasLayout;
use crate::render::gl::color::Color;
use crate::render::gl::command::{Command, SurfaceTarget};
use crate::render::gl::queue::FrameQueue;
use crate::render::gl::shader::{GlShader, Program};
use crate::render::gl::state::{RenderState, UniformFlags};
use crate::render::gl::texture::{GlSurface, GlTexture};
use crate::render::gl::vertex::VertexFormat;
use crate::render::gl::view::View;
use crate::render::gl::GlProfile;
use crate::render::graphics::{DisplayInfo, Graphics, ScreenMode};
use crate::util::handle::{Handle, ResTable};
use glow::HasContext;
use log::{error, info, warn};

struct Canvas {
    surface: Handle,
    width: i32,
    height: i32,
    layout: CanvasLayout,
}

pub struct GlGraphics {
    gl: glow::Context,
    shaders: Vec<GlShader>,
    textures: ResTable<GlTexture>,
    surfaces: ResTable<GlSurface>,
    queue: FrameQueue,
    state: RenderState,
    screen_mode: ScreenMode,
    display_width: i32,
    display_height: i32,
    display_view: View,
    canvas: Option<Canvas>,
}

impl GlGraphics {
    pub fn new(
        gl: glow::Context,
        profile: GlProfile,
        display: &DisplayInfo,
    ) -> Result<Self, String> {
        if display.width <= 0 || display.height <= 0 {
            return Err(format!(
                "bad display size {}x{}",
                display.width, display.height
            ));
        }

        let ver = profile.shader_header();
        let shaders = vec![
            GlShader::build(&gl, ver, Program::Shape)?,
            GlShader::build(&gl, ver, Program::Texture)?,
        ];

        unsafe {
            gl.enable(glow::BLEND);
            gl.disable(glow::DEPTH_TEST);
            gl.blend_func_separate(
                glow::SRC_ALPHA,
                glow::ONE_MINUS_SRC_ALPHA,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            );
        }

        let mut s = Self {
            gl,
            shaders,
            textures: ResTable::new(),
            surfaces: ResTable::new(),
            queue: FrameQueue::new(),
            state: RenderState::new(),
            screen_mode: display.screen_mode,
            display_width: display.width,
            display_height: display.height,
            display_view: View::centered(display.width as f32, display.height as f32),
            canvas: None,
        };

        if display.screen_mode == ScreenMode::UseCanvasWithFixedResolution {
            let handle = s.create_surface_record(display.canvas_width, display.canvas_height)?;
            s.canvas = Some(Canvas {
                surface: handle,
                width: display.canvas_width,
                height: display.canvas_height,
                layout: CanvasLayout::fit(
                    display.canvas_width as f32,
                    display.canvas_height as f32,
                    display.width as f32,
                    display.height as f32,
                ),
            });
            info!(
                "canvas {}x{} in {}x{} window",
                display.canvas_width, display.canvas_height, display.width, display.height
            );
        }

        // arm the first frame's recording
        let home = s.home_target();
        s.queue.set_surface(home);
        Ok(s)
    }

    /// where drawing goes when no surface is set: the canvas in
    /// fixed-resolution mode, the window otherwise
    fn home_target(&self) -> SurfaceTarget {
        match &self.canvas {
            Some(c) => SurfaceTarget::Surface(c.surface),
            None => SurfaceTarget::Default,
        }
    }

    /// immediate surface construction shared by create_surface and the
    /// canvas; leaves gl bindings invalidated for the next replay
    fn create_surface_record(&mut self, w: i32, h: i32) -> Result<Handle, String> {
        let color_tex = GlTexture::new(&self.gl, w, h, 4, None)?;
        let gl_texture = color_tex.texture;
        let color = self.textures.add(color_tex);
        self.state.texture.invalidate();

        match GlSurface::new(&self.gl, color, gl_texture, w, h) {
            Ok(surface) => {
                self.state.surface.invalidate();
                Ok(self.surfaces.add(surface))
            }
            Err(e) => {
                if let Some(t) = self.textures.remove(color) {
                    t.free(&self.gl);
                }
                self.state.surface.invalidate();
                Err(e)
            }
        }
    }

    /// replay one command against the state machine
    fn exec(&mut self, command: Command) {
        match command {
            Command::Clear { color } => {
                if self.state.set_clear_color(color) {
                    let c = color.to_gl();
                    unsafe {
                        self.gl.clear_color(c.r, c.g, c.b, c.a);
                    }
                }
                unsafe {
                    self.gl.clear(glow::COLOR_BUFFER_BIT);
                }
            }
            Command::Draw {
                color,
                texture,
                program,
                format,
                mode,
                first,
                count,
            } => self.exec_draw(color, texture, program, format, mode, first, count),
            Command::SetSurface { target } => self.exec_set_surface(target),
            Command::ResetSurface => {
                let home = self.home_target();
                self.exec_set_surface(home);
            }
            Command::SetView { view } => {
                self.set_current_view(view);
            }
            Command::ResetView => {
                let view = match self.state.surface.get() {
                    Some(SurfaceTarget::Surface(h)) => self
                        .surfaces
                        .get(h)
                        .map(|s| View::centered(s.width as f32, s.height as f32)),
                    _ => Some(View::centered(
                        self.display_width as f32,
                        self.display_height as f32,
                    )),
                };
                if let Some(v) = view {
                    self.set_current_view(v);
                }
            }
            Command::PushMatrix => {
                if self.state.matrix.push() {
                    self.state.mark_model_view_dirty();
                }
            }
            Command::PopMatrix => {
                if self.state.matrix.pop() {
                    self.state.mark_model_view_dirty();
                }
            }
            Command::Translate { x, y } => {
                self.state.matrix.current_mut().translate(x, y);
                self.state.mark_model_view_dirty();
            }
            Command::Scale { x, y } => {
                self.state.matrix.current_mut().scale(x, y);
                self.state.mark_model_view_dirty();
            }
            Command::Rotate { degrees } => {
                self.state.matrix.current_mut().rotate(degrees);
                self.state.mark_model_view_dirty();
            }
            Command::Resize { width, height } => {
                self.display_width = width;
                self.display_height = height;
                if self.screen_mode != ScreenMode::Default {
                    self.display_view = View::centered(width as f32, height as f32);
                }
                self.exec_set_surface(SurfaceTarget::Current);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_draw(
        &mut self,
        color: Color,
        texture: Handle,
        program: Program,
        format: VertexFormat,
        mode: u32,
        first: i32,
        count: i32,
    ) {
        // a stale texture handle skips the draw entirely
        let gl_texture = if texture.is_none() {
            None
        } else {
            match self.textures.get(texture) {
                Some(t) => Some(t.texture),
                None => return,
            }
        };

        if self.state.set_program(program) {
            self.shaders[program as usize].bind(&self.gl);
        }
        if let Some(t) = gl_texture {
            if self.state.set_texture(texture) {
                unsafe {
                    self.gl.active_texture(glow::TEXTURE0);
                    self.gl.bind_texture(glow::TEXTURE_2D, Some(t));
                }
            }
        }
        if self.state.set_vertex_format(format) {
            self.bind_vertex_format(format);
        }
        self.state.set_draw_color(color);
        self.flush_uniforms(program);

        unsafe {
            self.gl.draw_arrays(mode, first, count);
        }
    }

    fn bind_vertex_format(&mut self, format: VertexFormat) {
        let vbo = self.queue.buffer_mut(format).vbo();
        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, vbo);
            gl.enable_vertex_attrib_array(0);
            match format {
                VertexFormat::Solid => {
                    gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 8, 0);
                    gl.disable_vertex_attrib_array(1);
                }
                VertexFormat::Textured => {
                    gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 16, 0);
                    gl.enable_vertex_attrib_array(1);
                    gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 16, 8);
                }
            }
        }
    }

    /// upload only the uniforms this program is stale on
    fn flush_uniforms(&mut self, program: Program) {
        let dirty = self.state.take_dirty(program);
        if dirty.is_empty() {
            return;
        }
        let shader = &self.shaders[program as usize];
        unsafe {
            if dirty.contains(UniformFlags::PROJECTION) {
                self.gl.uniform_matrix_4_f32_slice(
                    shader.u_projection.as_ref(),
                    false,
                    self.state.projection.as_slice(),
                );
            }
            if dirty.contains(UniformFlags::MODEL_VIEW) {
                self.gl.uniform_matrix_4_f32_slice(
                    shader.u_model_view.as_ref(),
                    false,
                    self.state.matrix.current().as_slice(),
                );
            }
            if dirty.contains(UniformFlags::COLOR) {
                let c = self.state.draw_color.to_gl();
                self.gl
                    .uniform_4_f32_slice(shader.u_color.as_ref(), &[c.r, c.g, c.b, c.a]);
            }
        }
    }

    fn exec_set_surface(&mut self, target: SurfaceTarget) {
        let forced = target == SurfaceTarget::Current;
        let resolved = if forced {
            self.state.surface.get().unwrap_or(SurfaceTarget::Default)
        } else {
            target
        };

        match resolved {
            SurfaceTarget::Surface(h) => {
                let Some(surface) = self.surfaces.get(h) else {
                    // stale handle, keep drawing where we are
                    return;
                };
                let switched = self.state.surface.set(resolved);
                if !switched && !forced {
                    return;
                }
                surface.bind(&self.gl);
                let projection = surface.view.projection();
                if switched {
                    self.state.enter_target(projection);
                } else {
                    // forced rebind of the same target (resize):
                    // the frame's transforms stay
                    self.state.refresh_target(projection);
                }
            }
            _ => {
                let switched = self.state.surface.set(SurfaceTarget::Default);
                if !switched && !forced {
                    return;
                }
                unsafe {
                    self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    self.gl.viewport(0, 0, self.display_width, self.display_height);
                }
                let projection = self.display_view.projection();
                if switched {
                    self.state.enter_target(projection);
                } else {
                    self.state.refresh_target(projection);
                }
            }
        }
    }

    /// store the view on whichever target is active and reproject
    fn set_current_view(&mut self, view: View) {
        match self.state.surface.get() {
            Some(SurfaceTarget::Surface(h)) => {
                if let Some(s) = self.surfaces.get_mut(h) {
                    s.view = view;
                } else {
                    return;
                }
            }
            _ => {
                self.display_view = view;
            }
        }
        self.state.set_projection(view.projection());
    }

    /// the end-of-frame pipeline, see the module docs
    fn present(&mut self) {
        if let Some(canvas) = &self.canvas {
            // composite the canvas into the real window
            let color = self.surfaces.get(canvas.surface).map(|s| s.color);
            if let Some(color) = color {
                let l = canvas.layout;
                self.queue.set_surface(SurfaceTarget::Default);
                self.queue.clear(Color::BLACK);
                // surfaces render y-down, sample with flipped v
                self.queue.texture_quad(
                    color,
                    Color::WHITE,
                    l.x0,
                    l.y0,
                    l.x1 - l.x0,
                    l.y1 - l.y0,
                    [0.0, 1.0, 1.0, 0.0],
                );
            }
        }

        if let Err(e) = self.queue.solid.upload(&self.gl) {
            error!("vertex upload failed: {}", e);
        }
        if let Err(e) = self.queue.textured.upload(&self.gl) {
            error!("vertex upload failed: {}", e);
        }
        // uploads rebound the array buffer
        self.state.format.invalidate();

        let commands = self.queue.commands.take();
        for command in &commands {
            self.exec(*command);
        }
        self.queue.commands.restore(commands);
        self.queue.reset();

        self.state.matrix.reset();
        self.state.mark_model_view_dirty();

        let home = self.home_target();
        self.queue.set_surface(home);
    }
}

impl Graphics for GlGraphics {
    fn is_initialized(&self) -> bool {
        true
    }

    fn swap(&mut self) {
        self.present();
    }

    fn notify_display_resize(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            warn!("ignoring resize to {}x{}", width, height);
            return;
        }
        // cursor conversion must not wait for the next swap, so the
        // canvas layout updates here; the gl-side display fields update
        // when the recorded command replays
        if let Some(canvas) = &mut self.canvas {
            canvas.layout = CanvasLayout::fit(
                canvas.width as f32,
                canvas.height as f32,
                width as f32,
                height as f32,
            );
        }
        self.queue.resize(width, height);
    }

    fn conv_cursor(&self, x: f32, y: f32) -> (f32, f32) {
        match &self.canvas {
            Some(c) => c.layout.conv_cursor(x, y),
            None => (x, y),
        }
    }

    fn conv_cursor_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        match &self.canvas {
            Some(c) => c.layout.conv_cursor_delta(dx, dy),
            None => (dx, dy),
        }
    }

    fn set_view(&mut self, x: f32, y: f32, w: f32, h: f32, rotation: f32) {
        self.queue.set_view(View::new(x, y, w, h, rotation));
    }

    fn reset_view(&mut self) {
        self.queue.reset_view();
    }

    fn push_matrix(&mut self) {
        self.queue.push_matrix();
    }

    fn pop_matrix(&mut self) {
        self.queue.pop_matrix();
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.queue.translate(x, y);
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.queue.scale(x, y);
    }

    fn rotate(&mut self, degrees: f32) {
        self.queue.rotate(degrees);
    }

    fn clear(&mut self, color: Color) {
        self.queue.clear(color);
    }

    fn draw_point(&mut self, x: f32, y: f32, color: Color) {
        self.queue.point(x, y, color);
    }

    fn draw_line(&mut self, ax: f32, ay: f32, bx: f32, by: f32, color: Color) {
        self.queue.line(ax, ay, bx, by, color);
    }

    fn draw_triangle(&mut self, vertices: &[f32; 6], outline: Color, fill: Color) {
        self.queue.triangle(vertices, outline, fill);
    }

    fn draw_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, outline: Color, fill: Color) {
        self.queue.rectangle(x, y, w, h, outline, fill);
    }

    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, outline: Color, fill: Color) {
        self.queue.circle(x, y, radius, outline, fill);
    }

    fn create_texture(&mut self, w: i32, h: i32, channels: i32) -> Handle {
        match GlTexture::new(&self.gl, w, h, channels, None) {
            Ok(t) => {
                self.state.texture.invalidate();
                self.textures.add(t)
            }
            Err(e) => {
                warn!("create_texture failed: {}", e);
                Handle::NONE
            }
        }
    }

    #[cfg(feature = "image")]
    fn load_texture(&mut self, bytes: &[u8]) -> Handle {
        let img = match image::load_from_memory(bytes) {
            Ok(i) => i.to_rgba8(),
            Err(e) => {
                warn!("load_texture failed to decode: {}", e);
                return Handle::NONE;
            }
        };
        let (w, h) = (img.width() as i32, img.height() as i32);
        match GlTexture::new(&self.gl, w, h, 4, Some(img.as_raw())) {
            Ok(t) => {
                self.state.texture.invalidate();
                self.textures.add(t)
            }
            Err(e) => {
                warn!("load_texture failed: {}", e);
                Handle::NONE
            }
        }
    }

    fn update_texture(&mut self, texture: Handle, x: i32, y: i32, w: i32, h: i32, pixels: &[u8]) {
        let Self { gl, textures, .. } = self;
        let Some(t) = textures.get(texture) else {
            return;
        };
        if let Err(e) = t.update(gl, x, y, w, h, pixels) {
            warn!("update_texture failed: {}", e);
        }
        self.state.texture.invalidate();
    }

    fn delete_texture(&mut self, texture: Handle) {
        if let Some(t) = self.textures.remove(texture) {
            t.free(&self.gl);
            self.state.texture.invalidate();
        }
    }

    fn set_texture_smooth(&mut self, texture: Handle, smooth: bool) {
        let Self { gl, textures, .. } = self;
        let Some(t) = textures.get_mut(texture) else {
            return;
        };
        t.set_smooth(gl, smooth);
        self.state.texture.invalidate();
    }

    fn texture_size(&self, texture: Handle) -> Option<(i32, i32)> {
        self.textures.get(texture).map(|t| (t.width, t.height))
    }

    fn draw_texture(&mut self, texture: Handle, x: f32, y: f32, w: f32, h: f32) {
        self.queue
            .texture_quad(texture, Color::WHITE, x, y, w, h, [0.0, 0.0, 1.0, 1.0]);
    }

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
    ) {
        let Some((tw, th)) = self.texture_size(texture) else {
            return;
        };
        let (tw, th) = (tw as f32, th as f32);
        let uv = [rx / tw, ry / th, (rx + rw) / tw, (ry + rh) / th];
        self.queue
            .texture_quad(texture, Color::WHITE, x, y, w, h, uv);
    }

    fn draw_text(&mut self, atlas: Handle, color: Color, quads: &[f32]) {
        self.queue.text(atlas, color, quads);
    }

    fn create_surface(&mut self, w: i32, h: i32) -> Handle {
        if w <= 0 || h <= 0 {
            warn!("create_surface failed: bad size {}x{}", w, h);
            return Handle::NONE;
        }
        match self.create_surface_record(w, h) {
            Ok(h) => h,
            Err(e) => {
                warn!("create_surface failed: {}", e);
                Handle::NONE
            }
        }
    }

    fn delete_surface(&mut self, surface: Handle) {
        let Some((s, color)) =
            detach_surface(&mut self.surfaces, &mut self.textures, surface, |s| s.color)
        else {
            return;
        };
        if let Some(t) = color {
            t.free(&self.gl);
        }
        s.free(&self.gl);
        self.state.texture.invalidate();
        self.state.surface.invalidate();
    }

    fn set_surface(&mut self, surface: Handle) {
        self.queue.set_surface(SurfaceTarget::Surface(surface));
    }

    fn reset_surface(&mut self) {
        self.queue.reset_surface();
    }

    fn draw_surface(&mut self, surface: Handle, x: f32, y: f32, w: f32, h: f32) {
        let Some(s) = self.surfaces.get(surface) else {
            return;
        };
        // flipped v, surfaces render y-down into their texture
        self.queue
            .texture_quad(s.color, Color::WHITE, x, y, w, h, [0.0, 1.0, 1.0, 0.0]);
    }
}

/// table-side half of surface deletion: the surface record leaves its
/// table first, then the color texture it owns, so a texture handle the
/// app may still hold stops resolving the moment the surface dies
fn detach_surface<S, T>(
    surfaces: &mut ResTable<S>,
    textures: &mut ResTable<T>,
    surface: Handle,
    color: impl Fn(&S) -> Handle,
) -> Option<(S, Option<T>)> {
    let record = surfaces.remove(surface)?;
    let texture = textures.remove(color(&record));
    Some((record, texture))
}

impl Drop for GlGraphics {
    fn drop(&mut self) {
        for s in self.surfaces.drain() {
            if let Some(t) = self.textures.remove(s.color) {
                t.free(&self.gl);
            }
            s.free(&self.gl);
        }
        for t in self.textures.drain() {
            t.free(&self.gl);
        }
        for shader in &self.shaders {
            shader.free(&self.gl);
        }
        self.queue.solid.free(&self.gl);
        self.queue.textured.free(&self.gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offscreen {
        color: Handle,
    }

    #[test]
    fn deleting_a_surface_detaches_its_color_texture() {
        let mut surfaces: ResTable<Offscreen> = ResTable::new();
        let mut textures: ResTable<u32> = ResTable::new();
        let color = textures.add(7);
        let surface = surfaces.add(Offscreen { color });

        let (record, texture) =
            detach_surface(&mut surfaces, &mut textures, surface, |s| s.color).unwrap();
        assert_eq!(record.color, color);
        assert_eq!(texture, Some(7));
        assert!(surfaces.get(surface).is_none());
        // the owned texture is unreachable through its old handle too
        assert!(textures.get(color).is_none());
    }

    #[test]
    fn stale_surface_handles_detach_nothing() {
        let mut surfaces: ResTable<Offscreen> = ResTable::new();
        let mut textures: ResTable<u32> = ResTable::new();
        let color = textures.add(1);
        let surface = surfaces.add(Offscreen { color });
        detach_surface(&mut surfaces, &mut textures, surface, |s| s.color);
        assert!(detach_surface(&mut surfaces, &mut textures, surface, |s| s.color).is_none());
        assert!(detach_surface(&mut surfaces, &mut textures, Handle::NONE, |s| s.color).is_none());
    }
}
