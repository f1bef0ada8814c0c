// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! The render state machine. Replay drives every gl mutation through
//! here, and each update is a no-op when the value is already current,
//! so a redundant state change never reaches the driver twice in a row.
//! The decision side is plain data: methods answer "does the gpu need
//! to hear about this" and graphics.rs does the actual gl calls.

use crate::render::gl::color::Color;
use crate::render::gl::command::SurfaceTarget;
use crate::render::gl::shader::{Program, PROGRAM_COUNT};
use crate::render::gl::transform::{Mat4, MatrixStack};
use crate::render::gl::vertex::VertexFormat;
use crate::util::handle::Handle;
use bitflags::bitflags;

bitflags! {
    /// uniforms a program may be holding stale values of
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct UniformFlags: u32 {
        const PROJECTION = 1;
        const MODEL_VIEW = 1 << 1;
        const COLOR = 1 << 2;
    }
}

/// redundancy filter over one piece of bound state
pub struct Cached<T> {
    value: Option<T>,
}

impl<T: Copy + PartialEq> Cached<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// store the value, true when it differed from the cache
    pub fn set(&mut self, value: T) -> bool {
        if self.value == Some(value) {
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<T> {
        self.value
    }

    /// force the next set to report a change
    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

impl<T: Copy + PartialEq> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RenderState {
    pub texture: Cached<Handle>,
    pub program: Cached<Program>,
    pub format: Cached<VertexFormat>,
    pub clear_color: Cached<Color>,
    /// which framebuffer replay believes is bound; starts unknown and
    /// is invalidated whenever immediate resource work rebinds one
    pub surface: Cached<SurfaceTarget>,
    pub draw_color: Color,
    pub projection: Mat4,
    pub matrix: MatrixStack,
    dirty: [UniformFlags; PROGRAM_COUNT],
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            texture: Cached::new(),
            program: Cached::new(),
            format: Cached::new(),
            clear_color: Cached::new(),
            surface: Cached::new(),
            draw_color: Color::WHITE,
            projection: Mat4::identity(),
            matrix: MatrixStack::new(),
            // nothing has been uploaded yet
            dirty: [UniformFlags::all(); PROGRAM_COUNT],
        }
    }

    pub fn set_texture(&mut self, texture: Handle) -> bool {
        self.texture.set(texture)
    }

    pub fn set_program(&mut self, program: Program) -> bool {
        self.program.set(program)
    }

    pub fn set_vertex_format(&mut self, format: VertexFormat) -> bool {
        self.format.set(format)
    }

    pub fn set_clear_color(&mut self, color: Color) -> bool {
        self.clear_color.set(color)
    }

    /// the app may switch programs between draws needing the same
    /// uniform, so every write dirties the flag on all programs
    pub fn set_draw_color(&mut self, color: Color) -> bool {
        if self.draw_color == color {
            return false;
        }
        self.draw_color = color;
        self.mark_dirty(UniformFlags::COLOR);
        true
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.mark_dirty(UniformFlags::PROJECTION);
    }

    pub fn mark_model_view_dirty(&mut self) {
        self.mark_dirty(UniformFlags::MODEL_VIEW);
    }

    fn mark_dirty(&mut self, flags: UniformFlags) {
        for mask in self.dirty.iter_mut() {
            *mask |= flags;
        }
    }

    /// stale uniforms of one program, cleared on the way out
    pub fn take_dirty(&mut self, program: Program) -> UniformFlags {
        std::mem::take(&mut self.dirty[program as usize])
    }

    /// surfaces do not share transform context: entering a target
    /// resets the matrix stack and adopts its projection
    pub fn enter_target(&mut self, projection: Mat4) {
        self.matrix.reset();
        self.mark_dirty(UniformFlags::MODEL_VIEW);
        self.set_projection(projection);
    }

    /// viewport refresh of the already bound target (display resize):
    /// adopt the new projection but keep the frame's transforms
    pub fn refresh_target(&mut self, projection: Mat4) {
        self.set_projection(projection);
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_writes_report_one_change() {
        let mut s = RenderState::new();
        let h = Handle::from_raw(0x80);
        assert!(s.set_texture(h));
        assert!(!s.set_texture(h));
        assert!(s.set_program(Program::Shape));
        assert!(!s.set_program(Program::Shape));
        assert!(s.set_program(Program::Texture));
        assert!(s.set_clear_color(Color::BLACK));
        assert!(!s.set_clear_color(Color::BLACK));
    }

    #[test]
    fn invalidated_format_reports_a_change_again() {
        let mut s = RenderState::new();
        assert!(s.set_vertex_format(VertexFormat::Solid));
        assert!(!s.set_vertex_format(VertexFormat::Solid));
        s.format.invalidate();
        assert!(s.set_vertex_format(VertexFormat::Solid));
    }

    #[test]
    fn color_writes_dirty_every_program() {
        let mut s = RenderState::new();
        s.take_dirty(Program::Shape);
        s.take_dirty(Program::Texture);
        assert!(s.set_draw_color(Color::rgb(1, 2, 3)));
        assert_eq!(s.take_dirty(Program::Shape), UniformFlags::COLOR);
        assert_eq!(s.take_dirty(Program::Texture), UniformFlags::COLOR);
        // mask is cleared once taken
        assert_eq!(s.take_dirty(Program::Shape), UniformFlags::empty());
    }

    #[test]
    fn redundant_color_writes_leave_masks_clean() {
        let mut s = RenderState::new();
        s.set_draw_color(Color::rgb(9, 9, 9));
        s.take_dirty(Program::Shape);
        assert!(!s.set_draw_color(Color::rgb(9, 9, 9)));
        assert_eq!(s.take_dirty(Program::Shape), UniformFlags::empty());
    }

    #[test]
    fn entering_a_target_resets_transform_context() {
        let mut s = RenderState::new();
        s.matrix.push();
        s.matrix.current_mut().translate(4.0, 4.0);
        s.enter_target(Mat4::identity());
        assert_eq!(s.matrix.depth(), 0);
        assert_eq!(*s.matrix.current(), Mat4::identity());
        assert!(s
            .take_dirty(Program::Shape)
            .contains(UniformFlags::PROJECTION | UniformFlags::MODEL_VIEW));
    }

    #[test]
    fn target_refresh_keeps_the_frame_transforms() {
        let mut s = RenderState::new();
        s.matrix.push();
        s.matrix.current_mut().translate(4.0, 4.0);
        let kept = *s.matrix.current();
        s.take_dirty(Program::Shape);
        // a mid-frame display resize must not discard recorded
        // push/translate effects for the rest of the frame
        s.refresh_target(Mat4::ortho(0.0, 8.0, 6.0, 0.0));
        assert_eq!(s.matrix.depth(), 1);
        assert_eq!(*s.matrix.current(), kept);
        let dirty = s.take_dirty(Program::Shape);
        assert!(dirty.contains(UniformFlags::PROJECTION));
        assert!(!dirty.contains(UniformFlags::MODEL_VIEW));
    }

    #[test]
    fn surface_cache_starts_unknown_and_filters_rebinds() {
        let mut s = RenderState::new();
        // the first bind of any frame must go through
        assert!(s.surface.set(SurfaceTarget::Default));
        assert!(!s.surface.set(SurfaceTarget::Default));
        let h = Handle::from_raw(0x81);
        assert!(s.surface.set(SurfaceTarget::Surface(h)));
        s.surface.invalidate();
        assert!(s.surface.set(SurfaceTarget::Surface(h)));
    }
}
