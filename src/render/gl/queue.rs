// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Frame recording. Every immediate drawing call follows the same two
//! step protocol: append the call's vertices to the staging buffer of
//! its format, then append one or more Draw commands referencing the
//! returned offset. Nothing here touches the gpu; swap uploads and
//! replays the whole queue in one go.
//!
//! Shapes with a fill and an outline record the fill first, and either
//! part is skipped entirely when its color is fully transparent: an
//! invisible draw would still cost a state refresh and a draw call.

use crate::render::gl::color::Color;
use crate::render::gl::command::{Command, CommandBuffer, SurfaceTarget};
use crate::render::gl::shader::Program;
use crate::render::gl::vertex::{VertexBuffer, VertexFormat};
use crate::render::gl::view::View;
use crate::util::handle::Handle;
use crate::CIRCLE_VERTEX_COUNT;

pub struct FrameQueue {
    pub commands: CommandBuffer,
    pub solid: VertexBuffer,
    pub textured: VertexBuffer,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self {
            commands: CommandBuffer::new(),
            solid: VertexBuffer::new(VertexFormat::Solid),
            textured: VertexBuffer::new(VertexFormat::Textured),
        }
    }

    pub fn buffer_mut(&mut self, format: VertexFormat) -> &mut VertexBuffer {
        match format {
            VertexFormat::Solid => &mut self.solid,
            VertexFormat::Textured => &mut self.textured,
        }
    }

    fn push_solid(&mut self, color: Color, mode: u32, vertices: &[f32]) {
        let stride = VertexFormat::Solid.stride();
        let first = (self.solid.append(vertices) / stride) as i32;
        self.commands.push(Command::Draw {
            color,
            texture: Handle::NONE,
            program: Program::Shape,
            format: VertexFormat::Solid,
            mode,
            first,
            count: (vertices.len() / stride) as i32,
        });
    }

    fn push_textured(&mut self, color: Color, texture: Handle, mode: u32, vertices: &[f32]) {
        let stride = VertexFormat::Textured.stride();
        let first = (self.textured.append(vertices) / stride) as i32;
        self.commands.push(Command::Draw {
            color,
            texture,
            program: Program::Texture,
            format: VertexFormat::Textured,
            mode,
            first,
            count: (vertices.len() / stride) as i32,
        });
    }

    pub fn clear(&mut self, color: Color) {
        self.commands.push(Command::Clear { color });
    }

    pub fn point(&mut self, x: f32, y: f32, color: Color) {
        if color.alpha() == 0 {
            return;
        }
        self.push_solid(color, glow::POINTS, &[x, y]);
    }

    pub fn line(&mut self, ax: f32, ay: f32, bx: f32, by: f32, color: Color) {
        if color.alpha() == 0 {
            return;
        }
        self.push_solid(color, glow::LINES, &[ax, ay, bx, by]);
    }

    pub fn triangle(&mut self, vertices: &[f32; 6], outline: Color, fill: Color) {
        if fill.alpha() > 0 {
            self.push_solid(fill, glow::TRIANGLES, vertices);
        }
        if outline.alpha() > 0 {
            self.push_solid(outline, glow::LINE_LOOP, vertices);
        }
    }

    pub fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, outline: Color, fill: Color) {
        let vertices = [x, y, x + w, y, x + w, y + h, x, y + h];
        if fill.alpha() > 0 {
            self.push_solid(fill, glow::TRIANGLE_FAN, &vertices);
        }
        if outline.alpha() > 0 {
            self.push_solid(outline, glow::LINE_LOOP, &vertices);
        }
    }

    /// circles are fixed-resolution regular polygons,
    /// callers can not control the tessellation
    pub fn circle(&mut self, x: f32, y: f32, radius: f32, outline: Color, fill: Color) {
        if fill.alpha() == 0 && outline.alpha() == 0 {
            return;
        }
        let mut vertices = [0.0f32; CIRCLE_VERTEX_COUNT * 2];
        for i in 0..CIRCLE_VERTEX_COUNT {
            let angle = i as f32 * std::f32::consts::TAU / CIRCLE_VERTEX_COUNT as f32;
            vertices[i * 2] = x + radius * angle.cos();
            vertices[i * 2 + 1] = y + radius * angle.sin();
        }
        if fill.alpha() > 0 {
            self.push_solid(fill, glow::TRIANGLE_FAN, &vertices);
        }
        if outline.alpha() > 0 {
            self.push_solid(outline, glow::LINE_LOOP, &vertices);
        }
    }

    /// textured quad, uv rect in normalized texture coordinates
    pub fn texture_quad(
        &mut self,
        texture: Handle,
        color: Color,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        uv: [f32; 4],
    ) {
        if color.alpha() == 0 {
            return;
        }
        let [u0, v0, u1, v1] = uv;
        let vertices = [
            x,
            y,
            u0,
            v0,
            x + w,
            y,
            u1,
            v0,
            x + w,
            y + h,
            u1,
            v1,
            x,
            y + h,
            u0,
            v1,
        ];
        self.push_textured(color, texture, glow::TRIANGLE_FAN, &vertices);
    }

    /// pre-shaped glyph quads from the text collaborator,
    /// four (x, y, u, v) vertices per glyph, drawn as triangles
    pub fn text(&mut self, atlas: Handle, color: Color, quads: &[f32]) {
        if color.alpha() == 0 || quads.is_empty() {
            return;
        }
        let stride = VertexFormat::Textured.stride();
        let quad_count = quads.len() / (stride * 4);
        if quad_count == 0 {
            return;
        }
        let mut vertices = Vec::with_capacity(quad_count * 6 * stride);
        for q in 0..quad_count {
            let at = q * stride * 4;
            let corner = |i: usize| &quads[at + i * stride..at + (i + 1) * stride];
            for i in [0, 1, 2, 2, 3, 0] {
                vertices.extend_from_slice(corner(i));
            }
        }
        self.push_textured(color, atlas, glow::TRIANGLES, &vertices);
    }

    pub fn set_surface(&mut self, target: SurfaceTarget) {
        self.commands.push(Command::SetSurface { target });
    }

    pub fn reset_surface(&mut self) {
        self.commands.push(Command::ResetSurface);
    }

    pub fn set_view(&mut self, view: View) {
        self.commands.push(Command::SetView { view });
    }

    pub fn reset_view(&mut self) {
        self.commands.push(Command::ResetView);
    }

    pub fn push_matrix(&mut self) {
        self.commands.push(Command::PushMatrix);
    }

    pub fn pop_matrix(&mut self) {
        self.commands.push(Command::PopMatrix);
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.commands.push(Command::Translate { x, y });
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.commands.push(Command::Scale { x, y });
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.commands.push(Command::Rotate { degrees });
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.commands.push(Command::Resize { width, height });
    }

    /// drop the recorded frame, keeping all capacities
    pub fn reset(&mut self) {
        self.commands.clear();
        self.solid.clear();
        self.textured.clear();
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_count(q: &FrameQueue) -> usize {
        q.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .count()
    }

    #[test]
    fn rectangle_records_fill_before_outline() {
        let mut q = FrameQueue::new();
        q.rectangle(0.0, 0.0, 4.0, 4.0, Color::rgb(1, 1, 1), Color::rgb(2, 2, 2));
        assert_eq!(draw_count(&q), 2);
        let draws: Vec<_> = q.commands.iter().collect();
        match (draws[0], draws[1]) {
            (
                Command::Draw {
                    mode: m0,
                    color: c0,
                    ..
                },
                Command::Draw { mode: m1, .. },
            ) => {
                assert_eq!(*m0, glow::TRIANGLE_FAN);
                assert_eq!(*c0, Color::rgb(2, 2, 2));
                assert_eq!(*m1, glow::LINE_LOOP);
            }
            _ => panic!("expected two draws"),
        }
    }

    #[test]
    fn transparent_parts_are_not_recorded() {
        let mut q = FrameQueue::new();
        q.rectangle(0.0, 0.0, 4.0, 4.0, Color::rgb(1, 1, 1), Color::TRANSPARENT);
        assert_eq!(draw_count(&q), 1);
        match q.commands.iter().next() {
            Some(Command::Draw { mode, .. }) => assert_eq!(*mode, glow::LINE_LOOP),
            _ => panic!("expected the outline draw"),
        }

        let mut q = FrameQueue::new();
        q.rectangle(0.0, 0.0, 4.0, 4.0, Color::TRANSPARENT, Color::TRANSPARENT);
        assert_eq!(draw_count(&q), 0);
        assert!(q.solid.is_empty());
    }

    #[test]
    fn draws_reference_staged_vertices() {
        let mut q = FrameQueue::new();
        q.point(1.0, 2.0, Color::WHITE);
        q.line(0.0, 0.0, 8.0, 8.0, Color::WHITE);
        let draws: Vec<_> = q.commands.iter().collect();
        match (draws[0], draws[1]) {
            (
                Command::Draw {
                    first: f0,
                    count: n0,
                    ..
                },
                Command::Draw {
                    first: f1,
                    count: n1,
                    ..
                },
            ) => {
                assert_eq!((*f0, *n0), (0, 1));
                // the line starts right after the point's vertex
                assert_eq!((*f1, *n1), (1, 2));
            }
            _ => panic!("expected two draws"),
        }
        assert_eq!(q.solid.len(), 6);
    }

    #[test]
    fn circle_uses_the_fixed_tessellation() {
        let mut q = FrameQueue::new();
        q.circle(0.0, 0.0, 10.0, Color::TRANSPARENT, Color::WHITE);
        match q.commands.iter().next() {
            Some(Command::Draw { count, .. }) => {
                assert_eq!(*count as usize, CIRCLE_VERTEX_COUNT)
            }
            _ => panic!("expected the fill draw"),
        }
    }

    #[test]
    fn text_expands_quads_to_triangles() {
        let mut q = FrameQueue::new();
        let atlas = Handle::from_raw(0x80);
        // two glyph quads
        let quads: Vec<f32> = (0..32).map(|i| i as f32).collect();
        q.text(atlas, Color::WHITE, &quads);
        match q.commands.iter().next() {
            Some(Command::Draw {
                mode,
                count,
                texture,
                program,
                ..
            }) => {
                assert_eq!(*mode, glow::TRIANGLES);
                assert_eq!(*count, 12);
                assert_eq!(*texture, atlas);
                assert_eq!(*program, Program::Texture);
            }
            _ => panic!("expected a text draw"),
        }
    }

    #[test]
    fn resize_records_the_new_display_size() {
        let mut q = FrameQueue::new();
        q.resize(800, 600);
        assert!(matches!(
            q.commands.iter().next(),
            Some(Command::Resize {
                width: 800,
                height: 600
            })
        ));
    }

    #[test]
    fn reset_empties_but_keeps_capacity() {
        let mut q = FrameQueue::new();
        for i in 0..50 {
            q.rectangle(i as f32, 0.0, 1.0, 1.0, Color::WHITE, Color::BLACK);
        }
        let ccap = q.commands.capacity();
        let vcap = q.solid.capacity();
        q.reset();
        assert!(q.commands.is_empty());
        assert!(q.solid.is_empty());
        assert!(q.commands.capacity() >= ccap);
        assert!(q.solid.capacity() >= vcap);
    }
}
