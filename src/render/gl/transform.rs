// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! 4x4 column major matrices, mutated in place, and the fixed depth
//! model matrix stack consumed by the shaders as u_modelView.
//! Composition is by right multiplication: translate/scale/rotate
//! apply in the local space of the current matrix.

use crate::MAX_MATRIX_DEPTH;
use log::warn;

/// column major, m[col * 4 + row]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Mat4(pub [f32; 16]);

impl Mat4 {
    pub fn identity() -> Self {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Mat4(m)
    }

    /// orthographic projection, near -1 far 1
    /// callers pass bottom > top for the y-down 2d convention
    pub fn ortho(l: f32, r: f32, b: f32, t: f32) -> Self {
        let mut m = [0.0; 16];
        m[0] = 2.0 / (r - l);
        m[5] = 2.0 / (t - b);
        m[10] = -1.0;
        m[12] = -(r + l) / (r - l);
        m[13] = -(t + b) / (t - b);
        m[15] = 1.0;
        Mat4(m)
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        let m = &mut self.0;
        for row in 0..4 {
            m[12 + row] += m[row] * x + m[4 + row] * y;
        }
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        let m = &mut self.0;
        for row in 0..4 {
            m[row] *= x;
            m[4 + row] *= y;
        }
    }

    /// rotation about z, in degrees
    pub fn rotate(&mut self, degrees: f32) {
        let rad = degrees.to_radians();
        let cos = rad.cos();
        let sin = rad.sin();
        let m = &mut self.0;
        for row in 0..4 {
            let c0 = m[row];
            let c1 = m[4 + row];
            m[row] = c0 * cos + c1 * sin;
            m[4 + row] = -c0 * sin + c1 * cos;
        }
    }

    pub fn as_slice(&self) -> &[f32; 16] {
        &self.0
    }
}

/// fixed depth stack of model matrices
/// slot 0 is always present, one extra slot per push
pub struct MatrixStack {
    stack: [Mat4; MAX_MATRIX_DEPTH + 1],
    index: usize,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            stack: [Mat4::identity(); MAX_MATRIX_DEPTH + 1],
            index: 0,
        }
    }

    pub fn current(&self) -> &Mat4 {
        &self.stack[self.index]
    }

    pub fn current_mut(&mut self) -> &mut Mat4 {
        &mut self.stack[self.index]
    }

    pub fn depth(&self) -> usize {
        self.index
    }

    /// duplicate the current matrix onto the next slot
    /// rejected with a warning when the stack is full
    pub fn push(&mut self) -> bool {
        if self.index >= MAX_MATRIX_DEPTH {
            warn!("matrix stack overflow, push ignored");
            return false;
        }
        self.stack[self.index + 1] = self.stack[self.index];
        self.index += 1;
        true
    }

    /// rejected with a warning at the bottom of the stack
    pub fn pop(&mut self) -> bool {
        if self.index == 0 {
            warn!("matrix stack underflow, pop ignored");
            return false;
        }
        self.index -= 1;
        true
    }

    /// back to a lone identity, done every frame and on surface switch
    pub fn reset(&mut self) {
        self.index = 0;
        self.stack[0] = Mat4::identity();
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform_point(m: &Mat4, x: f32, y: f32) -> (f32, f32) {
        let a = &m.0;
        (
            a[0] * x + a[4] * y + a[12],
            a[1] * x + a[5] * y + a[13],
        )
    }

    #[test]
    fn translate_moves_points() {
        let mut m = Mat4::identity();
        m.translate(10.0, -3.0);
        assert_eq!(transform_point(&m, 0.0, 0.0), (10.0, -3.0));
    }

    #[test]
    fn composition_is_right_multiplied() {
        // scale then translate in local space: point lands at scale * t
        let mut m = Mat4::identity();
        m.scale(2.0, 2.0);
        m.translate(5.0, 0.0);
        assert_eq!(transform_point(&m, 0.0, 0.0), (10.0, 0.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut m = Mat4::identity();
        m.rotate(90.0);
        let (x, y) = transform_point(&m, 1.0, 0.0);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ortho_maps_corners_to_clip_space() {
        // y-down: top of the view maps to +1 in clip space
        let m = Mat4::ortho(0.0, 320.0, 240.0, 0.0);
        assert_eq!(transform_point(&m, 0.0, 0.0), (-1.0, 1.0));
        assert_eq!(transform_point(&m, 320.0, 240.0), (1.0, -1.0));
        assert_eq!(transform_point(&m, 160.0, 120.0), (0.0, 0.0));
    }

    #[test]
    fn stack_bounds_are_enforced() {
        let mut s = MatrixStack::new();
        for _ in 0..MAX_MATRIX_DEPTH {
            assert!(s.push());
        }
        assert_eq!(s.depth(), MAX_MATRIX_DEPTH);
        assert!(!s.push());
        assert_eq!(s.depth(), MAX_MATRIX_DEPTH);
        for _ in 0..MAX_MATRIX_DEPTH {
            assert!(s.pop());
        }
        assert!(!s.pop());
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn push_duplicates_and_pop_restores() {
        let mut s = MatrixStack::new();
        s.current_mut().translate(7.0, 7.0);
        let saved = *s.current();
        s.push();
        assert_eq!(*s.current(), saved);
        s.current_mut().scale(3.0, 3.0);
        s.pop();
        assert_eq!(*s.current(), saved);
    }
}
