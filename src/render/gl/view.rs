// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Every render target (the default framebuffer and each surface)
//! carries exactly one current view: a center, a size and a rotation,
//! turned into the orthographic projection the shaders consume.

use crate::render::gl::transform::Mat4;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct View {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub rotation: f32,
}

impl View {
    pub fn new(x: f32, y: f32, w: f32, h: f32, rotation: f32) -> Self {
        Self { x, y, w, h, rotation }
    }

    /// default view of a w x h target: origin top left, y down
    pub fn centered(w: f32, h: f32) -> Self {
        Self::new(w / 2.0, h / 2.0, w, h, 0.0)
    }

    /// y-down ortho: top = center - h/2, optionally rotated about the center
    pub fn projection(&self) -> Mat4 {
        let l = self.x - self.w / 2.0;
        let r = self.x + self.w / 2.0;
        let t = self.y - self.h / 2.0;
        let b = self.y + self.h / 2.0;
        let mut m = Mat4::ortho(l, r, b, t);
        if self.rotation != 0.0 {
            m.translate(self.x, self.y);
            m.rotate(self.rotation);
            m.translate(-self.x, -self.y);
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(v: &View, x: f32, y: f32) -> (f32, f32) {
        let m = v.projection().0;
        (
            m[0] * x + m[4] * y + m[12],
            m[1] * x + m[5] * y + m[13],
        )
    }

    #[test]
    fn centered_view_covers_the_target() {
        let v = View::centered(640.0, 480.0);
        assert_eq!(project(&v, 0.0, 0.0), (-1.0, 1.0));
        assert_eq!(project(&v, 640.0, 480.0), (1.0, -1.0));
    }

    #[test]
    fn rotation_spins_about_the_center() {
        let v = View::new(160.0, 120.0, 320.0, 240.0, 180.0);
        // the center is fixed, a corner swaps to the opposite one
        let (cx, cy) = project(&v, 160.0, 120.0);
        assert!(cx.abs() < 1e-5 && cy.abs() < 1e-5);
        let (x, y) = project(&v, 0.0, 0.0);
        assert!((x - 1.0).abs() < 1e-5);
        assert!((y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn off_center_view_pans() {
        let v = View::new(100.0, 0.0, 200.0, 200.0, 0.0);
        assert_eq!(project(&v, 100.0, 0.0), (0.0, 0.0));
        assert_eq!(project(&v, 0.0, -100.0), (-1.0, 1.0));
    }
}
