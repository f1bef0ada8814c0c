// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Fixed-resolution canvas compositing math. The canvas surface is
//! drawn into the real window as one textured quad that preserves the
//! canvas aspect ratio, and the same scale/offset converts window-space
//! pointer coordinates into canvas space.

#[derive(Clone, Copy, Debug)]
pub struct CanvasLayout {
    pub scale: f32,
    /// quad corners in window pixels
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl CanvasLayout {
    /// letterbox or pillarbox a canvas_w x canvas_h image
    /// into a window_w x window_h framebuffer
    pub fn fit(canvas_w: f32, canvas_h: f32, window_w: f32, window_h: f32) -> Self {
        let canvas_aspect = canvas_w / canvas_h;
        let window_aspect = window_w / window_h;
        let scale = if window_aspect > canvas_aspect {
            // bars on the sides
            window_h / canvas_h
        } else {
            // bars on top and bottom
            window_w / canvas_w
        };
        let w = canvas_w * scale;
        let h = canvas_h * scale;
        let x0 = (window_w - w) / 2.0;
        let y0 = (window_h - h) / 2.0;
        Self {
            scale,
            x0,
            y0,
            x1: x0 + w,
            y1: y0 + h,
        }
    }

    /// window-space position to canvas space
    /// dead-zone pointers land outside [0, w) x [0, h), callers clamp
    pub fn conv_cursor(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.x0) / self.scale, (y - self.y0) / self.scale)
    }

    /// window-space motion delta to canvas space
    pub fn conv_cursor_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.scale, dy / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_window_pillarboxes() {
        // window 5:3, canvas 4:3 -> bars on the sides
        let l = CanvasLayout::fit(320.0, 240.0, 1000.0, 600.0);
        assert_eq!(l.scale, 2.5);
        assert_eq!((l.x0, l.y0), (100.0, 0.0));
        assert_eq!((l.x1, l.y1), (900.0, 600.0));
    }

    #[test]
    fn tall_window_letterboxes() {
        let l = CanvasLayout::fit(320.0, 240.0, 640.0, 640.0);
        assert_eq!(l.scale, 2.0);
        assert_eq!((l.x0, l.y0), (0.0, 80.0));
        assert_eq!((l.x1, l.y1), (640.0, 560.0));
    }

    #[test]
    fn cursor_maps_into_canvas_space() {
        let l = CanvasLayout::fit(320.0, 240.0, 1000.0, 600.0);
        assert_eq!(l.conv_cursor(500.0, 300.0), (160.0, 120.0));
        assert_eq!(l.conv_cursor_delta(25.0, -5.0), (10.0, -2.0));
    }

    #[test]
    fn dead_zone_maps_out_of_bounds() {
        let l = CanvasLayout::fit(320.0, 240.0, 1000.0, 600.0);
        let (x, _) = l.conv_cursor(50.0, 300.0);
        assert!(x < 0.0);
        let (x, _) = l.conv_cursor(950.0, 300.0);
        assert!(x >= 320.0);
    }

    #[test]
    fn exact_fit_is_the_identity() {
        let l = CanvasLayout::fit(320.0, 240.0, 320.0, 240.0);
        assert_eq!(l.scale, 1.0);
        assert_eq!(l.conv_cursor(12.0, 34.0), (12.0, 34.0));
    }
}
