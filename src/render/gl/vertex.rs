// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Per vertex-format staging buffers.
//! Drawing calls append floats during the frame; the whole array is
//! pushed to the gpu once at swap time. The cpu array never shrinks:
//! clear only resets the length, the capacity is kept across frames.

use glow::HasContext;

/// vertex layouts understood by the shaders
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VertexFormat {
    /// x, y
    Solid = 0,
    /// x, y, u, v
    Textured = 1,
}

impl VertexFormat {
    /// floats per vertex
    pub fn stride(&self) -> usize {
        match self {
            VertexFormat::Solid => 2,
            VertexFormat::Textured => 4,
        }
    }
}

pub struct VertexBuffer {
    pub format: VertexFormat,
    data: Vec<f32>,
    vbo: Option<glow::Buffer>,
    /// floats allocated on the gpu side by the last buffer_data
    gpu_capacity: usize,
}

impl VertexBuffer {
    pub fn new(format: VertexFormat) -> Self {
        Self {
            format,
            data: vec![],
            vbo: None,
            gpu_capacity: 0,
        }
    }

    /// copy floats in, returns the starting element offset
    pub fn append(&mut self, floats: &[f32]) -> usize {
        let at = self.data.len();
        self.data.extend_from_slice(floats);
        at
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// keep the capacity, drop the contents
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn vbo(&self) -> Option<glow::Buffer> {
        self.vbo
    }

    /// push the staged floats to the gpu buffer object
    /// reallocates only when the frame outgrew the last gpu allocation,
    /// otherwise updates in place
    pub fn upload(&mut self, gl: &glow::Context) -> Result<(), String> {
        if self.data.is_empty() {
            return Ok(());
        }
        unsafe {
            let vbo = match self.vbo {
                Some(b) => b,
                None => {
                    let b = gl.create_buffer()?;
                    self.vbo = Some(b);
                    b
                }
            };
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            let bytes = self.data.align_to::<u8>().1;
            if self.data.len() > self.gpu_capacity {
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STREAM_DRAW);
                self.gpu_capacity = self.data.len();
            } else {
                gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytes);
            }
        }
        Ok(())
    }

    pub fn free(&mut self, gl: &glow::Context) {
        if let Some(vbo) = self.vbo.take() {
            unsafe {
                gl.delete_buffer(vbo);
            }
        }
        self.gpu_capacity = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_the_starting_offset() {
        let mut vb = VertexBuffer::new(VertexFormat::Solid);
        assert_eq!(vb.append(&[0.0, 1.0]), 0);
        assert_eq!(vb.append(&[2.0, 3.0, 4.0, 5.0]), 2);
        assert_eq!(vb.len(), 6);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut vb = VertexBuffer::new(VertexFormat::Textured);
        vb.append(&[0.0; 256]);
        let cap = vb.capacity();
        vb.clear();
        assert!(vb.is_empty());
        assert_eq!(vb.capacity(), cap);
    }

    #[test]
    fn strides_match_the_shader_layouts() {
        assert_eq!(VertexFormat::Solid.stride(), 2);
        assert_eq!(VertexFormat::Textured.stride(), 4);
    }
}
