// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! Gpu texture and surface records, owned by the handle tables in
//! render::gl::graphics. A surface is a framebuffer plus a depth
//! renderbuffer plus exactly one owned color texture, referenced by
//! handle so teardown can route through the texture table.

use crate::render::gl::view::View;
use crate::util::handle::Handle;
use glow::HasContext;

/// 1..=4 channel 8bit images map onto the gles2 external formats
pub fn channel_format(channels: i32) -> Option<u32> {
    match channels {
        1 => Some(glow::LUMINANCE),
        2 => Some(glow::LUMINANCE_ALPHA),
        3 => Some(glow::RGB),
        4 => Some(glow::RGBA),
        _ => None,
    }
}

pub struct GlTexture {
    pub texture: glow::Texture,
    pub width: i32,
    pub height: i32,
    pub channels: i32,
    pub smooth: bool,
}

impl GlTexture {
    /// blank when pixels is None, rows tightly packed otherwise
    pub fn new(
        gl: &glow::Context,
        w: i32,
        h: i32,
        channels: i32,
        pixels: Option<&[u8]>,
    ) -> Result<Self, String> {
        if w <= 0 || h <= 0 {
            return Err(format!("bad texture size {}x{}", w, h));
        }
        let format = channel_format(channels)
            .ok_or_else(|| format!("bad channel count {}", channels))?;
        if let Some(data) = pixels {
            let need = (w * h * channels) as usize;
            if data.len() < need {
                return Err(format!("pixel data too short: {} < {}", data.len(), need));
            }
        }

        let texture = unsafe { gl.create_texture().map_err(|e| e.to_string())? };

        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                w,
                h,
                0,
                format,
                glow::UNSIGNED_BYTE,
                pixels,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }

        Ok(Self {
            texture,
            width: w,
            height: h,
            channels,
            smooth: false,
        })
    }

    /// overwrite a region, same channel count as the texture
    pub fn update(
        &self,
        gl: &glow::Context,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        pixels: &[u8],
    ) -> Result<(), String> {
        if x < 0 || y < 0 || w <= 0 || h <= 0 || x + w > self.width || y + h > self.height {
            return Err(format!("bad update region {},{} {}x{}", x, y, w, h));
        }
        let format = channel_format(self.channels).unwrap_or(glow::RGBA);
        let need = (w * h * self.channels) as usize;
        if pixels.len() < need {
            return Err(format!("pixel data too short: {} < {}", pixels.len(), need));
        }
        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                x,
                y,
                w,
                h,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            );
        }
        Ok(())
    }

    /// toggle between nearest and linear filtering
    pub fn set_smooth(&mut self, gl: &glow::Context, smooth: bool) {
        if self.smooth == smooth {
            return;
        }
        self.smooth = smooth;
        let filter = if smooth { glow::LINEAR } else { glow::NEAREST };
        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter as i32);
        }
    }

    pub fn free(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_texture(self.texture);
        }
    }
}

/// offscreen render target...
pub struct GlSurface {
    pub framebuffer: glow::Framebuffer,
    pub depth: glow::Renderbuffer,
    /// the color attachment, owned exclusively through the texture table
    pub color: Handle,
    pub width: i32,
    pub height: i32,
    pub view: View,
}

impl GlSurface {
    /// attach an already created color texture to a fresh framebuffer
    /// leaves the new framebuffer bound on success; the caller restores
    /// its current target
    pub fn new(
        gl: &glow::Context,
        color: Handle,
        color_texture: glow::Texture,
        w: i32,
        h: i32,
    ) -> Result<Self, String> {
        unsafe {
            let framebuffer = gl.create_framebuffer().map_err(|e| e.to_string())?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(color_texture),
                0,
            );

            let depth = match gl.create_renderbuffer() {
                Ok(d) => d,
                Err(e) => {
                    gl.delete_framebuffer(framebuffer);
                    return Err(e);
                }
            };
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, w, h);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            if gl.check_framebuffer_status(glow::FRAMEBUFFER) != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_renderbuffer(depth);
                gl.delete_framebuffer(framebuffer);
                return Err("Framebuffer is not complete".to_string());
            }

            Ok(Self {
                framebuffer,
                depth,
                color,
                width: w,
                height: h,
                view: View::centered(w as f32, h as f32),
            })
        }
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
            gl.viewport(0, 0, self.width, self.height);
        }
    }

    /// gpu objects only; the owned color texture is removed from the
    /// texture table first, by the graphics teardown path
    pub fn free(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.framebuffer);
            gl.delete_renderbuffer(self.depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts_map_to_gles2_formats() {
        assert_eq!(channel_format(1), Some(glow::LUMINANCE));
        assert_eq!(channel_format(2), Some(glow::LUMINANCE_ALPHA));
        assert_eq!(channel_format(3), Some(glow::RGB));
        assert_eq!(channel_format(4), Some(glow::RGBA));
        assert_eq!(channel_format(0), None);
        assert_eq!(channel_format(5), None);
    }
}
