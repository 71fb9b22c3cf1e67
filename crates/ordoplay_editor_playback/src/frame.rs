// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame buffers and compositing areas.

/// An RGBA float image.
///
/// Colors are straight (non-premultiplied) alpha in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl FrameBuffer {
    /// Create a transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels, row major
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Fill the whole buffer
    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    /// Composite `color` over the pixel at `(x, y)` with extra `opacity`
    pub fn blend_over(&mut self, x: u32, y: u32, color: [f32; 4], opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        let dst = self.pixels[idx];
        let src_a = (color[3] * opacity).clamp(0.0, 1.0);
        let out_a = src_a + dst[3] * (1.0 - src_a);
        let mut out = [0.0, 0.0, 0.0, out_a];
        if out_a > 0.0 {
            for c in 0..3 {
                out[c] = (color[c] * src_a + dst[c] * dst[3] * (1.0 - src_a)) / out_a;
            }
        }
        self.pixels[idx] = out;
    }

    /// Convert to 8-bit RGBA bytes
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Where and how one layer lands in the output frame.
///
/// The renderer fills in `pixels_written` once the layer is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderArea {
    /// Top-left corner in output pixels
    pub origin: [f32; 2],
    /// Scale applied to the layer's natural size
    pub scale: [f32; 2],
    /// Layer opacity in `[0, 1]`
    pub opacity: f32,
    /// Multiplicative tint
    pub tint: [f32; 4],
    /// Pixels touched by the layer
    pub pixels_written: usize,
}

impl Default for RenderArea {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            scale: [1.0, 1.0],
            opacity: 1.0,
            tint: [1.0; 4],
            pixels_written: 0,
        }
    }
}

impl RenderArea {
    /// Integer pixel rectangle `(x0, y0, x1, y1)` covered by a layer of
    /// natural size `width` x `height`, clipped to `target`
    pub fn pixel_bounds(&self, width: u32, height: u32, target: &FrameBuffer) -> Option<(u32, u32, u32, u32)> {
        let (x0, y0, x1, y1) = self.layer_bounds(width, height);

        let cx0 = x0.clamp(0, target.width() as i64);
        let cy0 = y0.clamp(0, target.height() as i64);
        let cx1 = x1.clamp(0, target.width() as i64);
        let cy1 = y1.clamp(0, target.height() as i64);
        if cx0 >= cx1 || cy0 >= cy1 {
            return None;
        }
        Some((cx0 as u32, cy0 as u32, cx1 as u32, cy1 as u32))
    }

    /// Unclipped pixel rectangle `(x0, y0, x1, y1)` of a layer of natural
    /// size `width` x `height`; may extend past the target on any side
    pub fn layer_bounds(&self, width: u32, height: u32) -> (i64, i64, i64, i64) {
        let x0 = self.origin[0].round() as i64;
        let y0 = self.origin[1].round() as i64;
        let x1 = x0 + (width as f32 * self.scale[0]).round() as i64;
        let y1 = y0 + (height as f32 * self.scale[1]).round() as i64;
        (x0, y0, x1, y1)
    }

    /// Apply the tint to a color
    pub fn tinted(&self, color: [f32; 4]) -> [f32; 4] {
        [
            color[0] * self.tint[0],
            color[1] * self.tint[1],
            color[2] * self.tint[2],
            color[3] * self.tint[3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_over_replaces() {
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.clear([0.0, 0.0, 1.0, 1.0]);
        buffer.blend_over(0, 0, [1.0, 0.0, 0.0, 1.0], 1.0);
        assert_eq!(buffer.pixel(0, 0), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(buffer.pixel(1, 1), Some([0.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn test_half_opacity_mixes() {
        let mut buffer = FrameBuffer::new(1, 1);
        buffer.clear([0.0, 0.0, 0.0, 1.0]);
        buffer.blend_over(0, 0, [1.0, 1.0, 1.0, 1.0], 0.5);
        assert_eq!(buffer.pixel(0, 0), Some([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(buffer.to_rgba8(), vec![128, 128, 128, 255]);
    }

    #[test]
    fn test_bounds_are_clipped() {
        let target = FrameBuffer::new(10, 10);
        let area = RenderArea {
            origin: [-5.0, 5.0],
            ..Default::default()
        };
        assert_eq!(area.pixel_bounds(10, 10, &target), Some((0, 5, 5, 10)));

        let offscreen = RenderArea {
            origin: [20.0, 0.0],
            ..Default::default()
        };
        assert_eq!(offscreen.pixel_bounds(10, 10, &target), None);
    }
}
