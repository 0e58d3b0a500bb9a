//! Software point splatting.
//!
//! Points are drawn one pixel each, in submission order, with source-alpha
//! blending and no depth test.

use glam::Vec3;
use image::{ImageBuffer, Rgba, RgbaImage};

use crate::camera::Camera;
use crate::point_cloud::PointCloud;

pub struct Renderer {
    pub background: [f32; 3],
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0],
        }
    }
}

impl Renderer {
    pub fn new(background: [f32; 3]) -> Self {
        Self { background }
    }

    /// Pixel hit by an NDC position on a `width × height` target.
    #[inline]
    fn to_pixel(ndc: Vec3, width: u32, height: u32) -> (u32, u32) {
        let x = ((ndc.x + 1.0) * 0.5 * width as f32).floor() as u32;
        let y = ((1.0 - ndc.y) * 0.5 * height as f32).floor() as u32;
        (x.min(width - 1), y.min(height - 1))
    }

    pub fn render(
        &self,
        cloud: &PointCloud,
        camera: &Camera,
        width: u32,
        height: u32,
    ) -> RgbaImage {
        if width == 0 || height == 0 {
            return RgbaImage::new(width, height);
        }

        let aspect_ratio = width as f32 / height as f32;
        let view_projection = camera.view_projection_matrix(aspect_ratio);
        let mut target = vec![self.background; (width * height) as usize];

        let mut drawn = 0usize;
        for point in cloud {
            let clip = view_projection * Vec3::from_array(point.position).extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            if ndc.abs().max_element() > 1.0 {
                continue;
            }

            let (x, y) = Self::to_pixel(ndc, width, height);
            let pixel = &mut target[(y * width + x) as usize];
            let a = point.alpha;
            for (channel, source) in pixel.iter_mut().zip(point.color) {
                *channel = source * a + *channel * (1.0 - a);
            }
            drawn += 1;
        }
        log::debug!("Rendered {drawn} of {} points", cloud.len());

        let raw: Vec<u8> = target
            .iter()
            .flat_map(|[r, g, b]| {
                [*r, *g, *b, 1.0].map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
            })
            .collect();
        ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, raw)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}
