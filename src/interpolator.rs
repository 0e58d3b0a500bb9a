use ndarray::ArrayView2;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Output size `(depth, height, width)` that gives every axis the physical
    /// resolution of the finest one.
    pub(crate) fn isotropic_dimensions(
        spacing: (f64, f64, f64),
        dim: (usize, usize, usize),
    ) -> (u32, u32, u32) {
        let (x_spacing, y_spacing, z_spacing) = spacing;
        let min_spacing = x_spacing.min(y_spacing).min(z_spacing);
        if min_spacing <= 0.0 {
            return (dim.0 as u32, dim.1 as u32, dim.2 as u32);
        }

        // dim is (depth, height, width), i.e. (z, y, x)
        let scaled = |count: usize, spacing: f64| {
            ((count as f64 * spacing / min_spacing).round() as u32).max(1)
        };

        (
            scaled(dim.0, z_spacing),
            scaled(dim.1, y_spacing),
            scaled(dim.2, x_spacing),
        )
    }

    /// Samples `plane` at output pixel `(x, y)` of a `width × height` target,
    /// using pixel centres on both grids.
    #[inline]
    pub(crate) fn resample(
        plane: &ArrayView2<f32>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> f32 {
        let (plane_height, plane_width) = plane.dim();
        let src_x = (x as f32 + 0.5) / width as f32 * plane_width as f32 - 0.5;
        let src_y = (y as f32 + 0.5) / height as f32 * plane_height as f32 - 0.5;

        let src_x = src_x.clamp(0.0, (plane_width - 1) as f32);
        let src_y = src_y.clamp(0.0, (plane_height - 1) as f32);

        Self::bilinear_interpolate(plane, src_y, src_x)
    }

    #[inline]
    pub(crate) fn bilinear_interpolate(plane: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
        let (height, width) = plane.dim();

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f32;
        let dx = x - x0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v0 = plane[[y0, x0]].mul_add(one_minus_dx, plane[[y0, x1]] * dx);
        let v1 = plane[[y1, x0]].mul_add(one_minus_dx, plane[[y1, x1]] * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }
}
