use volume_cloud::{
    Orientation, SliceLayer, SortBy, ViewerOptions, ViewerSession, Window,
    volume_loader::VolumeLoader,
};

const SIZE: usize = 64;
const INTERCEPT: f64 = -1024.0;

/// Head-like phantom: skull shell, gray and white matter, a fluid core.
fn phantom_layer(layer: usize) -> SliceLayer {
    let centre = SIZE as f64 / 2.0;
    let samples = (0..SIZE * SIZE)
        .map(|i| {
            let (x, y) = ((i % SIZE) as f64, (i / SIZE) as f64);
            let z = layer as f64;
            let r = ((x - centre).powi(2) + (y - centre).powi(2) + (z - centre).powi(2)).sqrt();
            let hu: f64 = match r {
                r if r < 8.0 => 5.0,
                r if r < 16.0 => 25.0,
                r if r < 24.0 => 40.0,
                r if r < 28.0 => 700.0,
                _ => -1000.0,
            };
            (hu - INTERCEPT + 32768.0) as u16
        })
        .collect();

    SliceLayer {
        instance_number: layer as i32 + 1,
        position_z: layer as f64 * 1.25,
        pixel_spacing: (1.0, 1.0),
        rescale_intercept: INTERCEPT,
        width: SIZE,
        height: SIZE,
        samples,
    }
}

fn main() {
    env_logger::init();

    let options = ViewerOptions::default();
    let layers: Vec<_> = (0..SIZE).map(phantom_layer).collect();
    let window = Window::from_center_width(40.0, 80.0).expect("should be a valid window");
    let grid = VolumeLoader::assemble(
        &layers,
        window,
        SortBy::InstanceNumber,
        options.slice_spacing_tolerance,
    )
    .expect("should have assembled phantom volume");

    let stats = grid.stats();
    log::info!("Intensity range [{}, {}]", stats.min, stats.max);

    if let Some(image) = grid.slice_image(SIZE / 2, Orientation::Coronal, &window) {
        image.save("slice.png").expect("should have saved slice preview");
    }

    let mut session = ViewerSession::new(grid, &options);
    session.set_color_mode(true);
    session.set_contours_mode(true);
    session
        .set_active_slice(SIZE / 2)
        .expect("should select the middle slice");
    session.set_highlight_active_slice(true);

    session.pointer_press(0.0, 0.0);
    session.pointer_move(60.0, 40.0, volume_cloud::PointerButton::Primary, false);
    session.pointer_release();

    session
        .save_snapshot("result.png", 512, 512)
        .expect("should have saved snapshot");
    session
        .export_xyz("points.xyz")
        .expect("should have exported points");
}
