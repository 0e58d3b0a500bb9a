//! Scenario tests through the public session API.

use volume_cloud::{
    DisplayParameters, PointCloudBuilder, PointerButton, Projection, SessionError, ViewerOptions,
    ViewerSession, VolumeError, VolumeGrid, Window,
};

const BIAS: u16 = 32768;

/// 2×2×2 grid, every voxel at intensity 0, window [-100, 100].
fn cube() -> VolumeGrid {
    let mut grid = VolumeGrid::new(2, 2, 2, -100.0, 100.0, 0.0).unwrap();
    grid.set_layer(0, &[BIAS; 4]).unwrap();
    grid.set_layer(1, &[BIAS; 4]).unwrap();
    grid
}

fn session() -> ViewerSession {
    ViewerSession::new(cube(), &ViewerOptions::default())
}

#[test]
fn test_uniform_cube_gives_eight_gray_points() {
    let session = session();
    let points = session.points();
    assert_eq!(points.len(), 8);
    for point in points {
        assert_eq!(point.color, [0.5, 0.5, 0.5]);
        assert_eq!(point.alpha, ViewerOptions::default().alpha);
    }
}

#[test]
fn test_hide_above_first_layer_keeps_one_layer() {
    let mut session = session();
    let all: Vec<[f32; 3]> = session.points().iter().map(|p| p.position).collect();

    session.set_active_slice(0).unwrap();
    session.set_hide_above(true);
    let first: Vec<[f32; 3]> = session.points().iter().map(|p| p.position).collect();
    assert_eq!(first.len(), 4);
    assert_eq!(first, all[..4]);
}

#[test]
fn test_hide_both_sides_of_missing_slice_is_empty() {
    let grid = cube();
    let params = DisplayParameters {
        active_slice: 2,
        hide_above: true,
        hide_below: true,
        ..DisplayParameters::new(grid.default_window())
    };
    assert!(PointCloudBuilder::new(&grid).build(&params).is_empty());
}

#[test]
fn test_all_zero_grid_hidden_as_empty() {
    let grid = VolumeGrid::new(4, 4, 4, 0.0, 100.0, 0.0).unwrap();
    let session = ViewerSession::new(grid, &ViewerOptions::default());
    assert!(session.points().is_empty());
}

#[test]
fn test_contours_between_two_layers() {
    let mut grid = VolumeGrid::new(2, 2, 2, -100.0, 100.0, 0.0).unwrap();
    grid.set_layer(0, &[BIAS; 4]).unwrap();
    grid.set_layer(1, &[BIAS + 500; 4]).unwrap();

    let mut session = ViewerSession::new(grid, &ViewerOptions::default());
    assert_eq!(session.points().len(), 4);
    session.set_contours_mode(true);
    // every in-window voxel faces an out-of-window voxel on the shared face
    assert_eq!(session.points().len(), 4);
    assert!(session.points().iter().all(|p| p.position[2] < 0.0));
}

#[test]
fn test_contours_skip_outer_faces() {
    // single in-window layer: no neighbour differs
    let mut grid = VolumeGrid::new(3, 3, 1, -100.0, 100.0, 0.0).unwrap();
    grid.set_layer(0, &[BIAS; 9]).unwrap();
    let mut session = ViewerSession::new(grid, &ViewerOptions::default());
    session.set_contours_mode(true);
    assert!(session.points().is_empty());
}

#[test]
fn test_color_mode_rebuilds() {
    let mut grid = VolumeGrid::new(2, 1, 1, -2000.0, 2000.0, 0.0).unwrap();
    grid.set_layer(0, &[BIAS + 300, BIAS - 500]).unwrap();
    let mut session = ViewerSession::new(grid, &ViewerOptions::default());
    assert!(session.points().iter().all(|p| p.color[0] == p.color[1]));

    session.set_color_mode(true);
    let colors: Vec<[f32; 3]> = session.points().iter().map(|p| p.color).collect();
    assert_eq!(colors, vec![[1.0, 1.0, 1.0], [1.0, 0.0, 0.0]]);
}

#[test]
fn test_window_setters_rebuild_and_reject_degenerate_width() {
    let mut session = session();
    assert_eq!(session.window_center(), 0.0);
    assert_eq!(session.window_width(), 200.0);

    session.set_window_center(200.0).unwrap();
    // window [100, 300] excludes intensity 0
    assert!(session.points().is_empty());

    assert!(matches!(
        session.set_window_width(0.0),
        Err(SessionError::Window(_))
    ));
    assert_eq!(session.window_width(), 200.0);

    session.set_window_center(0.0).unwrap();
    assert_eq!(session.points().len(), 8);
}

#[test]
fn test_window_change_keeps_grid_shading() {
    let mut grid = VolumeGrid::new(2, 1, 1, -100.0, 100.0, 0.0).unwrap();
    grid.set_layer(0, &[BIAS - 150, BIAS]).unwrap();
    let mut session = ViewerSession::new(grid, &ViewerOptions::default());
    assert_eq!(session.points().len(), 1);

    // -150 classifies in-window but has zero visibility on the grid window
    session.set_window_center(-150.0).unwrap();
    session.set_window_width(100.0).unwrap();
    assert!(session.points().is_empty());

    session.set_window_center(-100.0).unwrap();
    session.set_window_width(200.0).unwrap();
    let colors: Vec<[f32; 3]> = session.points().iter().map(|p| p.color).collect();
    assert_eq!(colors, vec![[0.5, 0.5, 0.5]]);
}

#[test]
fn test_highlight_active_slice() {
    let mut session = session();
    session.set_active_slice(1).unwrap();
    session.set_highlight_active_slice(true);
    let opaque = session.points().iter().filter(|p| p.alpha == 1.0).count();
    assert_eq!(opaque, 4);
}

#[test]
fn test_setters_validate_input() {
    let mut session = session();
    assert!(matches!(
        session.set_active_slice(2),
        Err(SessionError::Volume(VolumeError::LayerOutOfRange { layer: 2, depth: 2 }))
    ));
    assert!(matches!(
        session.set_alpha(1.5),
        Err(SessionError::InvalidAlpha(_))
    ));
    session.set_alpha(0.3).unwrap();
    assert!(session.points().iter().all(|p| p.alpha == 0.3));
}

#[test]
fn test_set_layer_out_of_range_leaves_grid_unmodified() {
    let mut grid = cube();
    let before = grid.data().to_owned();
    assert!(matches!(
        grid.set_layer(2, &[0; 4]),
        Err(VolumeError::LayerOutOfRange { layer: 2, depth: 2 })
    ));
    assert_eq!(grid.data(), before);
}

#[test]
fn test_camera_follows_input_but_not_points() {
    let mut session = session();
    let points = session.points().clone();

    session.pointer_press(0.0, 0.0);
    session.pointer_move(20.0, 0.0, PointerButton::Primary, false);
    session.pointer_move(20.0, 10.0, PointerButton::Secondary, true);
    session.pointer_release();
    session.wheel(120.0, false);
    session.toggle_projection();

    let camera = session.camera();
    assert_ne!(camera.rotation, glam::Quat::IDENTITY);
    assert!((camera.pan.y + 0.1).abs() < 1e-6);
    assert!(camera.log2_zoom > 0.0);
    assert_eq!(camera.projection, Projection::Perspective);
    assert_eq!(session.points(), &points);

    session.reset_camera();
    assert_eq!(session.camera().rotation, glam::Quat::IDENTITY);
    assert_eq!(session.camera().pan, glam::Vec2::ZERO);
    assert_eq!(session.camera().projection, Projection::Perspective);
}

#[test]
fn test_replace_volume_resets_window_and_slice() {
    let mut session = session();
    session.set_active_slice(1).unwrap();
    session.set_window_center(50.0).unwrap();
    session.wheel(120.0, false);
    session.set_projection(Projection::Perspective);

    let mut grid = VolumeGrid::new(3, 3, 3, -10.0, 10.0, 0.0).unwrap();
    grid.set_layer(2, &[BIAS + 5; 9]).unwrap();
    session.replace_volume(grid);

    assert_eq!(session.display_parameters().active_slice, 0);
    assert_eq!(session.display_parameters().window, Window::new(-10.0, 10.0).unwrap());
    assert_eq!(session.camera().log2_zoom, 0.0);
    assert_eq!(session.camera().projection, Projection::Perspective);
    // zero voxels sit mid-window too
    assert_eq!(session.points().len(), 27);
}

#[test]
fn test_render_and_export() {
    let session = session();
    let image = session.render(32, 32);
    assert_eq!(image.dimensions(), (32, 32));
    assert!(image.pixels().any(|p| p.0[0] > 0));

    let mut out = Vec::new();
    session.points().write_xyz(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 8);
    assert!(text.lines().all(|line| line.split(' ').count() == 3));
}
