// Tile grid coverage tests over the full rotation range

use rstest::rstest;
use tilemark::watermark::{font_size_for, to_grid_frame, TileGrid};

fn corners(width: u32, height: u32) -> [(f32, f32); 4] {
    let (w, h) = (width as f32, height as f32);
    [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
}

#[rstest]
fn test_corners_inside_grid_at_every_angle(
    #[values(-180.0, -135.0, -90.0, -35.0, -1.0, 0.0, 17.0, 45.0, 90.0, 123.0, 180.0)]
    angle: f32,
    #[values((400, 300), (1920, 1080), (300, 2000), (16, 16))] size: (u32, u32),
) {
    let (width, height) = size;
    let font_size = font_size_for(width, height, 1.5);
    let text_width = font_size * 8.0;
    let grid = TileGrid::compute(width, height, text_width, font_size, font_size, 4.0).unwrap();

    assert!(grid.covers_diagonal());
    for (x, y) in corners(width, height) {
        let (u, v) = to_grid_frame(x, y, width, height, angle);
        assert!(
            grid.contains(u, v),
            "corner ({}, {}) of {}x{} maps outside the grid at {} degrees",
            x,
            y,
            width,
            height,
            angle
        );
    }
}

#[test]
fn test_full_sweep_in_one_degree_steps() {
    let (width, height) = (640, 480);
    let font_size = font_size_for(width, height, 1.0);
    let grid = TileGrid::compute(width, height, 120.0, font_size, font_size, 5.0).unwrap();

    for degrees in -180..=180 {
        for (x, y) in corners(width, height) {
            let (u, v) = to_grid_frame(x, y, width, height, degrees as f32);
            assert!(grid.contains(u, v), "uncovered corner at {} degrees", degrees);
        }
    }
}

#[rstest]
#[case(400, 300, 1.0, 15.0)]
#[case(1000, 2000, 1.0, 40.0)]
#[case(1000, 2000, 1.5, 60.0)]
#[case(100, 100, 0.5, 7.5)]
fn test_font_size(#[case] width: u32, #[case] height: u32, #[case] size: f32, #[case] expected: f32) {
    assert!((font_size_for(width, height, size) - expected).abs() < 1e-4);
}

#[test]
fn test_every_tile_drawn_exactly_once() {
    let grid = TileGrid::compute(400, 300, 40.0, 15.0, 15.0, 4.0).unwrap();
    let offsets: Vec<_> = grid.offsets().collect();

    assert_eq!(offsets.len(), grid.tile_count());
    assert_eq!(offsets.iter().filter(|o| o.i == 0 && o.j == 0).count(), 1);

    let mut seen = std::collections::HashSet::new();
    for o in &offsets {
        assert!(seen.insert((o.i, o.j)));
    }
}
