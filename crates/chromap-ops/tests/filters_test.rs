//! Integration tests for the gradient and density filters and the
//! exposure-map graph.

use std::collections::HashMap;

use approx::assert_abs_diff_eq;
use chromap_core::{luminance, luminance_plane, ColorImage, Plane, Rect};
use chromap_ops::{exposure_map, image_density, relative_gradient, ExposureMapParams, Graph, OpsError};

/// Irregular pattern between `lo` and `hi` that depends only on (x, y).
fn pattern(w: u32, h: u32, lo: f32, hi: f32) -> Plane {
    let mut plane = Plane::new(Rect::from_size(w, h));
    for (x, y) in Rect::from_size(w, h).iter_coords() {
        let step = ((x * x + 3 * y) % 7) as f32 / 6.0;
        plane.set_pixel(x, y, [lo + (hi - lo) * step]);
    }
    plane
}

#[test]
fn test_gradient_of_step_edge() {
    // Vertical edge between x = 3 and x = 4
    let mut plane = Plane::filled(Rect::from_size(8, 4), [0.25]);
    for (x, y) in Rect::new(4, 0, 4, 4).iter_coords() {
        plane.set_pixel(x, y, [0.75]);
    }
    let grad = relative_gradient(&plane, plane.bounds()).unwrap();

    assert_eq!(grad.pixel(1, 2), [0.0]);
    assert_eq!(grad.pixel(6, 2), [0.0]);

    // Left of the edge: dx = 0.5, sum = 0.25 * 3 + 0.75
    let expected = 0.5 * (4.0 / 1.5) * 0.5;
    assert_abs_diff_eq!(grad.pixel(3, 1)[0], expected, epsilon = 1e-6);
    // Right of the edge: sum = 0.75 * 3 + 0.25
    assert_abs_diff_eq!(grad.pixel(4, 1)[0], 0.5 * (4.0 / 2.5) * 0.5, epsilon = 1e-6);
}

#[test]
fn test_gradient_is_relative() {
    // Scaling the plane leaves the relative gradient unchanged
    let a = pattern(6, 6, 0.2, 0.4);
    let b = pattern(6, 6, 0.02, 0.04);
    let ga = relative_gradient(&a, a.bounds()).unwrap();
    let gb = relative_gradient(&b, b.bounds()).unwrap();
    for (x, y, px) in ga.pixels() {
        assert_abs_diff_eq!(px[0], gb.pixel(x, y)[0], epsilon = 1e-5);
    }
}

#[test]
fn test_filter_subrect_matches_whole() {
    let plane = pattern(10, 7, 0.1, 0.9);
    let whole = image_density(&plane, plane.bounds()).unwrap();
    let rect = Rect::new(2, 1, 5, 4);
    let part = image_density(&plane, rect).unwrap();
    assert_eq!(part.window(), rect);
    assert_eq!(part.bounds(), plane.bounds());
    for (x, y, px) in part.pixels() {
        assert_eq!(px, whole.pixel(x, y));
    }
}

#[test]
fn test_filter_needs_halo() {
    let plane = pattern(10, 10, 0.1, 0.9);
    let inner = plane.crop(Rect::new(2, 2, 4, 4)).unwrap();
    assert!(matches!(
        relative_gradient(&inner, inner.window()),
        Err(OpsError::RegionUnavailable { .. })
    ));
    assert!(relative_gradient(&inner, Rect::new(3, 3, 2, 2)).is_ok());
}

#[test]
fn test_density_flat_and_black() {
    for v in [0.0, 0.5, 7.0] {
        let plane = Plane::filled(Rect::from_size(5, 5), [v]);
        let dens = image_density(&plane, plane.bounds()).unwrap();
        assert!(dens.data().iter().all(|&d| d == 1.0), "value {v}");
    }
}

#[test]
fn test_density_scales_with_image_size() {
    let small = pattern(8, 8, 0.2, 0.6);
    let large = pattern(32, 16, 0.2, 0.6);
    let ds = image_density(&small, small.bounds()).unwrap().pixel(3, 3)[0];
    let dl = image_density(&large, large.bounds()).unwrap().pixel(3, 3)[0];
    let g = relative_gradient(&small, small.bounds()).unwrap().pixel(3, 3)[0];
    assert_abs_diff_eq!(ds, (1.0 + (g * 8.0).powi(2)).sqrt(), epsilon = 1e-4);
    assert_abs_diff_eq!(dl, (1.0 + (g * 32.0).powi(2)).sqrt(), epsilon = 1e-3);
}

#[test]
fn test_exposure_map_keeps_new_luminance_on_flat_images() {
    let old = ColorImage::filled(Rect::from_size(6, 6), [0.3, 0.25, 0.1, 0.8]);
    let new = ColorImage::filled(Rect::from_size(6, 6), [0.7, 0.7, 0.7, 1.0]);
    let out = exposure_map(&new, &old, &ExposureMapParams::default()).unwrap();
    for (_, _, px) in out.pixels() {
        assert_abs_diff_eq!(luminance([px[0], px[1], px[2]]), 0.7, epsilon = 1e-5);
        // Alpha follows the old exposure
        assert_eq!(px[3], 0.8);
    }
}

#[test]
fn test_exposure_map_gamma_changes_chroma_only_where_density_differs() {
    let old = {
        let luma = pattern(8, 8, 0.2, 0.3);
        let mut img = ColorImage::new(luma.bounds());
        for (x, y, [v]) in luma.pixels() {
            img.set_pixel(x, y, [v * 1.2, v, v * 0.6, 1.0]);
        }
        img
    };
    let new = ColorImage::filled(old.bounds(), [0.5, 0.5, 0.5, 1.0]);
    let weak = exposure_map(&new, &old, &ExposureMapParams::default()).unwrap();
    let strong = exposure_map(
        &new,
        &old,
        &ExposureMapParams {
            chroma_scale_gamma: 1.0,
            ..Default::default()
        },
    )
    .unwrap();

    // Flat new against textured old: density ratio < 1, so a stronger gamma
    // pulls the result closer to gray
    let spread = |px: [f32; 4]| px[0] - px[2];
    let (w, s) = (weak.pixel(4, 4), strong.pixel(4, 4));
    assert!(spread(s) < spread(w), "weak {w:?} strong {s:?}");
    assert_abs_diff_eq!(luminance([s[0], s[1], s[2]]), 0.5, epsilon = 1e-5);
}

#[test]
fn test_custom_graph() {
    // (a - Y(a)) * 2 + Y(a): doubles chroma
    let mut g = Graph::new();
    let a = g.input("a");
    let y = g.luminance(a).unwrap();
    let chroma = g.subtract(a, y).unwrap();
    let two = g.constant([2.0; 4]);
    let boosted = g.multiply(chroma, two).unwrap();
    let out = g.add_images(boosted, y).unwrap();

    let img = ColorImage::filled(Rect::from_size(2, 2), [0.6, 0.4, 0.3, 1.0]);
    let result = g.evaluate(out, &HashMap::from([("a", &img)])).unwrap();
    let ya = luminance([0.6, 0.4, 0.3]);
    let px = result.pixel(0, 0);
    assert_abs_diff_eq!(px[0], ya + 2.0 * (0.6 - ya), epsilon = 1e-6);
    assert_abs_diff_eq!(px[2], ya + 2.0 * (0.3 - ya), epsilon = 1e-6);
}

#[test]
fn test_graph_density_matches_filter() {
    let src = {
        let luma = pattern(7, 5, 0.1, 0.5);
        luma.map_channels(|[v]| [v, v, v, 1.0])
    };
    let mut g = Graph::new();
    let a = g.input("src");
    let d = g.density(a).unwrap();
    let via_graph = g.evaluate(d, &HashMap::from([("src", &src)])).unwrap();

    let luma = luminance_plane(&src);
    let direct = image_density(&luma, luma.bounds()).unwrap();
    for (x, y, [v]) in direct.pixels() {
        assert_eq!(via_graph.pixel(x, y)[1], v);
    }
}
