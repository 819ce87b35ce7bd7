mod common;

use approx::assert_relative_eq;
use common::synthetic::{pendant_contour, pendant_image};
use drop_shape::physics::{Calibration, PhysicalProperties, STANDARD_GRAVITY};
use drop_shape::types::Point2D;
use drop_shape::younglaplace::{CancelToken, YoungLaplaceFitEngine};
use drop_shape::{AnalysisParams, DropAnalyzer, DropError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn water_at_100_px_per_mm() -> Calibration {
    Calibration {
        drop_density: Some(998.0),
        continuous_density: Some(0.0),
        pixel_scale_px_per_mm: Some(100.0),
        ..Default::default()
    }
}

#[test]
fn bond_03_profile_gives_the_generating_tension() {
    init_logger();
    // Apex radius 100 px = 1 mm; sampled past the equator into the neck.
    let contour = pendant_contour(0.3, 100.0, Point2D::new(320.0, 420.0), 2.6, 160);
    let fit = YoungLaplaceFitEngine::default().fit(&contour).unwrap();
    assert!(fit.bond > 0.0);
    assert_relative_eq!(fit.bond, 0.3, max_relative = 0.01);

    let props = PhysicalProperties::from_fit(&fit, &water_at_100_px_per_mm());
    let expected = 998.0 * STANDARD_GRAVITY * 1e-6 / 0.3;
    assert_relative_eq!(props.interfacial_tension, expected, max_relative = 0.05);
    assert_relative_eq!(props.apex_radius, 1e-3, max_relative = 0.01);
    assert!(props.volume > 0.0 && props.surface_area > 0.0);
}

#[test]
fn pendant_image_end_to_end() {
    init_logger();
    let apex = Point2D::new(200.0, 380.0);
    let img = pendant_image(400, 420, 0.3, 80.0, apex, 3.2, 40.0);
    let params = AnalysisParams {
        calibration: Calibration {
            drop_density: Some(998.0),
            continuous_density: Some(0.0),
            needle_diameter_mm: Some(0.5),
            ..Default::default()
        },
        ..Default::default()
    };
    let analyzer = DropAnalyzer::new(params);
    let analysis = analyzer.pendant_gray(&img, None, None).unwrap();

    let needle = analysis.needle.as_ref().expect("needle walls");
    assert!((needle.width_px - 40.0).abs() <= 3.0, "{needle:?}");
    assert!(analysis.fit.bond > 0.0, "{:?}", analysis.fit.bond);
    assert!((analysis.fit.bond - 0.3).abs() < 0.06, "{:?}", analysis.fit.bond);
    assert_relative_eq!(analysis.fit.radius, 80.0, max_relative = 0.05);
    assert!((analysis.fit.apex.x - apex.x).abs() < 2.0);
    // Needle width calibrates the scale: 0.5 mm over ~40 px.
    assert!(analysis.properties.interfacial_tension.is_finite());
    assert!(analysis.properties.worthington_number > 0.0);
    assert!(analysis.contour.iter().all(|p| p.y > 100.0));
}

#[test]
fn cancelled_pendant_fit_reports_cancellation() {
    init_logger();
    let img = pendant_image(400, 420, 0.3, 80.0, Point2D::new(200.0, 380.0), 3.2, 40.0);
    let token = CancelToken::new();
    token.cancel();
    let analyzer = DropAnalyzer::new(AnalysisParams::default());
    let err = analyzer.pendant_gray(&img, None, Some(&token)).unwrap_err();
    assert_eq!(err, DropError::Cancelled);
}
