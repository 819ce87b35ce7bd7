use drop_shape::config::{self, RuntimeConfig};
use drop_shape::contour::render_points;
use drop_shape::fit::FitResult;
use drop_shape::image::io::{load_gray_image, save_gray_image, write_json_file};
use drop_shape::pipeline::{analyze_sequence, AnalysisMode, ContactAngleAnalysis, FrameAnalysis};
use drop_shape::DropAnalyzer;
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| "usage: contact_angle_demo <config.json>".to_string())?;
    let config = config::load_config(&config_path)?;
    if config.mode != AnalysisMode::ContactAngle {
        return Err(format!(
            "{} selects {:?} mode; use pendant_demo",
            config_path.display(),
            config.mode
        ));
    }

    let frames = config
        .inputs
        .iter()
        .map(|p| load_gray_image(p))
        .collect::<Result<Vec<_>, _>>()?;
    let analyzer = DropAnalyzer::new(config.analysis_params());
    let results = analyze_sequence(&analyzer, &frames, AnalysisMode::ContactAngle);

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in config.inputs.iter().zip(&results) {
        match result {
            Ok(FrameAnalysis::ContactAngle(analysis)) => {
                println!("{}", path.display());
                println!(
                    "  regime {:?}, contact points ({:.1}, {:.1}) / ({:.1}, {:.1})",
                    analysis.contact_points.regime,
                    analysis.contact_points.left.position.x,
                    analysis.contact_points.left.position.y,
                    analysis.contact_points.right.position.x,
                    analysis.contact_points.right.position.y,
                );
                for fit in &analysis.fits {
                    print_fit(fit);
                }
                if let Some(p) = analysis.predicted {
                    println!("  model       {:>7.2} {:>7.2}", p.left_angle, p.right_angle);
                }
                println!("  {:.2} ms", analysis.trace.timings.total_ms);
                if let Some(dir) = &config.output.debug_dir {
                    save_overlay(dir, path, analysis)?;
                }
            }
            Ok(FrameAnalysis::Pendant(_)) => {}
            Err(err) => println!("{}: no usable droplet ({err})", path.display()),
        }
        reports.push(result.as_ref().ok());
    }
    write_report(&config, &reports)
}

fn print_fit(fit: &FitResult) {
    let name = format!("{:?}", fit.kind()).to_lowercase();
    println!("  {name:<11} {:>7.2} {:>7.2}", fit.left_angle, fit.right_angle);
}

fn save_overlay(
    dir: &Path,
    input: &Path,
    analysis: &ContactAngleAnalysis,
) -> Result<(), String> {
    let Some(region) = &analysis.trace.region else {
        return Ok(());
    };
    let w = (region.bounds.width().ceil() as u32).max(1) + 1;
    let h = (region.bounds.height().ceil() as u32).max(1) + 1;
    let mut points = analysis.contour.points.clone();
    points.push(analysis.contact_points.left.position);
    points.push(analysis.contact_points.right.position);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let overlay = render_points(&points, w, h, 0, 255);
    save_gray_image(&overlay, &dir.join(format!("{stem}_contour.png")))
}

fn write_report(config: &RuntimeConfig, reports: &[Option<&FrameAnalysis>]) -> Result<(), String> {
    if let Some(path) = &config.output.json_out {
        write_json_file(path, &reports)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}
