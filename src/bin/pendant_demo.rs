use drop_shape::config;
use drop_shape::image::io::{load_gray_image, write_json_file};
use drop_shape::pipeline::{AnalysisMode, PendantAnalysis};
use drop_shape::DropAnalyzer;
use std::env;
use std::path::PathBuf;

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
        .ok_or_else(|| "usage: pendant_demo <config.json>".to_string())?;
    let config = config::load_config(&config_path)?;
    if config.mode != AnalysisMode::Pendant {
        return Err(format!(
            "{} selects {:?} mode; use contact_angle_demo",
            config_path.display(),
            config.mode
        ));
    }
    let analyzer = DropAnalyzer::new(config.analysis_params());
    let params = analyzer.params();

    let mut reports: Vec<Option<PendantAnalysis>> = Vec::with_capacity(config.inputs.len());
    let mut threshold = params.threshold;
    for path in &config.inputs {
        let gray = load_gray_image(path)?;
        match analyzer.pendant_gray(&gray, threshold, None) {
            Ok(analysis) => {
                if params.reuse_threshold && threshold.is_none() {
                    threshold = analysis.trace.threshold;
                }
                print_summary(&path.display().to_string(), &analysis);
                reports.push(Some(analysis));
            }
            Err(err) => {
                println!("{}: fit failed for this frame ({err})", path.display());
                reports.push(None);
            }
        }
    }

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &reports)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(name: &str, a: &PendantAnalysis) {
    println!("{name}");
    println!(
        "  Bo {:.4}  R0 {:.2} px  rotation {:.2} deg  rms {:.3} px  ({} iterations)",
        a.fit.bond,
        a.fit.radius,
        a.fit.rotation.to_degrees(),
        a.fit.rms_residual(),
        a.fit.iterations
    );
    if let Some(n) = &a.needle {
        println!("  needle {:.1} px", n.width_px);
    }
    let p = &a.properties;
    println!(
        "  IFT {:.2} mN/m  volume {:.3} uL  area {:.3} mm2  Wo {:.3}",
        p.interfacial_tension * 1e3,
        p.volume * 1e9,
        p.surface_area * 1e6,
        p.worthington_number
    );
    println!("  {:.2} ms", a.trace.timings.total_ms);
}
