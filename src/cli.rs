// ============================================================================
// CropLine CLI — headless crop export via command-line arguments
// ============================================================================
//
// Usage examples:
//   CropLine --input seam.png --line 100,100,1100,100
//   CropLine -i scan.jpg --line 0,0,4000,3000 --pitch 256 --anchor top-left
//   CropLine -i plate.bmp --line 10,10,900,10 --line 10,500,900,500 --out-dir crops/
//
// No GUI is opened. Decoding, planning, and export all run synchronously
// on the current thread through the same planner/exporter code the GUI
// uses.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use egui::pos2;

use crate::controller::{DEFAULT_PITCH, MAX_PITCH};
use crate::exporter;
use crate::guide::{CropAnchor, CropBox, GuideLine};
use crate::planner;
use crate::session::ImageSession;

/// CropLine headless crop exporter.
///
/// Tile fixed-size square crops along guide lines over an image and write
/// them as PNG files — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "CropLine",
    about = "Tile and export square crops along guide lines",
    long_about = "Tile fixed-size square crop regions along one or more guide lines\n\
                  over a raster image and write them to Crops/{timestamp}/ as PNG.\n\n\
                  Example:\n  \
                  CropLine --input seam.png --line 100,100,1100,100 --pitch 512"
)]
pub struct CliArgs {
    /// Input image (png, jpg, bmp).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Guide line as "x1,y1,x2,y2" in full-resolution pixel coordinates.
    /// Repeat for multiple lines; boxes export in line order.
    #[arg(short, long, required = true, value_name = "X1,Y1,X2,Y2")]
    pub line: Vec<String>,

    /// Crop box size and anchor spacing in pixels.
    #[arg(short, long, default_value_t = DEFAULT_PITCH, value_name = "PX")]
    pub pitch: u32,

    /// Anchor policy: center, top-left, top-right, bottom-left, bottom-right.
    #[arg(short, long, default_value = "center", value_name = "POLICY")]
    pub anchor: String,

    /// Export root; crops land in {ROOT}/Crops/{timestamp}/.
    /// Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

impl CliArgs {
    /// CLI mode is triggered by the presence of --input / -i; a plain
    /// launch (or double-click) always gets the GUI.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

pub fn run(args: CliArgs) -> ExitCode {
    if args.pitch == 0 || args.pitch > MAX_PITCH {
        eprintln!("Error: --pitch must be in 1..={}", MAX_PITCH);
        return ExitCode::FAILURE;
    }
    let Some(anchor) = CropAnchor::parse(&args.anchor) else {
        eprintln!("Error: unknown anchor policy '{}'", args.anchor);
        return ExitCode::FAILURE;
    };

    let session = match ImageSession::load(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let (width, height) = session.original_size();

    let mut boxes: Vec<CropBox> = Vec::new();
    for (idx, spec) in args.line.iter().enumerate() {
        let line = match parse_line(spec, args.pitch, anchor) {
            Ok(l) => clamp_line(l, width, height),
            Err(e) => {
                eprintln!("Error in --line '{}': {}", spec, e);
                return ExitCode::FAILURE;
            }
        };
        let planned = planner::plan(&line, width, height, idx);
        println!(
            "line {}: length {:.1}px, {} boxes",
            idx + 1,
            line.length(),
            planned.len()
        );
        boxes.extend(planned);
    }

    let root = args
        .out_dir
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    match exporter::export_crops(&boxes, &session.original, &root) {
        Ok(n) => {
            println!("{} crop file(s) written", n);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Parse "x1,y1,x2,y2" into a guide line. `f32::parse` accepts "nan" and
/// "inf", which would poison every downstream length computation, so
/// non-finite values are rejected here.
fn parse_line(spec: &str, pitch: u32, anchor: CropAnchor) -> Result<GuideLine, String> {
    let parts: Vec<f32> = spec
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("not a number: {}", e))?;
    if parts.len() != 4 {
        return Err(format!("expected 4 comma-separated values, got {}", parts.len()));
    }
    if parts.iter().any(|v| !v.is_finite()) {
        return Err("coordinates must be finite".to_string());
    }
    Ok(GuideLine::new(
        pos2(parts[0], parts[1]),
        pos2(parts[2], parts[3]),
        pitch,
        anchor,
    ))
}

/// Clamp a line's endpoints to the image bounds, the same policy the GUI
/// applies to clicks and endpoint drags.
fn clamp_line(mut line: GuideLine, width: u32, height: u32) -> GuideLine {
    let (w, h) = (width as f32, height as f32);
    line.start.x = line.start.x.clamp(0.0, w);
    line.start.y = line.start.y.clamp(0.0, h);
    line.end.x = line.end.x.clamp(0.0, w);
    line.end.y = line.end.y.clamp(0.0, h);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spec_parses_four_coordinates() {
        let l = parse_line("100, 50,900.5,50", 512, CropAnchor::Center).unwrap();
        assert_eq!(l.start, pos2(100.0, 50.0));
        assert_eq!(l.end, pos2(900.5, 50.0));
        assert_eq!(l.pitch, 512);
    }

    #[test]
    fn malformed_line_specs_are_rejected() {
        assert!(parse_line("1,2,3", 512, CropAnchor::Center).is_err());
        assert!(parse_line("1,2,3,4,5", 512, CropAnchor::Center).is_err());
        assert!(parse_line("a,b,c,d", 512, CropAnchor::Center).is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        assert!(parse_line("nan,0,100,0", 512, CropAnchor::Center).is_err());
        assert!(parse_line("0,0,inf,0", 512, CropAnchor::Center).is_err());
        assert!(parse_line("0,-inf,100,0", 512, CropAnchor::Center).is_err());
        assert!(parse_line("0,NaN,100,0", 512, CropAnchor::Center).is_err());
    }

    #[test]
    fn line_endpoints_clamp_to_the_image_like_gui_clicks() {
        let l = parse_line("-500,10,1e30,2000", 512, CropAnchor::Center).unwrap();
        let l = clamp_line(l, 1000, 800);
        assert_eq!(l.start, pos2(0.0, 10.0));
        assert_eq!(l.end, pos2(1000.0, 800.0));
    }
}
