#![deny(unsafe_code)]
//! CLI binary for the colorsync engine.
//!
//! Subcommands:
//! - `convert <value>` — convert a color between representations
//! - `group <file>` — bucket scanned document colors by near-equality

mod error;

use clap::{Parser, Subcommand, ValueEnum};
use colorsync_core::color::{
    hsv_to_srgb, lab_to_srgb, linear_to_srgb, srgb_to_hsv, srgb_to_lab, srgb_to_linear,
};
use colorsync_core::{group_by_color, ColorGroup, Hsv, Lab, LinearRgb, ScanEntry, Srgb, SyncConfig};
use error::CliError;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "colorsync", about = "Color conversion and grouping CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a color between representations.
    Convert {
        /// The color: "#RRGGBB" for hex, comma-separated components
        /// otherwise (e.g. "53.2,80.1,67.2" for lab).
        value: String,

        /// Input representation.
        #[arg(long, value_enum, default_value_t = Format::Hex)]
        from: Format,

        /// Output representation; omit to print all of them.
        #[arg(long, value_enum)]
        to: Option<Format>,
    },
    /// Group scan entries (a JSON array of entries) by near-equal color.
    Group {
        /// Path to the scan JSON file.
        file: PathBuf,

        /// Per-channel grouping tolerance on linear values (exclusive).
        /// Defaults to the config's group tolerance.
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// Path to a JSON engine config; values are validated on load.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// #RRGGBB text.
    Hex,
    /// Normalized display floats, 3 components in [0, 1].
    Rgb,
    /// 8-bit bytes, 3 components in [0, 255].
    Rgb8,
    /// Hue in degrees, saturation and value in percent.
    Hsv,
    /// ICC LAB: L in [0, 100], a/b in [-128, 127].
    Lab,
    /// Linear-light RGB, 3 components in [0, 1].
    Linear,
}

fn parse_components(value: &str, arity: usize) -> Result<Vec<f64>, CliError> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| CliError::Input(format!("not a number: {:?}", p.trim())))
        })
        .collect::<Result<_, _>>()?;
    if parts.len() != arity {
        return Err(CliError::Input(format!(
            "expected {arity} comma-separated components, got {}",
            parts.len()
        )));
    }
    Ok(parts)
}

/// Decodes a CLI value into the normalized display color.
fn decode(format: Format, value: &str) -> Result<Srgb, CliError> {
    match format {
        Format::Hex => Ok(Srgb::from_hex(value)?),
        Format::Rgb => {
            let c = parse_components(value, 3)?;
            Ok(Srgb {
                r: c[0],
                g: c[1],
                b: c[2],
            }
            .clamped())
        }
        Format::Rgb8 => {
            let c = parse_components(value, 3)?;
            let byte = |v: f64| -> Result<u8, CliError> {
                if !(0.0..=255.0).contains(&v) || v.fract() != 0.0 {
                    return Err(CliError::Input(format!("not a byte value: {v}")));
                }
                Ok(v as u8)
            };
            Ok(Srgb::from_bytes([byte(c[0])?, byte(c[1])?, byte(c[2])?]))
        }
        Format::Hsv => {
            let c = parse_components(value, 3)?;
            Ok(hsv_to_srgb(Hsv {
                h: (c[0] / 360.0).rem_euclid(1.0),
                s: (c[1] / 100.0).clamp(0.0, 1.0),
                v: (c[2] / 100.0).clamp(0.0, 1.0),
            }))
        }
        Format::Lab => {
            let c = parse_components(value, 3)?;
            Ok(lab_to_srgb(Lab {
                l: c[0].clamp(0.0, 100.0),
                a: c[1].clamp(-128.0, 127.0),
                b: c[2].clamp(-128.0, 127.0),
            }))
        }
        Format::Linear => {
            let c = parse_components(value, 3)?;
            Ok(linear_to_srgb(
                LinearRgb {
                    r: c[0],
                    g: c[1],
                    b: c[2],
                }
                .clamped(),
            ))
        }
    }
}

fn render(format: Format, display: Srgb) -> String {
    match format {
        Format::Hex => display.to_hex(),
        Format::Rgb => format!("{:.6},{:.6},{:.6}", display.r, display.g, display.b),
        Format::Rgb8 => {
            let [r, g, b] = display.to_bytes();
            format!("{r},{g},{b}")
        }
        Format::Hsv => {
            let hsv = srgb_to_hsv(display);
            format!(
                "{:.2},{:.2},{:.2}",
                hsv.h * 360.0,
                hsv.s * 100.0,
                hsv.v * 100.0
            )
        }
        Format::Lab => {
            let lab = srgb_to_lab(display);
            format!("{:.3},{:.3},{:.3}", lab.l, lab.a, lab.b)
        }
        Format::Linear => {
            let lin = srgb_to_linear(display);
            format!("{:.6},{:.6},{:.6}", lin.r, lin.g, lin.b)
        }
    }
}

fn convert_json(display: Srgb) -> serde_json::Value {
    let [r8, g8, b8] = display.to_bytes();
    let hsv = srgb_to_hsv(display);
    let lab = srgb_to_lab(display);
    let lin = srgb_to_linear(display);
    serde_json::json!({
        "hex": display.to_hex(),
        "rgb": [display.r, display.g, display.b],
        "rgb8": [r8, g8, b8],
        "hsv": [hsv.h * 360.0, hsv.s * 100.0, hsv.v * 100.0],
        "lab": [lab.l, lab.a, lab.b],
        "linear": [lin.r, lin.g, lin.b],
    })
}

/// Parses and validates an engine config; the only way a config enters.
fn parse_config(text: &str) -> Result<SyncConfig, CliError> {
    let config: SyncConfig = serde_json::from_str(text)
        .map_err(|e| CliError::Input(format!("invalid config file: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Renders the human-readable group report as one stdout document.
fn group_report(entry_count: usize, groups: &[ColorGroup]) -> String {
    let mut out = format!("{entry_count} entries, {} groups\n", groups.len());
    for group in groups {
        out.push_str(&format!("{} ({} members)\n", group.hex, group.members.len()));
        for member in &group.members {
            out.push_str(&format!(
                "  {} {}:{}\n",
                member.label, member.target, member.path
            ));
        }
    }
    out
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Convert { value, from, to } => {
            let display = decode(from, &value)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&convert_json(display))?);
            } else if let Some(to) = to {
                println!("{}", render(to, display));
            } else {
                for format in [
                    Format::Hex,
                    Format::Rgb,
                    Format::Rgb8,
                    Format::Hsv,
                    Format::Lab,
                    Format::Linear,
                ] {
                    println!("{:<7} {}", format!("{format:?}").to_lowercase(), render(format, display));
                }
            }
        }
        Command::Group {
            file,
            tolerance,
            config,
        } => {
            let config = match config {
                Some(path) => parse_config(&std::fs::read_to_string(&path)?)?,
                None => SyncConfig::default(),
            };
            let tolerance = tolerance.unwrap_or(config.group_tolerance);
            if !(tolerance > 0.0) {
                return Err(CliError::Input(format!(
                    "tolerance must be positive, got {tolerance}"
                )));
            }
            let text = std::fs::read_to_string(&file)?;
            let entries: Vec<ScanEntry> = serde_json::from_str(&text)
                .map_err(|e| CliError::Input(format!("invalid scan file: {e}")))?;
            let groups = group_by_color(&entries, tolerance);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                print!("{}", group_report(entries.len(), &groups));
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "colorsync=warn".into()))
        .with(fmt::layer().without_time())
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_decodes_to_display_floats() {
        let display = decode(Format::Hex, "#FF0000").unwrap();
        assert_eq!(display, Srgb { r: 1.0, g: 0.0, b: 0.0 });
    }

    #[test]
    fn malformed_hex_is_a_core_error() {
        let err = decode(Format::Hex, "FF0000").unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn multi_byte_hex_is_an_error_not_a_panic() {
        let err = decode(Format::Hex, "#\u{20AC}\u{20AC}").unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn rgb8_rejects_out_of_range_and_fractional_values() {
        assert!(decode(Format::Rgb8, "0,0,256").is_err());
        assert!(decode(Format::Rgb8, "0,0,1.5").is_err());
        assert!(decode(Format::Rgb8, "255,128,0").is_ok());
    }

    #[test]
    fn wrong_arity_is_an_input_error() {
        let err = decode(Format::Rgb, "0.5,0.5").unwrap_err();
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn hsv_input_uses_display_units() {
        let display = decode(Format::Hsv, "240,100,100").unwrap();
        assert_eq!(render(Format::Hex, display), "#0000FF");
    }

    #[test]
    fn render_rgb8_matches_hex() {
        let display = decode(Format::Hex, "#FF8000").unwrap();
        assert_eq!(render(Format::Rgb8, display), "255,128,0");
    }

    #[test]
    fn lab_round_trips_through_display_within_tolerance() {
        let display = decode(Format::Lab, "50,20,-30").unwrap();
        let rendered = render(Format::Lab, display);
        let parts: Vec<f64> = rendered.split(',').map(|p| p.parse().unwrap()).collect();
        assert!((parts[0] - 50.0).abs() < 0.5, "L: {}", parts[0]);
        assert!((parts[1] - 20.0).abs() < 0.5, "a: {}", parts[1]);
        assert!((parts[2] + 30.0).abs() < 0.5, "b: {}", parts[2]);
    }

    #[test]
    fn config_with_invalid_values_is_rejected_on_load() {
        let err = parse_config(r#"{"group_tolerance": -1.0}"#).unwrap_err();
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("group_tolerance"));
    }

    #[test]
    fn malformed_config_json_is_an_input_error() {
        let err = parse_config("{nope").unwrap_err();
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn partial_config_supplies_defaults_for_missing_fields() {
        let config = parse_config(r#"{"group_tolerance": 0.05}"#).unwrap();
        assert!((config.group_tolerance - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn group_report_is_a_single_document_with_summary_first() {
        let entries = vec![
            ScanEntry {
                label: "fill a".into(),
                target: "layer1".into(),
                path: "fill.color".into(),
                space: colorsync_core::ColorSpaceTag::Linear,
                color: LinearRgb {
                    r: 1.0,
                    g: 0.0,
                    b: 0.0,
                },
            },
            ScanEntry {
                label: "fill b".into(),
                target: "layer2".into(),
                path: "fill.color".into(),
                space: colorsync_core::ColorSpaceTag::Linear,
                color: LinearRgb {
                    r: 1.0,
                    g: 0.0,
                    b: 0.0,
                },
            },
        ];
        let groups = group_by_color(&entries, 1e-3);
        let report = group_report(entries.len(), &groups);
        assert!(report.starts_with("2 entries, 1 groups\n"), "{report}");
        assert!(report.contains("#FF0000 (2 members)\n"), "{report}");
        assert!(report.contains("  fill a layer1:fill.color\n"), "{report}");
    }

    #[test]
    fn convert_json_reports_every_representation() {
        let value = convert_json(decode(Format::Hex, "#0000FF").unwrap());
        assert_eq!(value["hex"], "#0000FF");
        assert_eq!(value["rgb8"][2], 255);
        let h = value["hsv"][0].as_f64().unwrap();
        assert!((h - 240.0).abs() < 1e-6);
    }
}
