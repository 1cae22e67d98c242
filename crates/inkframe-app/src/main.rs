//! `inkframe`: inspect, convert and upgrade scene files from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inkframe_core::codec::{self, ExportOptions};
use inkframe_core::shapes::ShapeKind;
use inkframe_core::{EngineConfig, ImportReport, Scene};
use kurbo::Size;
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "inkframe", version, about = "Inspect and convert InkFrame scene files")]
struct Cli {
    /// Engine configuration (JSON); defaults apply to missing keys.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the format version, layer counts and migration gaps of a scene file.
    Info { file: PathBuf },
    /// Decompress a scene file and print its JSON.
    Dump {
        file: PathBuf,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Encode a JSON scene document into a scene file.
    Pack {
        json: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Rewrite a scene file at the current format version.
    Upgrade {
        file: PathBuf,
        /// Defaults to rewriting the input in place.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Keep tombstoned layers.
        #[arg(long)]
        include_deleted: bool,
    },
    /// Compute the canvas that fits all content.
    Fit {
        file: PathBuf,
        /// Scale the content to the configured export width.
        #[arg(long)]
        export: bool,
        /// Host viewport as WIDTHxHEIGHT.
        #[arg(long, value_parser = parse_size)]
        viewport: Option<Size>,
        /// Store the fitted canvas size back into the file.
        #[arg(long)]
        write: bool,
    },
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid dimension {s:?}"))
    };
    Ok(Size::new(parse(w)?, parse(h)?))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Info { file } => {
            let (scene, report) = read_scene(&file, config)?;
            print!("{}", describe(&scene, &report));
        }
        Command::Dump { file, out } => {
            let json = dump(&file)?;
            match out {
                Some(out) => fs::write(&out, json).with_context(|| format!("Failed to write {}", out.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Pack { json, out } => {
            let report = pack(&json, &out, config)?;
            print_gaps(&report);
            println!("Wrote {}", out.display());
        }
        Command::Upgrade {
            file,
            out,
            include_deleted,
        } => {
            let out = out.unwrap_or_else(|| file.clone());
            let report = upgrade(&file, &out, config, include_deleted)?;
            println!(
                "Upgraded {} from version {} to {}",
                file.display(),
                report.source_version,
                codec::CURRENT_VERSION
            );
            print_gaps(&report);
        }
        Command::Fit {
            file,
            export,
            viewport,
            write,
        } => {
            let (mut scene, _) = read_scene(&file, config)?;
            if let Some(size) = viewport {
                scene.reset_dimensions(size);
            }
            let Some(fit) = scene.fit_viewport(export) else {
                bail!("{} has no visible content to fit", file.display());
            };
            println!(
                "Canvas {:.1} x {:.1} (scale {:.3}, content at {:.1}, {:.1})",
                fit.canvas_size.width, fit.canvas_size.height, fit.scale, fit.bounds.x0, fit.bounds.y0
            );
            if write {
                write_scene(&scene, &file, &ExportOptions::default())?;
                println!("Wrote {}", file.display());
            }
        }
    }
    Ok(())
}

fn read_scene(path: &Path, config: EngineConfig) -> Result<(Scene, ImportReport)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let imported =
        codec::import_with_report(&bytes, config).with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok((imported.scene, imported.report))
}

fn write_scene(scene: &Scene, path: &Path, options: &ExportOptions) -> Result<()> {
    let bytes = codec::export_with(scene, options).context("Failed to encode scene")?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn describe(scene: &Scene, report: &ImportReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("format version: {}\n", report.source_version));
    if let Some(exported_at) = &scene.metadata.exported_at {
        out.push_str(&format!("exported at:    {exported_at}\n"));
    }
    if let Some(size) = scene.metadata.canvas_size {
        out.push_str(&format!("canvas:         {} x {}\n", size.width, size.height));
    }
    out.push_str(&format!("layers:         {}\n", scene.len()));
    for kind in ShapeKind::ALL {
        let count = scene.count_kind(kind);
        if count > 0 {
            out.push_str(&format!("  {:<12}{count}\n", kind.as_str()));
        }
    }
    if report.skipped > 0 {
        out.push_str(&format!("skipped:        {}\n", report.skipped));
    }
    for gap in &report.gaps {
        out.push_str(&format!(
            "gap: {} {}: {}\n",
            gap.layer_id.as_deref().unwrap_or("<no id>"),
            gap.field,
            gap.reason
        ));
    }
    out
}

fn print_gaps(report: &ImportReport) {
    for gap in &report.gaps {
        eprintln!(
            "warning: {} {}: {}",
            gap.layer_id.as_deref().unwrap_or("<no id>"),
            gap.field,
            gap.reason
        );
    }
    if report.skipped > 0 {
        eprintln!("warning: skipped {} layers", report.skipped);
    }
}

fn dump(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let json = codec::unpack(&bytes).with_context(|| format!("Failed to decompress {}", path.display()))?;
    let value: Value = serde_json::from_str(&json).context("Scene payload is not JSON")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn pack(json_path: &Path, out: &Path, config: EngineConfig) -> Result<ImportReport> {
    let json = fs::read_to_string(json_path).with_context(|| format!("Failed to read {}", json_path.display()))?;
    let imported = codec::import_json(&json, config).with_context(|| format!("Invalid scene {}", json_path.display()))?;
    write_scene(&imported.scene, out, &ExportOptions::default())?;
    Ok(imported.report)
}

fn upgrade(path: &Path, out: &Path, config: EngineConfig, include_deleted: bool) -> Result<ImportReport> {
    let (scene, report) = read_scene(path, config)?;
    let options = ExportOptions {
        include_deleted,
        exported_at: None,
    };
    write_scene(&scene, out, &options)?;
    log::info!("Upgraded {} ({} layers)", path.display(), scene.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_core::Layer;
    use inkframe_core::geometry::Frame;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600"), Ok(Size::new(800.0, 600.0)));
        assert_eq!(parse_size("1024X768"), Ok(Size::new(1024.0, 768.0)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("ax600").is_err());
    }

    #[test]
    fn test_cli_parses_global_config() {
        let cli = Cli::try_parse_from(["inkframe", "info", "a.sketch", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(cli.command, Command::Info { .. }));
    }

    #[test]
    fn test_pack_dump_and_info() {
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("scene.json");
        let out = dir.path().join("scene.sketch");
        let doc = json!({
            "format_version": 2,
            "layers": [
                { "id": "r1", "type": "rectangle", "x": 0.0, "y": 0.0, "width": 40.0, "height": 20.0 },
                { "id": "e1", "type": "ellipse", "x": 50.0, "y": 0.0, "width": 10.0, "height": 10.0 }
            ]
        });
        fs::write(&json_path, doc.to_string()).unwrap();

        let report = pack(&json_path, &out, EngineConfig::default()).unwrap();
        assert!(report.is_clean());

        let dumped: Value = serde_json::from_str(&dump(&out).unwrap()).unwrap();
        assert_eq!(dumped["format_version"], 2);
        assert_eq!(dumped["layers"][0]["id"], "r1");

        let (scene, report) = read_scene(&out, EngineConfig::default()).unwrap();
        let info = describe(&scene, &report);
        assert!(info.contains("layers:         2"));
        assert!(info.contains("rectangle"));
    }

    #[test]
    fn test_upgrade_v1_file() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.sketch");
        let new = dir.path().join("new.sketch");
        let doc = json!({
            "layers": [
                { "id": "f1", "type": "freedraw", "x": 0.0, "y": 0.0, "points": [{ "x": 0.0, "y": 0.0 }, { "x": 5.0, "y": 5.0 }] }
            ]
        });
        fs::write(&old, codec::pack(&doc.to_string()).unwrap()).unwrap();

        let report = upgrade(&old, &new, EngineConfig::default(), false).unwrap();
        assert_eq!(report.source_version, 1);

        let (scene, report) = read_scene(&new, EngineConfig::default()).unwrap();
        assert_eq!(report.source_version, codec::CURRENT_VERSION);
        assert_eq!(scene.count_kind(ShapeKind::FreehandPath), 1);
    }

    #[test]
    fn test_read_scene_reports_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.sketch");
        fs::write(&path, b"garbage").unwrap();
        let err = read_scene(&path, EngineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to decode"));
    }

    #[test]
    fn test_write_scene_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.sketch");
        let mut scene = Scene::new();
        scene.add(Layer::diamond(Frame::new(0.0, 0.0, 30.0, 30.0)));
        write_scene(&scene, &path, &ExportOptions::default()).unwrap();

        let (loaded, _) = read_scene(&path, EngineConfig::default()).unwrap();
        assert_eq!(loaded.layers(), scene.layers());
    }
}
