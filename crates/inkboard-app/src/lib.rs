//! Inkboard Application
//!
//! Headless shell around the engine: loads configuration and the persisted
//! stroke log, replays it, and exports or reports on the result.

mod cli;
mod session;

pub use cli::{CliArgs, Command};
pub use session::{ExportKind, Session};

use inkboard_core::{
    BoardConfig, BoardError, ConfigError, FileStorage, ShortcutRegistry, Storage, StorageError, SurfaceError,
};
use inkboard_render::RenderError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Board error: {0}")]
    Board(#[from] BoardError),
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(PathBuf),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Build the effective configuration from the arguments.
pub fn load_config(args: &CliArgs) -> AppResult<BoardConfig> {
    let mut config = match &args.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    if let Some(font) = &args.font {
        config.font_path = Some(font.clone());
    }
    Ok(config.validate()?)
}

fn open_storage(args: &CliArgs) -> AppResult<Arc<dyn Storage>> {
    let storage = match &args.storage_dir {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Stroke log directory: {}", storage.base_path().display());
    Ok(Arc::new(storage))
}

/// Run one command.
pub fn run(args: CliArgs) -> AppResult<()> {
    match &args.command {
        Command::Shortcuts => {
            ShortcutRegistry::print_all();
        }
        Command::Clear => {
            let config = load_config(&args)?;
            open_storage(&args)?.remove(&config.storage_key)?;
            log::info!("Removed stroke log '{}'", config.storage_key);
        }
        Command::SvgInfo { json } => {
            let config = load_config(&args)?;
            let session = Session::open(config, open_storage(&args)?, args.seed)?;
            let info = session.svg_size_info();
            if *json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!(
                    "SVG size: {} / {} chars ({}%)\n{}",
                    info.size, info.max_size, info.percentage, info.recommendation
                );
            }
        }
        Command::Export { output } => {
            let config = load_config(&args)?;
            let mut session = Session::open(config, open_storage(&args)?, args.seed)?;
            let kind = session.export(output)?;
            if kind == ExportKind::Svg {
                let info = session.svg_size_info();
                if info.is_too_large || info.is_large {
                    log::warn!("SVG is {}% of the minting limit: {}", info.percentage, info.recommendation);
                }
            }
            println!("{}", output.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_export() {
        let args = CliArgs::parse_from(["inkboard", "--seed", "4", "export", "out.png"]);
        assert_eq!(args.seed, Some(4));
        assert!(matches!(args.command, Command::Export { ref output } if output == &PathBuf::from("out.png")));
    }

    #[test]
    fn test_config_from_file_and_font_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, r#"{"width": 320, "height": 200, "pixel_size": 99}"#).unwrap();

        let args = CliArgs::parse_from([
            "inkboard",
            "--config",
            path.to_str().unwrap(),
            "--font",
            "/tmp/font.ttf",
            "shortcuts",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!((config.width, config.height), (320, 200));
        assert_eq!(config.pixel_size, 50);
        assert_eq!(config.font_path, Some(PathBuf::from("/tmp/font.ttf")));
    }

    #[test]
    fn test_export_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("store");
        let out = dir.path().join("board.svg");
        let base = ["inkboard", "--storage-dir", storage.to_str().unwrap()];

        let export: Vec<&str> = base.iter().copied().chain(["export", out.to_str().unwrap()]).collect();
        run(CliArgs::parse_from(export)).unwrap();
        assert!(std::fs::read_to_string(&out).unwrap().starts_with("<svg"));

        let fs = FileStorage::new(storage.clone()).unwrap();
        assert!(fs.contains("whiteboardActions").unwrap());

        let clear: Vec<&str> = base.iter().copied().chain(["clear"]).collect();
        run(CliArgs::parse_from(clear)).unwrap();
        assert!(!fs.contains("whiteboardActions").unwrap());
    }
}
