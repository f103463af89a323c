use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::unbounded;
use flexi_logger::Logger;
use std::path::PathBuf;
use std::process::ExitCode;

use asset_thumbs::batch_loader::StepOutcome;
use asset_thumbs::config::{Config, SizeInput};
use asset_thumbs::event::{LoadMsg, Thumbnail, progress_label};
use asset_thumbs::model::asset::AssetKind;
use asset_thumbs::panel::Panel;
use asset_thumbs::xcur2png;

#[derive(Parser)]
#[command(version, about = "Thumbnails for wallpaper folders and cursor themes")]
struct Cli {
    #[arg(help = "Log debug output", long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Write every frame of an Xcursor file as PNG plus cursor_info.txt")]
    Extract { input: PathBuf, output_dir: PathBuf },

    #[command(about = "Build or refresh the thumbnails of a directory")]
    Thumbnails {
        directory: PathBuf,

        #[arg(long, value_enum, default_value_t = Kind::Wallpapers)]
        kind: Kind,

        #[arg(help = "Thumbnail size in pixels", long)]
        size: Option<String>,

        #[arg(help = "Rescan the directory", long, default_value_t = false)]
        force: bool,

        #[arg(help = "Config file to use instead of the default one", long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Wallpapers,
    Cursors,
}

impl From<Kind> for AssetKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Wallpapers => AssetKind::Wallpaper,
            Kind::Cursors => AssetKind::CursorTheme,
        }
    }
}

fn run_thumbnails(
    directory: PathBuf,
    kind: Kind,
    size: Option<String>,
    force: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let (tx, rx) = unbounded();
    let mut panel = Panel::new(kind.into(), &config, tx);
    if let Some(size) = size {
        panel.set_target_size(&SizeInput::Text(size));
    }

    panel
        .select_directory(&directory, force)
        .with_context(|| format!("Cannot list {}", directory.display()))?;

    let mut failed = 0;
    loop {
        let outcome = panel.step();
        for msg in rx.try_iter() {
            match msg {
                LoadMsg::Batch { items, .. } => {
                    for item in items {
                        let name = panel
                            .record(item.id)
                            .map(|r| r.display_name.clone())
                            .unwrap_or_default();
                        match item.thumbnail {
                            Thumbnail::Raster(raster) => {
                                println!("{}\t{}x{}", name, raster.width(), raster.height())
                            }
                            Thumbnail::Fallback => println!("{}\tplaceholder", name),
                        }
                    }
                }
                LoadMsg::Progress { percent, .. } => log::info!("{}", progress_label(percent)),
                LoadMsg::ItemFailed { .. } => failed += 1,
                LoadMsg::Started { .. } | LoadMsg::Complete { .. } => {}
            }
        }
        if outcome == StepOutcome::Idle {
            break;
        }
    }

    let stats = panel.cache().stats();
    log::info!(
        "{} from memory, {} from disk, {} generated, {} placeholders",
        stats.memory_hits,
        stats.disk_hits,
        stats.produced,
        failed
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    let logger = match Logger::try_with_env_or_str(level).and_then(|logger| logger.log_to_stderr().start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            None
        }
    };

    let result = match cli.command {
        Commands::Extract { input, output_dir } => {
            xcur2png::extract_cursor(&input, &output_dir).map(|files| {
                log::info!("Extracted {} frame(s) to {}", files.len(), output_dir.display());
            })
        }
        Commands::Thumbnails {
            directory,
            kind,
            size,
            force,
            config,
        } => run_thumbnails(directory, kind, size, force, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if logger.is_some() {
                log::error!("{:#}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
