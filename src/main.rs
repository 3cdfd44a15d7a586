//! `newtabtools` command line front end.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use newtabtools::pipeline::{
    AutoConfirm, FilePicker, FixedPath, NativeFilePicker, NativePrompt, Prompt, parent_folder,
};
use newtabtools::{
    ExportReport, ExportSources, HostError, ImportReport, LogErrorSink, Manifest, Pipeline,
    PipelineResult, Profile, ToolConfig, TransferError, TransferOptions,
};

/// Exit code for a run the user cancelled.
const EXIT_CANCELLED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "newtabtools")]
#[command(about = "Export and import New Tab Tools settings archives")]
#[command(version)]
struct Cli {
    /// Browser profile directory (defaults to the configured one)
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Thumbnail cache directory (defaults to <profile>/thumbnails)
    #[arg(long, global = true)]
    thumbnails_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the profile's settings to an archive
    Export {
        /// Archive to write (asks with a file dialog when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the confirmation dialog
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        selection: Selection,
    },

    /// Apply an archive to the profile
    Import {
        /// Archive to read (asks with a file dialog when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Skip the confirmation dialog
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        selection: Selection,
    },

    /// Show what an archive contains
    Inspect {
        /// Archive to read
        file: PathBuf,
    },
}

/// Categories left out of a transfer.
#[derive(Args, Debug)]
struct Selection {
    /// Leave out per-page titles
    #[arg(long)]
    no_annotations: bool,

    /// Leave out preferences
    #[arg(long)]
    no_prefs: bool,

    /// Leave out thumbnails
    #[arg(long)]
    no_thumbnails: bool,

    /// Leave out the background image
    #[arg(long)]
    no_background: bool,
}

impl Selection {
    fn options(&self) -> TransferOptions {
        TransferOptions {
            annotations: !self.no_annotations,
            preferences: !self.no_prefs,
            thumbnails: !self.no_thumbnails,
            background: !self.no_background,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Host(#[from] HostError),

    #[error("{0}")]
    Transfer(#[from] TransferError),

    #[error("No browser profile selected; pass --profile or set profile_dir in {config}")]
    NoProfile { config: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = ToolConfig::load_from_default_path();

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(cli, &mut config) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &mut ToolConfig) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Inspect { file } => {
            let manifest = Manifest::inspect(&file)?;
            println!("{}", file.display());
            println!("{}", manifest.summary());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Export {
            output,
            yes,
            selection,
        } => {
            let profile = open_profile(cli.profile, cli.thumbnails_dir, config)?;
            let options = selection.options();
            let result = if yes {
                export(&AutoConfirm::new(options), output, &profile, config)
            } else {
                export(&NativePrompt::new(options), output, &profile, config)
            };
            Ok(finish_export(result, config))
        }
        Commands::Import {
            input,
            yes,
            selection,
        } => {
            let mut profile = open_profile(cli.profile, cli.thumbnails_dir, config)?;
            let options = selection.options();
            let result = if yes {
                import(&AutoConfirm::new(options), input, &mut profile, config)
            } else {
                import(&NativePrompt::new(options), input, &mut profile, config)
            };
            // Preferences applied before a failure are kept, like annotations.
            profile.save()?;
            Ok(finish_import(result, config))
        }
    }
}

/// Resolve the profile from the command line, the config file or a folder dialog.
fn open_profile(
    profile: Option<PathBuf>,
    thumbnails_dir: Option<PathBuf>,
    config: &mut ToolConfig,
) -> Result<Profile, CliError> {
    let dir = match profile.or_else(|| config.preferences.profile_dir.clone()) {
        Some(dir) => dir,
        None => {
            let picked = pollster::block_on(
                NativeFilePicker.pick_folder("Select browser profile", dirs::home_dir().as_deref()),
            );
            let Some(dir) = picked else {
                return Err(CliError::NoProfile {
                    config: ToolConfig::default_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ToolConfig::default_filename().to_string()),
                });
            };
            config.preferences.profile_dir = Some(dir.clone());
            dir
        }
    };
    let thumbnails = thumbnails_dir.unwrap_or_else(|| config.thumbnails_dir_for(&dir));
    Ok(Profile::open(&dir, thumbnails)?)
}

fn export<P: Prompt>(
    prompt: &P,
    output: Option<PathBuf>,
    profile: &Profile,
    config: &ToolConfig,
) -> PipelineResult<ExportReport> {
    let links = profile.links(&config.transfer);
    let sources = profile.sources(&links);
    let start_dir = config.preferences.export_folder.clone();
    match output {
        Some(path) => {
            let picker = FixedPath(path);
            run_export(prompt, &picker, config, start_dir, &sources)
        }
        None => run_export(prompt, &NativeFilePicker, config, start_dir, &sources),
    }
}

fn run_export<P: Prompt, F: FilePicker>(
    prompt: &P,
    picker: &F,
    config: &ToolConfig,
    start_dir: Option<PathBuf>,
    sources: &ExportSources<'_>,
) -> PipelineResult<ExportReport> {
    let pipeline =
        Pipeline::new(prompt, picker, &config.transfer, &LogErrorSink).with_start_dir(start_dir);
    pollster::block_on(pipeline.export(sources))
}

fn import<P: Prompt>(
    prompt: &P,
    input: Option<PathBuf>,
    profile: &mut Profile,
    config: &ToolConfig,
) -> PipelineResult<ImportReport> {
    let start_dir = config.preferences.import_folder.clone();
    let mut targets = profile.targets();
    match input {
        Some(path) => {
            let picker = FixedPath(path);
            let pipeline = Pipeline::new(prompt, &picker, &config.transfer, &LogErrorSink)
                .with_start_dir(start_dir);
            pollster::block_on(pipeline.import(&mut targets))
        }
        None => {
            let pipeline = Pipeline::new(prompt, &NativeFilePicker, &config.transfer, &LogErrorSink)
                .with_start_dir(start_dir);
            pollster::block_on(pipeline.import(&mut targets))
        }
    }
}

fn finish_export(result: PipelineResult<ExportReport>, config: &mut ToolConfig) -> ExitCode {
    match result {
        PipelineResult::Done(report) => {
            println!("Exported to {}", report.destination.display());
            println!(
                "Annotations: {}\nPreferences: {}\nThumbnails: {}\nBackground image: {}",
                report.annotations_exported,
                report.preferences_exported,
                report.thumbnails_exported,
                yes_no(report.background_exported)
            );
            for warning in &report.warnings {
                println!("Skipped {}: {}", warning.item, warning.message);
            }
            config.preferences.export_folder = parent_folder(&report.destination);
            remember(config);
            ExitCode::SUCCESS
        }
        PipelineResult::Cancelled(stage) => {
            println!("Export cancelled at {}", stage.name());
            ExitCode::from(EXIT_CANCELLED)
        }
        PipelineResult::Failed(e) => {
            eprintln!("Export failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn finish_import(result: PipelineResult<ImportReport>, config: &mut ToolConfig) -> ExitCode {
    match result {
        PipelineResult::Done(report) => {
            println!("Imported from {}", report.source.display());
            println!(
                "Annotations: {}\nPreferences: {}\nThumbnails: {}\nBackground image: {}",
                report.annotations_applied,
                report.preferences_applied,
                report.thumbnails_restored,
                yes_no(report.background_restored)
            );
            for warning in &report.warnings {
                println!("Skipped {}: {}", warning.item, warning.message);
            }
            config.preferences.import_folder = parent_folder(&report.source);
            remember(config);
            if report.has_failures() {
                eprintln!("{} items could not be applied", report.failures);
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        PipelineResult::Cancelled(stage) => {
            println!("Import cancelled at {}", stage.name());
            ExitCode::from(EXIT_CANCELLED)
        }
        PipelineResult::Failed(e) => {
            eprintln!("Import failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Persist the remembered folders, logging any failure.
fn remember(config: &ToolConfig) {
    if let Err(e) = config.save_to_default_path() {
        log::warn!("Could not save configuration: {}", e);
    }
}
