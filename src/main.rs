use clap::Parser;
use env_logger::Env;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use widget_sync::config::{Config, ConfigResult};
use widget_sync::status::StatusFormat;
use widget_sync::{SyncOptions, SyncOutcome};

/// Publishes the widgets tree into another git repository and commits
/// it tagged with the widgets commit
#[derive(Parser, Debug)]
#[command(name = "widget-sync", author, version, about, long_about = None)]
struct Cli {
    /// JSON config file. Takes precedence over --preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built in layout to use (website or fluxtream)
    #[arg(short, long, default_value = "website")]
    preset: String,

    /// Widgets repository to publish from
    #[arg(long)]
    widgets_repo: Option<PathBuf>,

    /// Repository receiving the widgets
    #[arg(long)]
    destination_repo: Option<PathBuf>,

    /// Command printing the widgets commit tag
    #[arg(long)]
    tag_command: Option<String>,

    /// Continue without asking when git status is ambiguous
    #[arg(short = 'y', long)]
    yes: bool,

    /// Check both repositories and report what would change
    #[arg(long)]
    dry_run: bool,

    /// Classify the human readable `git status` instead of --porcelain
    #[arg(long)]
    text_status: bool,
}

impl Cli {
    fn build_config(&self) -> ConfigResult<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::from_preset(&self.preset)?,
        };
        config.apply_env();

        if let Some(path) = &self.widgets_repo {
            config.widgets_repo = path.clone();
        }
        if let Some(path) = &self.destination_repo {
            config.destination_repo = path.clone();
        }
        if let Some(command) = &self.tag_command {
            config.tag_command = Some(command.clone());
        }
        if self.text_status {
            config.status_format = StatusFormat::Text;
        }
        Ok(config)
    }
}

const EXIT_ERROR: u8 = 1;
const EXIT_ABORTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let config = match cli.build_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = SyncOptions {
        assume_yes: cli.yes,
        dry_run: cli.dry_run,
    };

    match widget_sync::run(&config, options).await {
        Ok(SyncOutcome::Aborted) => ExitCode::from(EXIT_ABORTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
