pub mod cmd;
pub mod config;
pub mod fs;
pub mod git;
pub mod prompt;
pub mod status;
pub mod sync;
pub mod tag;

pub use config::Config;
pub use sync::{synchronize, SyncError, SyncOptions, SyncOutcome};

use std::io;

/// Runs a synchronization against the process console, prompting on
/// stdin and printing on stdout
pub async fn run(config: &Config, options: SyncOptions) -> Result<SyncOutcome, SyncError> {
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    synchronize(config, options, &mut input, &mut output).await
}
