//! Argument parsing and command dispatch.

use crate::ui;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vaultsync_core::{Direction, Error, SyncSettings};
use vaultsync_sync::{
    SyncExecutor, SyncScheduler, build_rsync_command, interval_from_minutes,
};

#[derive(Parser)]
#[command(name = "vaultsync", version, about = "Two-directional rsync-over-SSH directory sync")]
pub struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full cycle: pull shared paths, then push everything
    Sync,
    /// Pull only the configured pull paths from the remote
    Pull,
    /// Push local changes to the remote
    Push {
        /// Overwrite the remote unconditionally, ignoring pull paths
        #[arg(long)]
        force: bool,
    },
    /// Print the rsync command line that would run, without running it
    ShowCommand {
        #[arg(long, value_enum, default_value_t = DirectionArg::Push)]
        direction: DirectionArg,
    },
    /// Keep syncing on the configured interval until interrupted
    Watch,
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Pull,
    Push,
    ForcedPush,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Pull => Direction::Pull,
            DirectionArg::Push => Direction::Push,
            DirectionArg::ForcedPush => Direction::ForcedPush,
        }
    }
}

impl Cli {
    pub async fn run(self) -> miette::Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => SyncSettings::default_config_path()?,
        };

        match self.command {
            Commands::Init { force } => init_config(&config_path, force),
            Commands::ShowCommand { direction } => {
                let settings = load_settings(&config_path)?;
                let cmd = build_rsync_command(&settings, direction.into());
                println!("{}", cmd.to_command_line());
                Ok(())
            }
            Commands::Sync => {
                let settings = load_settings(&config_path)?;
                run_with_progress(&settings, |exec, settings, progress| async move {
                    exec.execute_sync(&settings, Some(progress)).await
                })
                .await
            }
            Commands::Pull => {
                let settings = load_settings(&config_path)?;
                run_with_progress(&settings, |exec, settings, progress| async move {
                    exec.execute_pull(&settings, Some(progress)).await
                })
                .await
            }
            Commands::Push { force } => {
                let settings = load_settings(&config_path)?;
                run_with_progress(&settings, move |exec, settings, progress| async move {
                    if force {
                        exec.execute_forced_push(&settings, Some(progress)).await
                    } else {
                        exec.execute_push(&settings, Some(progress)).await
                    }
                })
                .await
            }
            Commands::Watch => {
                let settings = load_settings(&config_path)?;
                watch(settings).await
            }
        }
    }
}

fn load_settings(path: &PathBuf) -> miette::Result<SyncSettings> {
    debug!(path = %path.display(), "loading settings");
    let settings = SyncSettings::load(path)?;
    validate(&settings)?;
    Ok(settings)
}

/// Reject settings that would produce an unusable rsync invocation.
fn validate(settings: &SyncSettings) -> Result<(), Error> {
    if settings.remote_host.is_empty() {
        return Err(Error::config("remote_host is not set"));
    }
    if settings.ssh_username.is_empty() {
        return Err(Error::config("ssh_username is not set"));
    }
    if settings.local_dir_path.is_empty() {
        return Err(Error::config("local_dir_path is not set"));
    }
    if settings.remote_dir_path.is_empty() {
        return Err(Error::config("remote_dir_path is not set"));
    }
    Ok(())
}

fn init_config(path: &PathBuf, force: bool) -> miette::Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    SyncSettings::default().save(path)?;
    println!("wrote starter config to {}", path.display());
    Ok(())
}

/// Run one executor operation with progress bars and Ctrl-C wired to
/// cancellation.
async fn run_with_progress<F, Fut>(settings: &SyncSettings, op: F) -> miette::Result<()>
where
    F: FnOnce(Arc<SyncExecutor>, SyncSettings, vaultsync_core::ProgressCallback) -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    let console = ui::Console::new();
    let executor = Arc::new(SyncExecutor::new(console.notifier()));

    let canceller = Arc::clone(&executor);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let result = op(Arc::clone(&executor), settings.clone(), console.progress_callback()).await;
    ctrl_c.abort();
    console.finish();
    Ok(result?)
}

async fn watch(settings: SyncSettings) -> miette::Result<()> {
    let Some(interval) = interval_from_minutes(settings.schedule_interval) else {
        return Err(Error::config(
            "schedule_interval must be a positive number of minutes to use watch",
        )
        .into());
    };

    let executor = Arc::new(SyncExecutor::default());
    let scheduler = SyncScheduler::new(Arc::clone(&executor));
    scheduler.start(settings, interval);
    println!(
        "syncing every {} minute(s); press Ctrl-C to stop",
        interval.as_secs() / 60
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::io(e, None, "wait for Ctrl-C"))?;
    scheduler.stop();
    executor.cancel();
    // give a killed child a moment to be reaped before exiting
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("stopped");
    Ok(())
}
