//! tsctl
//!
//! Control and inspection tool for TotalSpaces.

use std::future::Future;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use serde::Serialize;
use totalspaces::{
    EventReceiver, NativeApi, SpaceCounts, SpaceEvent, TotalSpaces, DEFAULT_CHANNEL_BUFFER,
};
use totalspaces_config::{Config, SpaceConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "tsctl")]
#[command(about = "Control TotalSpaces from the command line")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Skip the API version check against the running TotalSpaces
    #[arg(long)]
    no_version_check: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show library, API and TotalSpaces versions
    Version,

    /// Show the current space, space counts and grid size
    Info {
        #[arg(long)]
        json: bool,
    },

    /// Show the current space number and name
    Current,

    /// Show the name of a space
    Name { space: u32 },

    /// Set the name of a space
    Rename { space: u32, name: String },

    /// Switch to a space
    Goto { space: u32 },

    /// List windows grouped by space
    Windows {
        #[arg(long)]
        json: bool,
    },

    /// Move a window to another space
    MoveWindow { window_id: u32, space: u32 },

    /// Print space and layout changes until interrupted
    Watch,

    /// Apply the space names from the configuration file
    Apply,

    /// Write the current space names as a configuration file
    Export {
        /// Output path (defaults to the configuration file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path = totalspaces_config::expand_path(&cli.config);

    if let Commands::Validate = cli.command {
        init_tracing("warn");
        return cmd_validate(&config_path);
    }

    let config = load_config(&config_path)?;
    init_tracing(config.global.log_level.as_filter());

    let version_check = config.global.version_check && !cli.no_version_check;
    run_connected(cli.command, &config, &config_path, version_check)
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Load the configuration, falling back to defaults when the file is absent
fn load_config(path: &Path) -> miette::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Ok(totalspaces_config::parse_config(path)?)
}

#[cfg(target_os = "macos")]
fn run_connected(
    command: Commands,
    config: &Config,
    config_path: &Path,
    version_check: bool,
) -> miette::Result<()> {
    use totalspaces::LinkedApi;

    let client = match (&config.global.expected_api_version, version_check) {
        (_, false) => TotalSpaces::new_unchecked(LinkedApi),
        (Some(expected), true) => {
            TotalSpaces::with_expected_api_version(LinkedApi, expected).into_diagnostic()?
        }
        (None, true) => TotalSpaces::new(LinkedApi).into_diagnostic()?,
    };

    run(&client, command, config, config_path)
}

#[cfg(not(target_os = "macos"))]
fn run_connected(
    _command: Commands,
    _config: &Config,
    _config_path: &Path,
    _version_check: bool,
) -> miette::Result<()> {
    Err(miette::miette!(
        help = "validate still works on this platform",
        "TotalSpaces is only available on macOS"
    ))
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn run<A: NativeApi>(
    client: &TotalSpaces<A>,
    command: Commands,
    config: &Config,
    config_path: &Path,
) -> miette::Result<()> {
    match command {
        Commands::Version => cmd_version(client),
        Commands::Info { json } => cmd_info(client, json),
        Commands::Current => {
            let space = client.current_space();
            println!("{}\t{}", space, client.space_name(space));
            Ok(())
        }
        Commands::Name { space } => {
            println!("{}", client.space_name(space));
            Ok(())
        }
        Commands::Rename { space, name } => {
            let renamed = client.set_space_name(space, &name).into_diagnostic()?;
            ensure(renamed, || format!("Could not rename space {}", space))
        }
        Commands::Goto { space } => ensure(client.move_to_space(space), || {
            format!("Could not switch to space {}", space)
        }),
        Commands::Windows { json } => cmd_windows(client, json),
        Commands::MoveWindow { window_id, space } => {
            ensure(client.move_window_to_space(window_id, space), || {
                format!("Could not move window {} to space {}", window_id, space)
            })
        }
        Commands::Watch => cmd_watch(client),
        Commands::Apply => cmd_apply(client, config),
        Commands::Export { output } => {
            let output = output.unwrap_or_else(|| config_path.to_path_buf());
            cmd_export(client, config, &output)
        }
        Commands::Validate => cmd_validate(config_path),
    }
}

/// Turn a `false` from the native side into an error
fn ensure(ok: bool, message: impl FnOnce() -> String) -> miette::Result<()> {
    if ok {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "check the space number with `tsctl info`",
            "{}",
            message()
        ))
    }
}

fn cmd_version<A: NativeApi>(client: &TotalSpaces<A>) -> miette::Result<()> {
    let versions = client.versions();
    println!("Library:     {}", versions.library);
    println!("API:         {}", versions.api);
    println!("TotalSpaces: {}", versions.service);
    Ok(())
}

#[derive(Serialize)]
struct Info {
    current_space: u32,
    current_space_name: String,
    #[serde(flatten)]
    counts: SpaceCounts,
    rows: u32,
    columns: u32,
}

fn cmd_info<A: NativeApi>(client: &TotalSpaces<A>, json: bool) -> miette::Result<()> {
    let current_space = client.current_space();
    let grid = client.grid();
    let info = Info {
        current_space,
        current_space_name: client.space_name(current_space),
        counts: client.space_counts(),
        rows: grid.rows,
        columns: grid.columns,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);
        return Ok(());
    }

    println!("Current space: {} ({})", info.current_space, info.current_space_name);
    println!("Spaces:        {}", info.counts.spaces);
    println!("Desktops:      {}", info.counts.desktops);
    println!(
        "Fullscreens:   {} ({} in grid)",
        info.counts.fullscreens, info.counts.fullscreens_in_grid
    );
    println!("Dashboard:     {}", if info.counts.dashboard_is_space { "space" } else { "overlay" });
    println!("Grid:          {} x {}", info.rows, info.columns);
    Ok(())
}

fn cmd_windows<A: NativeApi>(client: &TotalSpaces<A>, json: bool) -> miette::Result<()> {
    let topology = client.window_list();

    if json {
        println!("{}", serde_json::to_string_pretty(&topology).into_diagnostic()?);
        return Ok(());
    }

    for space in &topology {
        println!("Space {}: {}", space.space_number, client.space_name(space.space_number));
        if space.windows.is_empty() {
            println!("  (no windows)");
        }
        for window in &space.windows {
            println!(
                "  {:>8}  {} - {}{}",
                window.window_id,
                window.app_name,
                window.title,
                if window.is_on_all_spaces { " [all spaces]" } else { "" }
            );
            println!("            {}", window.frame);
        }
    }
    Ok(())
}

fn cmd_watch<A: NativeApi>(client: &TotalSpaces<A>) -> miette::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    let (subscription, mut events) = client.subscribe(DEFAULT_CHANNEL_BUFFER);
    println!("Watching for space changes, press Ctrl-C to stop");

    runtime.block_on(watch_events(&mut events, tokio::signal::ctrl_c(), |event| {
        match event {
            SpaceEvent::SpaceWillChange(change) => {
                println!("space {} -> {}", change.from, change.to);
            }
            SpaceEvent::LayoutChanged => {
                println!("layout changed ({} spaces)", client.number_of_spaces());
            }
        }
    }));

    drop(subscription);
    Ok(())
}

/// Feed events to `on_event` until `stop` completes or the channel closes
///
/// `stop` is created once and polled across iterations, so a signal that
/// arrives while an event is being handled is not lost.
async fn watch_events<S, F>(events: &mut EventReceiver, stop: S, mut on_event: F)
where
    S: Future,
    F: FnMut(SpaceEvent),
{
    tokio::pin!(stop);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => on_event(event),
                None => break,
            },
            _ = &mut stop => {
                tracing::debug!("Interrupted, stopping watch");
                break;
            }
        }
    }
}

fn cmd_apply<A: NativeApi>(client: &TotalSpaces<A>, config: &Config) -> miette::Result<()> {
    if config.spaces.is_empty() {
        println!("No space names configured");
        return Ok(());
    }

    let mut failed = Vec::new();
    for space in &config.spaces {
        match client.set_space_name(space.space_number, &space.name) {
            Ok(true) => println!("  {}: {}", space.space_number, space.name),
            Ok(false) => failed.push(space.space_number),
            Err(e) => {
                tracing::warn!("Skipping space {}: {}", space.space_number, e);
                failed.push(space.space_number);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(miette::miette!("Could not name space(s) {:?}", failed))
    }
}

fn cmd_export<A: NativeApi>(
    client: &TotalSpaces<A>,
    config: &Config,
    output: &Path,
) -> miette::Result<()> {
    let spaces = client
        .window_list()
        .into_iter()
        .map(|space| SpaceConfig {
            name: client.space_name(space.space_number),
            space_number: space.space_number,
        })
        .filter(|space| !space.name.is_empty())
        .collect();

    let exported = Config {
        global: config.global.clone(),
        spaces,
    };

    totalspaces_config::write_config(&exported, output)?;
    println!(
        "Wrote {} space name(s) to {}",
        exported.spaces.len(),
        output.display()
    );
    Ok(())
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = totalspaces_config::parse_config(config_path)?;
    println!("Configuration is valid!");
    println!("  Version check: {}", config.global.version_check);
    if let Some(version) = &config.global.expected_api_version {
        println!("  Expected API version: {}", version);
    }
    println!("  Spaces: {}", config.spaces.len());
    for space in &config.spaces {
        println!("    - {}: {}", space.space_number, space.name);
    }
    Ok(())
}
