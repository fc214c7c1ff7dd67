use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spdlog::{critical, info, warn};

use ristretto::config::{read_config, Config};
use ristretto::logger::{configure_logger, default_log_location};
use ristretto::publisher::publish;
use ristretto::server::server_run;

const CFG_FILE_NAME: &str = "ristretto.toml";
const SAMPLE_CFG: &str = include_str!("../ristretto.toml");

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Promote drafts and regenerate the site
    Build,
    /// Serve the generated site for preview
    Serve {
        /// Port to listen on, overrides the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a sample configuration file
    Init {
        /// Where to write it, defaults to ./ristretto.toml
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn get_config_path() -> Option<PathBuf> {
    let mut candidates = vec![];
    if let Some(exe_dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(|dir| dir.to_path_buf())) {
        candidates.push(exe_dir.join(CFG_FILE_NAME));
    }
    if let Ok(cur_dir) = env::current_dir() {
        candidates.push(cur_dir.join(CFG_FILE_NAME));
    }
    if let Some(cfg_dir) = dirs::config_dir() {
        candidates.push(cfg_dir.join("ristretto").join(CFG_FILE_NAME));
    }

    candidates.into_iter().find(|path| path.exists())
}

fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match cfg_path.or_else(get_config_path) {
        Some(path) => path,
        None => bail!("Could not find {}. Run `ristretto init` to create one", CFG_FILE_NAME),
    };

    println!("Reading config from {}", config_path.display());
    let mut config = read_config(&config_path)
        .with_context(|| format!("Could not load {}", config_path.display()))?;

    if let Some(ref mut log) = config.log {
        let location = log.location.take().unwrap_or_else(default_log_location);
        println!("Log enabled. Files will be written in {}", location.display());
        log.location = Some(location);
    }

    Ok(config)
}

fn init_config(output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(CFG_FILE_NAME));
    if output.exists() {
        bail!("{} already exists, not overwriting it", output.display());
    }
    fs::write(&output, SAMPLE_CFG).with_context(|| format!("Could not write {}", output.display()))?;
    println!("Sample configuration written to {}", output.display());
    Ok(())
}

fn exit_with_error(msg: String) -> ! {
    critical!("{}", msg);
    spdlog::default_logger().flush();
    process::exit(1);
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::Init { output } = args.command {
        return init_config(output);
    }

    let config = open_config(args.config)?;
    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    match args.command {
        Command::Build => {
            info!("Starting Ristretto =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
            match publish(&config) {
                Ok(summary) => info!(
                    "Done: {} post(s), {} file(s) written, {} draft(s) promoted, {} preview(s)",
                    summary.posts, summary.written, summary.promoted, summary.previews
                ),
                Err(e) => exit_with_error(format!("Publishing failed: {}", e)),
            }
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            if let Err(e) = server_run(config, port).await {
                exit_with_error(format!("Server error: {}", e));
            }
        }
        Command::Init { .. } => {}
    }

    spdlog::default_logger().flush();
    Ok(())
}
