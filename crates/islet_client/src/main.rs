mod app;
mod building;
mod commands;
mod config;
mod game;
mod input;
mod movement;
mod save_queue;
mod session;
mod swim;

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use config::{BackendKind, GameConfig, DEFAULT_CONFIG_PATH};

const USAGE: &str = "Usage: islet [--config <path>] [--local [save path]] [--ticks <n>]";

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut force_local = false;
    let mut local_path: Option<PathBuf> = None;
    let mut tick_limit: Option<u64> = None;

    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(value) = args.next() else {
                    eprintln!("--config expects a path argument");
                    std::process::exit(2);
                };
                config_path = PathBuf::from(value);
            }
            "--local" => {
                force_local = true;
                if let Some(path) = args.next_if(|next| !next.starts_with("--")) {
                    local_path = Some(PathBuf::from(path));
                }
            }
            "--ticks" => {
                let Some(value) = args.next() else {
                    eprintln!("--ticks expects a numeric argument");
                    std::process::exit(2);
                };
                match value.parse::<u64>() {
                    Ok(parsed) => tick_limit = Some(parsed),
                    Err(err) => {
                        eprintln!("invalid tick count '{value}': {err}");
                        std::process::exit(2);
                    }
                }
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let mut config = match GameConfig::load(&config_path) {
        Ok(config) => config.with_env_token(),
        Err(err) => {
            eprintln!("failed to load config {}: {err}", config_path.display());
            std::process::exit(2);
        }
    };
    if force_local {
        config.backend = BackendKind::Local;
    }
    if let Some(path) = local_path {
        config.save_path = path;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        eprintln!("\nShutdown signal received, saving world...");
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("failed to set Ctrl+C handler: {err}");
        std::process::exit(1);
    }

    if let Err(err) = app::run(config, running, tick_limit) {
        eprintln!("islet stopped: {err}");
        std::process::exit(1);
    }
}
