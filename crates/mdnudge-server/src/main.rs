use anyhow::{Context, Result};
use mdnudge_config::Config;
use mdnudge_engine::{Service, Workspace, io};
use mdnudge_server::{DiskWatcher, Server};
use std::{env, path::PathBuf, process, sync::Arc};

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        println!("Usage: {} [ROOT...]", args[0]);
        println!("Roots default to those in {}", Config::config_path().display());
        println!("or, failing that, the current directory.");
        return Ok(());
    }

    let config = Config::load()
        .with_context(|| format!("Failed to load {}", Config::config_path().display()))?
        .unwrap_or_default();

    let cli_roots: Vec<PathBuf> = args.iter().skip(1).map(PathBuf::from).collect();
    let cwd = env::current_dir().context("Failed to read current directory")?;
    let roots = config.effective_roots(cli_roots, cwd);

    for root in &roots {
        if let Err(e) = io::validate_root(root) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    let workspace = Arc::new(Workspace::new(roots).with_excluded_dirs(config.exclude.clone()));
    log::info!("Workspace: {}", workspace.describe_roots());

    let _watcher = match DiskWatcher::start(Arc::clone(&workspace)) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            log::warn!("Disk watching disabled: {e}");
            None
        }
    };

    let service = Arc::new(Service::new(workspace).with_marker(config.marker.as_str()));
    let address = config.address();
    let server = Server::bind(&address, service)
        .with_context(|| format!("Failed to bind {address}"))?;
    log::info!("mdnudge listening on http://{}", server.local_addr()?);

    server.run();
    Ok(())
}
