use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use luascope::WatchConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "luascope")]
#[command(about = "Watch named values inside a live LuaJIT process")]
struct Args {
    /// Watch configuration (JSON)
    #[arg(short, long, default_value = "watch.json")]
    config: PathBuf,

    /// Executable name of the target process
    #[arg(short, long)]
    process: String,

    /// Polling interval in milliseconds
    #[arg(short, long, default_value_t = 100)]
    interval: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("luascope=info".parse()?))
        .init();

    let args = Args::parse();
    let config = WatchConfig::load_from_path(&args.config)?;
    info!(
        "Watching {} value(s) in {} every {}ms",
        config.values.len(),
        args.process,
        args.interval
    );

    run(&args, config)
}

#[cfg(target_os = "windows")]
fn run(args: &Args, config: WatchConfig) -> Result<()> {
    use std::thread;
    use std::time::Duration;

    use luascope::{ProcessHandle, ResolutionState, Tracker};
    use tracing::warn;

    loop {
        info!("Waiting for {} ...", args.process);
        let process = loop {
            match ProcessHandle::open_by_name(&args.process) {
                Ok(p) => break p,
                Err(_) => thread::sleep(Duration::from_secs(2)),
            }
        };
        info!(pid = process.pid(), "Attached to {}", process.name());

        let mut tracker = Tracker::new(config.clone());
        loop {
            // the module snapshot failing doubles as the liveness probe
            let modules = match process.modules() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Module snapshot failed ({e}), reattaching...");
                    break;
                }
            };

            let was_resolved = tracker.state() == ResolutionState::Resolved;
            tracker.tick(&process, &modules);
            if !was_resolved && tracker.state() == ResolutionState::Resolved {
                for (name, watcher) in tracker.values() {
                    info!("{name} resolved at {:#010x}", watcher.addr());
                }
            }

            for (name, watcher) in tracker.values() {
                if watcher.changed() {
                    info!("{name}: {} -> {}", fmt(watcher.previous()), fmt(watcher.current()));
                }
            }

            thread::sleep(Duration::from_millis(args.interval));
        }
    }
}

#[cfg(target_os = "windows")]
fn fmt(value: Option<luascope::SampledValue>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(not(target_os = "windows"))]
fn run(_args: &Args, _config: WatchConfig) -> Result<()> {
    anyhow::bail!("process attachment is only supported on Windows")
}
