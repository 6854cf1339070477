mod options;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use lumen_core::config::Config;
use lumen_core::persistence::{list_presets, preset_path};
use lumen_core::show::Show;
use lumen_net::{OscBridge, RateLimiter};

use options::{Listen, Options};

fn init_logging(verbose: bool) {
    use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lumen")
        .join("lumen.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("lumen.log")))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("lumen: cannot create log file: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, LogConfig::default(), log_file).is_err() {
        eprintln!("lumen: logger already initialized");
        return;
    }

    log::info!("lumen starting (log level: {:?})", log_level);
}

/// A bare name is looked up in the preset directory; anything with a path
/// separator or an extension is taken as a file path.
fn resolve_preset(config: &Config, name: &str) -> Option<PathBuf> {
    let as_path = Path::new(name);
    if as_path.components().count() > 1 || as_path.extension().is_some() {
        return Some(as_path.to_path_buf());
    }
    config.preset_dir().map(|dir| preset_path(&dir, name))
}

fn bind_bridge(config: &Config, opts: &Options, show: &Show) -> Option<OscBridge> {
    let listen = match opts.listen {
        Listen::Off => return None,
        Listen::Addr(addr) => addr,
        Listen::Config => config.osc_listen()?,
    };
    let feedback = opts.feedback.or_else(|| config.osc_feedback());
    let limiter = RateLimiter::new(config.osc_max_messages(), config.osc_flush_interval());
    match OscBridge::bind(listen, feedback, limiter) {
        Ok(mut bridge) => {
            bridge.attach(show.registry());
            Some(bridge)
        }
        Err(e) => {
            log::error!(target: "net::osc", "cannot listen on {}: {}", listen, e);
            eprintln!("lumen: cannot listen on {}: {}", listen, e);
            None
        }
    }
}

fn run(config: &Config, opts: &Options) -> ExitCode {
    let mut show = Show::demo(config);

    if let Some(name) = &opts.preset {
        let Some(path) = resolve_preset(config, name) else {
            eprintln!("lumen: no preset directory configured for {}", name);
            return ExitCode::FAILURE;
        };
        match show.load_preset_file(&path) {
            Ok(report) => log::info!(
                "loaded {}: {} applied, {} skipped, {} failed, {} group(s)",
                path.display(),
                report.applied,
                report.skipped,
                report.failed,
                report.groups
            ),
            Err(e) => {
                eprintln!("lumen: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let mut bridge = bind_bridge(config, opts, &show);
    let interval = config.frame_interval();
    let mut last = Instant::now();
    let mut frame: u64 = 0;

    while opts.frames.map_or(true, |limit| frame < limit) {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        show.tick(dt);
        if let Some(bridge) = bridge.as_mut() {
            bridge.poll(show.registry());
            bridge.flush(now);
        }
        frame += 1;

        std::thread::sleep(interval.saturating_sub(now.elapsed()));
    }
    log::info!("ran {} frame(s)", frame);

    if let Some(name) = &opts.save {
        let Some(path) = resolve_preset(config, name) else {
            eprintln!("lumen: no preset directory configured for {}", name);
            return ExitCode::FAILURE;
        };
        if let Err(e) = show.save_preset_file(&path) {
            eprintln!("lumen: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = match Options::parse(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("lumen: {}\n\n{}", e, options::USAGE);
            return ExitCode::from(2);
        }
    };
    if opts.help {
        println!("{}", options::USAGE);
        return ExitCode::SUCCESS;
    }

    init_logging(opts.verbose);
    let config = Config::load();

    if opts.list_presets {
        match config.preset_dir() {
            Some(dir) => list_presets(&dir).iter().for_each(|name| println!("{}", name)),
            None => eprintln!("lumen: no preset directory configured"),
        }
        return ExitCode::SUCCESS;
    }

    run(&config, &opts)
}
