use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use liquid_ether::{palette::PRESETS, EtherConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config_path = None;
    let mut cycle_palettes = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--cycle-palettes" => cycle_palettes = true,
            _ => config_path = Some(arg),
        }
    }

    let config = match config_path {
        Some(path) => match EtherConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => EtherConfig::default(),
    };

    let result = if cycle_palettes {
        liquid_ether::window::run_with(config, |sender| {
            thread::spawn(move || {
                for &(name, colors) in PRESETS.iter().cycle() {
                    thread::sleep(Duration::from_secs(5));
                    match sender.send(colors) {
                        Ok(true) => log::info!("sent palette {}", name),
                        Ok(false) => break,
                        Err(e) => log::warn!("{}", e),
                    }
                }
            });
        })
    } else {
        liquid_ether::window::run(config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
