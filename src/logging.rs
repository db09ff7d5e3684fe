use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Info by default, debug for this crate. `RUST_LOG` overrides both.
pub fn init() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("ratiowatch", LevelFilter::Debug)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("tungstenite", LevelFilter::Warn)
        .parse_env(Env::default())
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}
