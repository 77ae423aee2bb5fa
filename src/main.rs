/// planview entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;
    use planview::ViewerConfig;
    use planview::native::{self, Cli, Command};

    let config = ViewerConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let result = match Cli::parse().into_command() {
        Command::View { image } => native::run_viewer(image, config),
        Command::Select(select) => native::run_select(&select, &config),
        Command::InitConfig => config.save_to_default_path().map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
