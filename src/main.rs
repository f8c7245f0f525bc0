use clap::Parser;
use tracing::info;

use snaplink::cli::Cli;
use snaplink::config::{StaticConfig, init_config};
use snaplink::runtime::run_server;
use snaplink::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.generate_config.as_deref() {
        if let Err(e) = StaticConfig::default().save_to_file(path) {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
        println!("Sample configuration written to {}", path);
        return Ok(());
    }

    // .env 只补充未设置的变量
    dotenvy::dotenv().ok();

    let config = match init_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    info!("snaplink {} starting", env!("CARGO_PKG_VERSION"));
    run_server(config).await
}
