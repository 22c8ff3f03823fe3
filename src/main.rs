mod ftt_config;
mod ftt_controllers;
mod ftt_gui;
mod ftt_icons;
mod ftt_map;
mod ftt_models;
mod ftt_poller;
mod ftt_regions;
mod ftt_state;
mod ftt_views;

use clap::Parser;
use ftt_config::{Args, FTTConfig};
use ftt_controllers::FTTControllers;
use log::error;

fn main() {
    // Set up panic hook for better error messages
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("\n{}", "═".repeat(70));
        eprintln!("❌ APPLICATION PANIC");
        eprintln!("{}", "═".repeat(70));
        eprintln!("\nThe application encountered an unexpected error:");
        eprintln!("{}", panic_info);
        eprintln!("\n💡 Troubleshooting:");
        eprintln!("  • Please restart the application");
        eprintln!("  • Run with RUST_LOG=debug for feed details");
        eprintln!("\n{}", "═".repeat(70));
    }));

    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Run the application
    match std::panic::catch_unwind(|| {
        FTTConfig::from_args(args)
            .map_err(anyhow::Error::from)
            .and_then(FTTControllers::run)
    }) {
        Ok(Ok(())) => {
            // Normal exit
        }
        Ok(Err(e)) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("\n⚠️  Application terminated unexpectedly");
            std::process::exit(1);
        }
    }
}
