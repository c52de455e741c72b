// src/main.rs

use actix_web::web;
use clap::Parser;
use local_ip_address::local_ip;
use log::{error, info, warn};
use qrcode::render::unicode;
use qrcode::QrCode;
use std::fs;
use std::process;
use std::sync::Arc;

// Module declarations
mod cli;
mod config;
mod controller;
mod error;
mod file_utils;
mod media;
mod player_backend;
mod web_server;

// Crate imports for convenience
use crate::cli::Cli;
use crate::config::Settings;
use crate::controller::{ControllerOptions, PlayerController};
use crate::player_backend::CommandBackend;
use crate::web_server::run_server;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run_app().await {
        error!("Application Error: {}", err);
        eprintln!("\nApplication Error: {}", err);
        process::exit(1);
    }
}

async fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::resolve(Cli::parse())?;

    fs::create_dir_all(&settings.upload_dir)?;
    info!("Uploads are stored in '{}'", settings.upload_dir.display());

    let backend = CommandBackend::from_name(
        &settings.player,
        settings.player_args.clone(),
        settings.player_timeout,
    );
    info!("Using player '{}'", backend.program().display());

    let controller = PlayerController::new(
        Arc::new(backend),
        ControllerOptions {
            upload_dir: settings.upload_dir.clone(),
            unknown_extensions: settings.unknown_extensions,
            settle_delay: settings.settle_delay,
            keep_uploads: settings.keep_uploads,
        },
    );

    let server = run_server(
        settings.host.clone(),
        settings.port,
        web::Data::new(controller),
        settings.max_upload_bytes,
    )?;

    print_banner(&settings);

    server.await?;
    info!("Server stopped.");
    Ok(())
}

/// Prints where the remote can be reached, with a QR code for phones on the LAN.
fn print_banner(settings: &Settings) {
    let host = if settings.host == "0.0.0.0" {
        match local_ip() {
            Ok(ip) => ip.to_string(),
            Err(e) => {
                warn!("Could not get local IP address: {}", e);
                "127.0.0.1".to_string()
            }
        }
    } else {
        settings.host.clone()
    };
    let url = format!("http://{}:{}/", host, settings.port);
    println!("Media remote is running at {}", url);

    if settings.show_qr {
        if let Ok(code) = QrCode::new(url.as_bytes()) {
            println!(
                "Scan QR code to open the remote on another device:\n{}",
                code.render::<unicode::Dense1x2>().build()
            );
        }
    }
}
