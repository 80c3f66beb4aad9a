// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tokio::sync::watch;

use aoba::config::Config;
use aoba::error::{Error, ErrorKind};
use aoba::server;

/// MQTT 3.1 broker.
#[derive(Debug, Parser)]
#[command(name = "aoba", version, about)]
struct Args {
    /// Path to the toml config file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Require username/password authentication. Without an explicit
    /// port this also switches the default port from 1883 to 1884.
    #[arg(long)]
    enable_auth: bool,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|err| {
                Error::from_string(
                    ErrorKind::ConfigError,
                    format!("Failed to read config file {path:?}: {err}"),
                )
            })?;
            Config::parse(&content)?
        }
        None => Config::default(),
    };
    if args.enable_auth {
        config.mut_security().set_enable_auth(true);
    }
    if let Some(port) = args.port {
        config.mut_listener().set_port(port);
    }
    config.validate()?;

    aoba::log::init_log(config.log())?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ret = shutdown_tx.send(true);
            }
        });

        server::run_server(&config, shutdown_rx).await
    })
}
