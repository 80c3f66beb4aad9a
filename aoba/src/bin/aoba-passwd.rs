// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use clap::Parser;
use std::path::PathBuf;

use aoba::auth::{self, FileAuth};
use aoba::error::{Error, ErrorKind};

/// Write an aoba password file from `user:password` pairs.
///
/// Entries are hashed with a fresh random salt. Note that the broker
/// rewrites the file with its own per-process salt at startup; this tool
/// exists to inspect the format and to provision files for other
/// consumers of it.
#[derive(Debug, Parser)]
#[command(name = "aoba-passwd", version, about)]
struct Args {
    /// Password file to write. Defaults to `PASSWD_FILE_PATH` or
    /// `~/.mqtt_passwd`.
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// One or more `user:password` pairs.
    #[arg(required = true, value_name = "USER:PASSWORD")]
    users: Vec<String>,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    let mut pairs = Vec::with_capacity(args.users.len());
    for item in &args.users {
        let Some((username, password)) = item.split_once(':') else {
            return Err(Error::from_string(
                ErrorKind::ParameterError,
                format!("Invalid user:password pair: {item:?}"),
            ));
        };
        if username.is_empty() {
            return Err(Error::from_string(
                ErrorKind::ParameterError,
                format!("Empty username in pair: {item:?}"),
            ));
        }
        pairs.push((username, password));
    }

    let path = args.file.unwrap_or_else(auth::default_passwd_path);
    let file_auth = FileAuth::new(path);
    file_auth.regenerate(&pairs)?;
    log::info!("Wrote {} entries to {:?}", pairs.len(), file_auth.path());
    Ok(())
}
