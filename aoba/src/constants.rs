// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

/// Default port of an unauthenticated broker.
pub const DEFAULT_PORT: u16 = 1883;

/// Default port when authentication is required.
pub const DEFAULT_AUTH_PORT: u16 = 1884;

/// Default capacity of command channels between server and sessions.
pub const CHANNEL_CAPACITY: usize = 16;

/// Seconds a new connection may take to send its connect packet.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 60;

/// Environment variable naming the password file.
pub const PASSWD_FILE_PATH_ENV: &str = "PASSWD_FILE_PATH";

/// Password file name in the home directory, used when the environment
/// variable is not set.
pub const DEFAULT_PASSWD_FILE: &str = ".mqtt_passwd";
