// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::passwd::{Passwd, Salt};
use super::Authenticator;
use crate::error::Error;

/// File backed credential store.
///
/// One line per user, `username:sha256hex(password ∥ salt)`. The salt is
/// generated per broker process, so the file is rewritten from the
/// configured user list at every startup and read back linearly on each
/// authenticate call.
#[derive(Debug)]
pub struct FileAuth {
    path: PathBuf,
    salt: Salt,
}

impl FileAuth {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            salt: Salt::generate(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the password file from `users` pairs of
    /// (username, plain password), hashed with the process salt.
    ///
    /// # Errors
    ///
    /// Returns error if hashing or writing the file fails.
    pub fn regenerate(&self, users: &[(&str, &str)]) -> Result<(), Error> {
        let mut content = String::new();
        for (username, password) in users {
            let passwd = Passwd::generate(password.as_bytes(), &self.salt)?;
            content.push_str(&passwd.dump(username));
            content.push('\n');
        }

        let mut fd = File::create(&self.path)?;
        fd.write_all(content.as_bytes()).map_err(Into::into)
    }

    /// Find the entry for `username`. Duplicates resolve to the first
    /// match. A missing or unreadable file yields `None`.
    fn lookup(&self, username: &str) -> Option<Passwd> {
        let fd = File::open(&self.path).ok()?;
        let reader = BufReader::new(fd);
        for line in reader.lines() {
            let line = line.ok()?;
            match Passwd::parse(&line) {
                Err(err) => {
                    log::error!("auth: err: {err:?}, line: {line}");
                }
                Ok(None) => {
                    // continue
                }
                Ok(Some((name, passwd))) => {
                    if name == username {
                        return Some(passwd);
                    }
                }
            }
        }
        None
    }
}

impl Authenticator for FileAuth {
    fn authenticate(&self, username: &str, password: &[u8]) -> bool {
        match self.lookup(username) {
            Some(passwd) => passwd.match_passwd(password, &self.salt),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_passwd_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("aoba-test-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_authenticate() {
        let path = temp_passwd_path("authenticate");
        let auth = FileAuth::new(path.clone());
        auth.regenerate(&[("admin", "admin"), ("user-1", "pass-1")])
            .unwrap();

        assert!(auth.authenticate("admin", b"admin"));
        assert!(auth.authenticate("user-1", b"pass-1"));
        assert!(!auth.authenticate("admin", b"wrong"));
        assert!(!auth.authenticate("nobody", b"admin"));

        let _ret = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file() {
        let auth = FileAuth::new(temp_passwd_path("missing"));
        assert!(!auth.authenticate("admin", b"admin"));
    }

    #[test]
    fn test_duplicates_resolve_to_first_match() {
        let path = temp_passwd_path("duplicates");
        let auth = FileAuth::new(path.clone());
        auth.regenerate(&[("admin", "first"), ("admin", "second")])
            .unwrap();

        assert!(auth.authenticate("admin", b"first"));
        assert!(!auth.authenticate("admin", b"second"));

        let _ret = std::fs::remove_file(path);
    }
}
