//! Look up Postgres passwords stored in the pgpass format.
//! <https://www.postgresql.org/docs/current/libpq-pgpass.html>
//!
//! The main functionality is documented in [`PgPass`].

// You might wonder why this is a seperate module when this could all be in the
// source root. This keeps room for other credential formats (such as the
// connection service file) without reorganizing the project.

mod location;
mod parser;

use log::{debug, trace, warn};
use postgres::config::Host;
use serde::{Deserialize, Serialize};
use std::{
    convert::Infallible,
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    slice,
    str::FromStr,
    vec,
};
use thiserror::Error;

use crate::{Entry, DEFAULT_PORT};

pub use self::location::PlatformDirs;

// Constants copied from Postgres documentation
pub const FILENAME: &str = ".pgpass";
pub const FILENAME_WINDOWS: &str = "pgpass.conf";
pub const APPDATA_DIRECTORY: &str = "postgresql";
pub const APPDATA_ENVIRONMENT_VAR: &str = "APPDATA";
pub const DEFAULT_HOST: &str = "localhost";
pub const DELIMITER: &str = ":";
pub const DELIMITER_CHAR: char = ':';
pub const COMMENT: &str = "#";
pub const ESCAPE: &str = "\\";
pub const WILDCARD: &str = "*";

/// Look up the password for a connection in the default pgpass file.
/// Returns `Ok(None)` if no entry matches.
pub fn get_password(
    host: &str,
    port: &str,
    database: &str,
    user: &str,
) -> Result<Option<String>, LoadError> {
    let pgpass = PgPass::load()?;
    Ok(pgpass.password(host, port, database, user).map(str::to_owned))
}

/// Look up the password for a connection in the pgpass file at `path`.
/// Returns `Ok(None)` if no entry matches.
pub fn get_password_from<P: AsRef<Path>>(
    path: P,
    host: &str,
    port: &str,
    database: &str,
    user: &str,
) -> Result<Option<String>, LoadError> {
    let pgpass = PgPass::open(path)?;
    Ok(pgpass.password(host, port, database, user).map(str::to_owned))
}

/// Every entry of the default pgpass file, in file order, without duplicates.
pub fn get_all_entries() -> Result<Vec<Entry>, LoadError> {
    Ok(PgPass::load()?.into_entries())
}

/// Every entry of the pgpass file at `path`, in file order, without duplicates.
pub fn get_all_entries_from<P: AsRef<Path>>(path: P) -> Result<Vec<Entry>, LoadError> {
    Ok(PgPass::open(path)?.into_entries())
}

/// The entries of a pgpass file, which can be queried with a simple
/// pattern-matching scheme.
/// <https://www.postgresql.org/docs/current/libpq-pgpass.html>
///
/// ```
/// # use pgpass_lookup::PgPass;
/// let s = "example.com:*:my_database:username:password";
/// let pgpass: PgPass = s.parse().unwrap();
/// let password = pgpass.password("example.com", "5432", "my_database", "username");
/// assert_eq!(password, Some("password"));
/// ```
///
/// Use [`load`][PgPass::load] to read the file from it's standard location.
///
/// # Format
///
/// Entries are stored in a colon-delimited flat file with the following
/// format:
///
/// `hostname:port:database:username:password`
///
/// For example:
///
/// `example.com:5432:my_database:webapp_user:secret`
///
/// Lines which do not contain exactly five fields are skipped. Trailing empty
/// fields are not counted, so `a:1:b:c:d:` is accepted while `a:1:b:c:` is not.
/// Identical lines are only kept once.
///
/// ## Wildcards
///
/// `*` in any of the first four fields matches any value.
///
/// For example, this line will match any database:
///
/// `example.com:5432:*:webapp_user:secret`
///
/// ## Escaping
///
/// A colon is a delimiter only when it directly follows zero, two or four
/// backslashes. After any other number of backslashes it is part of the
/// field, so `\:` is a literal colon and `\\:` is a backslash followed by a
/// delimiter. Field values keep their escape sequences; `p\:ss` is returned
/// as written, not as `p:ss`.
///
/// ## Comments
///
/// Any lines starting with `#` will be considered a comment and ignored.
///
/// # Querying
///
/// Entries are evaluated in order, and the first match wins. Order counts
/// for more than specificity: a wildcard line above an exact line shadows it.
///
/// # Caveats
/// - `libpq` resolves escape sequences. This implementation does not.
/// - `libpq` has special behavior when `localhost` is supplied as the
///     hostname. This library does not support this.
/// - `libpq` performs a permissions check on the pgpass file, and will
///     not open a file which is too permissive. This library does not
///     perform this check.
#[derive(Default, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PgPass {
    entries: Vec<Entry>,
}

impl PgPass {
    /// Locate and load the default pgpass file.
    /// See [`locate`][PgPass::locate] for more.
    pub fn load() -> Result<Self, LoadError> {
        let Some(path) = Self::locate() else {
            return Err(LoadError::CouldNotLocate);
        };
        Self::open(path)
    }
    /// Parse entries from a reader.
    pub fn read<F: Read>(mut f: F) -> Result<Self, io::Error> {
        let mut contents = String::with_capacity(8192);
        // Invalid UTF-8 is reported as `io::ErrorKind::InvalidData`
        f.read_to_string(&mut contents)?;

        Ok(parser::pgpass(&contents))
    }
    /// Load entries from the file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        trace!("Reading pgpass file: {:?}", path.as_os_str());
        let f = File::open(path).map_err(|e| LoadError::from_io(path, e))?;
        Self::read(f).map_err(|e| LoadError::from_io(path, e))
    }
    /// The default pgpass location for this platform: `~/.pgpass` on Unix
    /// systems, and `%APPDATA%\postgresql\pgpass.conf` on Windows.
    ///
    /// The file is not required to exist.
    pub fn locate() -> Option<PathBuf> {
        let dirs = PlatformDirs::current();
        let path = dirs.pgpass_path();
        match &path {
            Some(path) => trace!("Using pgpass file: {:?}", path.as_os_str()),
            None if dirs.windows => warn!("Failed to find app data directory"),
            None => warn!("Failed to find home directory"),
        }
        path
    }

    /// Add an entry. Entries are evaluated in order, so this new entry will
    /// have the lowest precedence. Duplicates are ignored.
    pub fn add(&mut self, entry: Entry) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry)
        }
    }
    /// Builder interface to [`add`][a].
    ///
    /// [a]: PgPass::add
    pub fn with(mut self, entry: Entry) -> Self {
        self.add(entry);
        self
    }
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
    pub fn iter(&self) -> slice::Iter<'_, Entry> {
        self.entries.iter()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first entry matching the query, if one exists. See
    /// [`Entry::matches`] for the matching rules.
    pub fn find(&self, host: &str, port: &str, database: &str, user: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.matches(host, port, database, user))
    }
    /// Returns the password of the first entry matching the query.
    pub fn password(&self, host: &str, port: &str, database: &str, user: &str) -> Option<&str> {
        self.find(host, port, database, user)
            .map(|entry| entry.password.as_str())
    }
    /// Fill in the password of a [`postgres::Config`] which does not have
    /// one. Returns true if a password was set.
    ///
    /// The query is built the way `libpq` does it: the first host (or
    /// `localhost` for Unix sockets), the first port (or 5432), the database
    /// (or the user name), and the user. Configs without a user are left
    /// alone.
    ///
    /// ```
    /// # use pgpass_lookup::PgPass;
    /// let pgpass: PgPass = "db1.host:5432:mydb:alice:secret".parse().unwrap();
    /// let mut config: postgres::Config = "host=db1.host user=alice dbname=mydb".parse().unwrap();
    /// assert!(pgpass.configure(&mut config));
    /// assert_eq!(config.get_password(), Some("secret".as_bytes()));
    /// ```
    pub fn configure(&self, config: &mut postgres::Config) -> bool {
        if config.get_password().is_some() {
            trace!("Config already has a password");
            return false;
        }
        let Some(user) = config.get_user() else {
            debug!("Config has no user; not looking up a password");
            return false;
        };
        let host = match config.get_hosts().first() {
            Some(Host::Tcp(host)) => host.as_str(),
            _ => DEFAULT_HOST,
        };
        let port = config
            .get_ports()
            .first()
            .copied()
            .unwrap_or(DEFAULT_PORT)
            .to_string();
        let database = config.get_dbname().unwrap_or(user);

        let Some(password) = self.password(host, &port, database, user) else {
            debug!("No pgpass entry matched the config");
            return false;
        };
        config.password(password);
        true
    }
}
impl FromStr for PgPass {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parser::pgpass(s))
    }
}
impl IntoIterator for PgPass {
    type Item = Entry;
    type IntoIter = vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
impl<'a> IntoIterator for &'a PgPass {
    type Item = &'a Entry;
    type IntoIter = slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An error encountered while reading a pgpass file. It is safe to log or
/// display; it never contains file contents.
#[derive(Error, Debug)]
pub enum LoadError {
    /// There is no file at the given path.
    #[error("pgpass file not found: {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file exists but could not be read (permissions, I/O errors, or
    /// invalid UTF-8).
    #[error("failed reading pgpass file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// We did not succeed in locating the pgpass file automatically.
    #[error("Unable to locate the pgpass file.")]
    CouldNotLocate,
}
impl LoadError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            debug!("pgpass file not found: {:?}", path.as_os_str());
            Self::NotFound { path, source }
        } else {
            Self::Read { path, source }
        }
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
    /// The path we attempted to read, if there was one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path, .. } | Self::Read { path, .. } => Some(path),
            Self::CouldNotLocate => None,
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    const PLAIN_FIELD: &str = "[^\r\n:\\\\#]+";

    proptest! {
        #[test]
        fn unescaped_lines_round_trip(
            host in PLAIN_FIELD,
            port in 1..65535u16,
            database in PLAIN_FIELD,
            user in PLAIN_FIELD,
            password in PLAIN_FIELD,
        ) {
            let port = port.to_string();
            let line = [
                host.as_str(),
                port.as_str(),
                database.as_str(),
                user.as_str(),
                password.as_str(),
            ]
            .join(DELIMITER);
            let pgpass: PgPass = line.parse().unwrap();
            let expected = Entry::new(host, port, database, user, password);
            prop_assert_eq!(pgpass.entries(), &[expected]);
        }

        #[test]
        fn parsed_entries_match_themselves(input in ".*") {
            let pgpass: PgPass = input.parse().unwrap();
            for entry in &pgpass {
                let found = pgpass.find(&entry.host, &entry.port, &entry.database, &entry.user);
                prop_assert!(found.is_some());
            }
        }

        #[test]
        fn no_panics_on_trash(input in "(?s).*") {
            let _ = input.parse::<PgPass>();
        }
    }
}
