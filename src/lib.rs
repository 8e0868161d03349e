#![deny(unused_must_use)]
//! Look up Postgres passwords from a pgpass file.
//!
//! Client programs often know everything about a connection except the
//! password. `pgpass_lookup` finds that password in the user's
//! [`pgpass`](https://www.postgresql.org/docs/current/libpq-pgpass.html)
//! file so it does not have to be hardcoded or typed in.
//!
//! ```no_run
//! # fn main() -> Result<(), pgpass_lookup::pgpass::LoadError> {
//! let password = pgpass_lookup::get_password("db1.example.com", "5432", "mydb", "alice")?;
//! if password.is_none() {
//!     // Fall back to prompting the user.
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The parsed file is documented in [`PgPass`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

pub mod pgpass;
pub use pgpass::{get_all_entries, get_all_entries_from, get_password, get_password_from, PgPass};

pub const DEFAULT_PORT: u16 = 5432;

/// One line of a pgpass file.
///
/// Fields hold the text exactly as it appears in the file. Escape sequences
/// such as `\:` are kept as-is, and any of the first four fields may be the
/// wildcard `*`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
    pub password: String,
}
impl Entry {
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }
    /// Returns true if every key field is either a wildcard or exactly equal
    /// to the corresponding query value. Comparison is case-sensitive.
    pub fn matches(&self, host: &str, port: &str, database: &str, user: &str) -> bool {
        fn field_matches(pattern: &str, value: &str) -> bool {
            pattern == pgpass::WILDCARD || pattern == value
        }

        field_matches(&self.host, host)
            && field_matches(&self.port, port)
            && field_matches(&self.database, database)
            && field_matches(&self.user, user)
    }
}
impl Debug for Entry {
    // Hand-rolled to censor passwords
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[ Censored ]")
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exact_match() {
        let entry = Entry::new("db1.host", "5432", "mydb", "alice", "secret");
        assert!(entry.matches("db1.host", "5432", "mydb", "alice"));
        assert!(!entry.matches("db2.host", "5432", "mydb", "alice"));
        assert!(!entry.matches("db1.host", "5433", "mydb", "alice"));
        assert!(!entry.matches("db1.host", "5432", "otherdb", "alice"));
        assert!(!entry.matches("db1.host", "5432", "mydb", "bob"));
    }

    #[test]
    fn wildcards_match_anything() {
        let entry = Entry::new("*", "*", "*", "alice", "secret123");
        assert!(entry.matches("any.host", "5432", "mydb", "alice"));
        assert!(entry.matches("", "", "", "alice"));
        assert!(!entry.matches("any.host", "5432", "mydb", "bob"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let entry = Entry::new("DB1.host", "5432", "mydb", "alice", "secret");
        assert!(!entry.matches("db1.host", "5432", "mydb", "alice"));
    }

    #[test]
    fn query_wildcard_is_literal() {
        // Only the stored side may be a wildcard
        let entry = Entry::new("db1.host", "5432", "mydb", "alice", "secret");
        assert!(!entry.matches("*", "5432", "mydb", "alice"));
    }

    #[test]
    fn new_accepts_mixed_string_types() {
        let user = String::from("alice");
        let entry = Entry::new("db1.host", "5432", "mydb", user, "secret");
        assert_eq!(entry.user, "alice");
        assert!(entry.matches("db1.host", "5432", "mydb", "alice"));
    }

    #[test]
    fn debug_censors_password() {
        let entry = Entry::new("db1.host", "5432", "mydb", "alice", "hunter2");
        let s = format!("{:?}", entry);
        assert!(!s.contains("hunter2"));
        assert!(s.contains("[ Censored ]"));
    }
}
