use std::collections::HashSet;

use log::{debug, trace};
use nom::Parser;

use crate::{Entry, PgPass};

use super::COMMENT;

use self::field::fields;

pub mod field;

/// Parse a single line into an [`Entry`]. Returns `None` for comments and
/// for lines which do not split into exactly five fields.
pub fn entry(line: &str) -> Option<Entry> {
    if line.starts_with(COMMENT) {
        return None;
    }
    let Ok((_, fields)) = fields.parse(line) else {
        return None;
    };
    let [host, port, database, user, password] = fields.as_slice() else {
        return None;
    };

    Some(Entry::new(*host, *port, *database, *user, *password))
}

/// Lines may end with `\n`, `\r\n` or a lone `\r`. Line numbers are only used
/// for logging, and count `\n`-terminated lines.
fn lines(s: &str) -> impl Iterator<Item = (usize, &str)> {
    s.lines()
        .enumerate()
        .flat_map(|(idx, line)| line.split('\r').map(move |line| (idx + 1, line)))
}

pub fn pgpass(s: &str) -> PgPass {
    let mut entries: Vec<Entry> = Vec::with_capacity(8);
    let mut seen: HashSet<Entry> = HashSet::with_capacity(8);
    for (lineno, line) in lines(s) {
        // We do NOT log the line itself. Otherwise, we may accidentally expose
        // passwords in logs.
        if line.starts_with(COMMENT) {
            trace!("Skipping comment on line {}", lineno);
            continue;
        }
        let Some(entry) = entry(line) else {
            debug!("Skipping line {}: expected 5 fields", lineno);
            continue;
        };
        if !seen.insert(entry.clone()) {
            trace!("Skipping duplicate entry on line {}", lineno);
            continue;
        }
        entries.push(entry);
    }

    PgPass { entries }
}
