use nom::{
    branch::alt,
    bytes::complete::{is_a, is_not},
    character::complete::char,
    combinator::recognize,
    multi::{many0_count, separated_list0},
    IResult, Parser,
};

use crate::pgpass::{DELIMITER, DELIMITER_CHAR, ESCAPE};

/// A colon is a delimiter when it follows no backslashes, or a run of
/// exactly this many. After any other run it is part of the field.
const DELIMITING_ESCAPES: [usize; 2] = [2, 4];

/// A run of backslashes, along with the colon after it if that colon is
/// escaped.
fn escapes(s: &str) -> IResult<&str, &str> {
    let (remaining, run) = is_a(ESCAPE).parse(s)?;
    if remaining.starts_with(DELIMITER_CHAR) && !DELIMITING_ESCAPES.contains(&run.len()) {
        let consumed = run.len() + DELIMITER.len();
        return Ok((&s[consumed..], &s[..consumed]));
    }
    Ok((remaining, run))
}

fn plain(s: &str) -> IResult<&str, &str> {
    is_not("\\:").parse(s)
}

/// The raw text of a single field, up to the next unescaped delimiter.
/// Escape sequences are left as they are.
pub fn field(s: &str) -> IResult<&str, &str> {
    recognize(many0_count(alt((escapes, plain)))).parse(s)
}

/// Split a line into its raw fields. Trailing empty fields are discarded.
pub fn fields(s: &str) -> IResult<&str, Vec<&str>> {
    let (remaining, mut fields) = separated_list0(char(DELIMITER_CHAR), field).parse(s)?;
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    Ok((remaining, fields))
}
