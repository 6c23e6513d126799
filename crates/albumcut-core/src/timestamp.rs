//! `H:MM:SS` timestamp parsing

use crate::error::MalformedTimestamp;

/// Parse a colon-separated `H:MM:SS` timestamp into a second offset.
///
/// Fields need not be zero-padded, and no per-field upper bound is enforced:
/// `"0:90:00"` is ninety minutes, not an error.
pub fn parse_timestamp(text: &str) -> Result<u64, MalformedTimestamp> {
    let malformed = || MalformedTimestamp {
        input: text.to_string(),
    };

    let fields: Vec<&str> = text.split(':').collect();
    let [hours, minutes, seconds] = fields.as_slice() else {
        return Err(malformed());
    };

    let field = |s: &str| s.parse::<u64>().map_err(|_| malformed());

    Ok(field(*hours)? * 3600 + field(*minutes)? * 60 + field(*seconds)?)
}
