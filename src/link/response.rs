//! AT response scanning and field tokenizing.
//!
//! The modem answers a query with information text such as
//!
//! ```text
//!   %XMONITOR: 1,"NTT DOCOMO","DOCOMO","44010","1A2B",7,19,"00E1C13B",...
//! ```
//!
//! [`scan_prefixed`] finds the line carrying the expected prefix and keeps
//! the longest run of characters from the field's charset (bounded).
//! [`tokenize`] then splits that payload on commas into positional fields.
//! Nothing here rejects input: oversized fields are truncated later by the
//! `Bounded` types, missing fields read as empty.

use heapless::Vec;

/// Capacity of one buffered modem response.
pub const RESPONSE_CAPACITY: usize = 256;
/// Longest payload kept from a monitor/evaluation response.
pub const MAX_PAYLOAD_CHARS: usize = 120;
/// Fields kept by [`tokenize`]; the rest are ignored.
pub const MAX_FIELDS: usize = 17;

/// Information text returned for a successful command.
pub type Response = heapless::String<RESPONSE_CAPACITY>;

/// Comma-split fields of one payload.
pub type Fields<'a> = Vec<&'a str, MAX_FIELDS>;

/// Characters a scanned field may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Monitor/evaluation payloads: space, comma, minus, quote, alphanumerics.
    Field,
    /// Network clock: `,:+/` and digits.
    Clock,
    /// Digits only.
    Digits,
    /// Operator selection: comma, quote, digits.
    Operator,
}

impl Charset {
    pub fn accepts(self, c: char) -> bool {
        match self {
            Self::Field => c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '-' | '"'),
            Self::Clock => c.is_ascii_digit() || matches!(c, ',' | ':' | '+' | '/'),
            Self::Digits => c.is_ascii_digit(),
            Self::Operator => c.is_ascii_digit() || matches!(c, ',' | '"'),
        }
    }
}

/// Find the first line starting with `prefix` and return the leading run
/// of `charset` characters that follows it, at most `max` characters.
///
/// `None` if no line carries the prefix or the run is empty.
pub fn scan_prefixed<'a>(
    response: &'a str,
    prefix: &str,
    charset: Charset,
    max: usize,
) -> Option<&'a str> {
    let rest = response
        .lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix(prefix))?;

    let end = rest
        .char_indices()
        .take(max)
        .take_while(|&(_, c)| charset.accepts(c))
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());

    (end > 0).then(|| &rest[..end])
}

/// Split `payload` on commas, keeping empty fields in position.
pub fn tokenize(payload: &str) -> Fields<'_> {
    let mut fields = Vec::new();
    for field in payload.split(',') {
        if fields.push(field).is_err() {
            break;
        }
    }
    fields
}

/// Field `index`, or `""` if the payload was shorter.
pub fn field<'a>(fields: &Fields<'a>, index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or("")
}
