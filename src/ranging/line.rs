//! Carriage-return line reader for the ranger's serial stream.
//!
//! MaxBotix rangers emit `R1234\r` continuously while powered.  The reader
//! polls one byte at a time, sleeping 1 ms whenever the UART FIFO is empty,
//! and gives up on the line after more than [`LINE_TIMEOUT_POLLS`]
//! consecutive empty polls.  Any byte received restarts the count.

use embedded_hal::delay::DelayNs;

/// Bytes kept per line; anything past this is dropped.
pub const LINE_CAPACITY: usize = 19;
/// Consecutive empty polls tolerated before the line times out.
pub const LINE_TIMEOUT_POLLS: u32 = 5000;
/// Sleep between empty polls.
pub const POLL_INTERVAL_MS: u32 = 1;

const FRAMING_BYTE: u8 = b'R';
const LINE_END: u8 = b'\r';

/// Non-blocking byte source (UART receive FIFO).
pub trait ByteSource {
    /// Next received byte, or `None` if the FIFO is empty right now.
    fn poll_byte(&mut self) -> Option<u8>;
}

/// One received line, framing byte and terminator removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line(heapless::Vec<u8, LINE_CAPACITY>);

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Integer value with C `atoi` semantics (garbage → 0).
    pub fn value(&self) -> i32 {
        parse_reading(&self.0)
    }
}

impl core::fmt::Display for Line {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// The line did not terminate within the poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTimeout;

/// Read one `\r`-terminated line.
pub fn read_line(
    src: &mut impl ByteSource,
    delay: &mut impl DelayNs,
) -> Result<Line, LineTimeout> {
    let mut line = Line::default();
    let mut empty_polls: u32 = 0;

    loop {
        match src.poll_byte() {
            Some(LINE_END) => return Ok(line),
            Some(FRAMING_BYTE) => empty_polls = 0,
            Some(b) => {
                empty_polls = 0;
                // Overlong lines are truncated, not rejected.
                let _ = line.0.push(b);
            }
            None => {
                empty_polls += 1;
                if empty_polls > LINE_TIMEOUT_POLLS {
                    return Err(LineTimeout);
                }
                delay.delay_ms(POLL_INTERVAL_MS);
            }
        }
    }
}

/// Parse a decimal reading the way C `atoi` does: optional leading
/// whitespace, optional sign, then digits up to the first non-digit.
/// No digits yields 0.  Saturates instead of overflowing.
pub fn parse_reading(bytes: &[u8]) -> i32 {
    let mut rest = bytes
        .iter()
        .copied()
        .skip_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r'))
        .peekable();

    let negative = match rest.peek() {
        Some(b'-') => {
            rest.next();
            true
        }
        Some(b'+') => {
            rest.next();
            false
        }
        _ => false,
    };

    let mut acc: i64 = 0;
    for b in rest.take_while(u8::is_ascii_digit) {
        acc = (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let signed = if negative { -acc } else { acc };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
