//! Serial modem adapter: AT commands over a UART.
//!
//! Implements [`ModemPort`] and [`TransportPort`] for an nRF91 running the
//! serial-modem application.  Every command is written with a `\r\n`
//! terminator and its reply collected line by line until a final result
//! code:
//!
//! ```text
//!   OK                      → Ok(information text)
//!   ERROR / +CME / +CMS     → Err(CommandFailed)
//!   (silence > timeout)     → Err(Timeout)
//! ```
//!
//! `+CEREG:` lines may arrive at any time.  They are routed to the
//! [`RegistrationSignal`] whether they show up mid-command or between
//! commands, and never appear in a command's response.

use core::fmt::Write;

use log::{debug, info, warn};

use crate::app::ports::{ModemPort, TransportPort};
use crate::error::{ModemError, TransportError};
use crate::link::registration::{RegistrationSignal, RegistrationStatus, parse_cereg_urc};
use crate::link::response::{Charset, RESPONSE_CAPACITY, Response, scan_prefixed, tokenize};
use crate::record::RECORD_CAPACITY;

/// Longest line kept from the modem; the rest of a longer line is dropped.
pub const LINE_CAPACITY: usize = 256;
/// Silence tolerated while waiting for the next byte of a reply.
pub const RESPONSE_TIMEOUT_MS: u32 = 5_000;
/// Hex-encoded datagram plus command framing; also the longest command
/// the adapter will write.
const SEND_COMMAND_CAPACITY: usize = RECORD_CAPACITY * 2 + 16;

const CMD_SOCKET_OPEN: &str = "AT#XSOCKET=1,2,0";
const CMD_SOCKET_CLOSE: &str = "AT#XSOCKET=0";

type Line = heapless::String<LINE_CAPACITY>;

/// Byte-level access to the modem UART.
pub trait AtUart {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ModemError>;

    /// Next received byte, waiting at most `timeout_ms`.
    fn read_byte(&mut self, timeout_ms: u32) -> Option<u8>;
}

/// How a reply line ends (or doesn't end) a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Ok,
    Error,
    Registration(RegistrationStatus),
    Text,
}

fn classify(line: &str, cmd: &str) -> LineKind {
    if line == "OK" {
        return LineKind::Ok;
    }
    if line == "ERROR" || line.starts_with("+CME ERROR") || line.starts_with("+CMS ERROR") {
        return LineKind::Error;
    }
    // A `+CEREG` query reply has the same shape as the URC.
    if !cmd.starts_with("AT+CEREG?") {
        if let Some(status) = parse_cereg_urc(line) {
            return LineKind::Registration(status);
        }
    }
    LineKind::Text
}

pub struct SerialModem<U> {
    uart: U,
    registration: RegistrationSignal,
    partial: heapless::Vec<u8, LINE_CAPACITY>,
    timeout_ms: u32,
    socket_open: bool,
}

impl<U: AtUart> SerialModem<U> {
    pub fn new(uart: U) -> Self {
        Self::with_timeout(uart, RESPONSE_TIMEOUT_MS)
    }

    pub fn with_timeout(uart: U, timeout_ms: u32) -> Self {
        Self {
            uart,
            registration: RegistrationSignal::new(),
            partial: heapless::Vec::new(),
            timeout_ms,
            socket_open: false,
        }
    }

    pub fn is_socket_open(&self) -> bool {
        self.socket_open
    }

    /// Next complete, non-empty line, or `None` once the UART stays quiet
    /// for `timeout_ms`.  A partial line survives until the next call.
    fn poll_line(&mut self, timeout_ms: u32) -> Option<Line> {
        loop {
            match self.uart.read_byte(timeout_ms)? {
                b'\n' => {
                    if self.partial.is_empty() {
                        continue;
                    }
                    let mut line = Line::new();
                    for &b in &self.partial {
                        let c = if b.is_ascii() { b as char } else { '?' };
                        let _ = line.push(c);
                    }
                    self.partial.clear();
                    return Some(line);
                }
                b'\r' => {}
                b => {
                    // Overlong lines keep their head.
                    let _ = self.partial.push(b);
                }
            }
        }
    }

    /// Consume whatever the modem sent between commands.
    fn drain_unsolicited(&mut self) {
        while let Some(line) = self.poll_line(0) {
            match parse_cereg_urc(&line) {
                Some(status) => self.registration.publish(status),
                None => debug!("URC {}", line),
            }
        }
    }

    fn send_line(&mut self, cmd: &str) -> Result<(), ModemError> {
        self.uart.write_all(cmd.as_bytes())?;
        self.uart.write_all(b"\r\n")
    }
}

impl<U: AtUart> ModemPort for SerialModem<U> {
    fn command(&mut self, cmd: &str) -> Result<Response, ModemError> {
        if cmd.len() > SEND_COMMAND_CAPACITY {
            return Err(ModemError::CommandTooLong);
        }
        self.drain_unsolicited();
        debug!("AT> {}", cmd);
        self.send_line(cmd)?;

        let mut response = Response::new();
        loop {
            let Some(line) = self.poll_line(self.timeout_ms) else {
                warn!("{}: no final result within {} ms", cmd, self.timeout_ms);
                return Err(ModemError::Timeout);
            };
            if line == cmd {
                continue;
            }
            match classify(&line, cmd) {
                LineKind::Ok => return Ok(response),
                LineKind::Error => {
                    warn!("{} -> {}", cmd, line);
                    return Err(ModemError::CommandFailed);
                }
                LineKind::Registration(status) => self.registration.publish(status),
                LineKind::Text => {
                    debug!("AT< {}", line);
                    let fits = response.len() + line.len() < RESPONSE_CAPACITY;
                    if fits {
                        if !response.is_empty() {
                            let _ = response.push('\n');
                        }
                        let _ = response.push_str(&line);
                    } else {
                        warn!("{}: response truncated", cmd);
                    }
                }
            }
        }
    }

    fn take_registration(&mut self) -> Option<RegistrationStatus> {
        self.drain_unsolicited();
        self.registration.try_take()
    }
}

impl<U: AtUart> TransportPort for SerialModem<U> {
    fn open(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        if self.socket_open {
            let _ = self.command(CMD_SOCKET_CLOSE);
            self.socket_open = false;
        }

        let resp = self
            .command(CMD_SOCKET_OPEN)
            .map_err(|_| TransportError::SocketOpenFailed)?;
        let handle = scan_prefixed(&resp, "#XSOCKET: ", Charset::Field, 16)
            .and_then(|p| tokenize(p).first().and_then(|h| h.trim().parse::<i32>().ok()));
        match handle {
            Some(h) if h >= 0 => debug!("UDP socket handle {}", h),
            _ => return Err(TransportError::SocketOpenFailed),
        }

        let mut cmd = heapless::String::<96>::new();
        write!(cmd, "AT#XCONNECT=\"{}\",{}", host, port)
            .map_err(|_| TransportError::ConnectFailed)?;
        let resp = self
            .command(&cmd)
            .map_err(|_| TransportError::ConnectFailed)?;
        if scan_prefixed(&resp, "#XCONNECT: ", Charset::Digits, 1) != Some("1") {
            let _ = self.command(CMD_SOCKET_CLOSE);
            return Err(TransportError::ConnectFailed);
        }

        self.socket_open = true;
        info!("UDP socket bound to {}:{}", host, port);
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        if !self.socket_open {
            return Err(TransportError::NotConnected);
        }

        let mut cmd = heapless::String::<SEND_COMMAND_CAPACITY>::new();
        cmd.push_str("AT#XSEND=0,\"")
            .map_err(|_| TransportError::SendFailed)?;
        for b in payload {
            write!(cmd, "{:02X}", b).map_err(|_| TransportError::SendFailed)?;
        }
        cmd.push('"').map_err(|_| TransportError::SendFailed)?;

        let resp = self
            .command(&cmd)
            .map_err(|_| TransportError::SendFailed)?;
        let sent = scan_prefixed(&resp, "#XSEND: ", Charset::Digits, 5)
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(payload.len());
        if sent < payload.len() {
            warn!("Short datagram write: {}/{}", sent, payload.len());
            return Err(TransportError::SendFailed);
        }
        Ok(sent)
    }
}

// ── ESP-IDF UART ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl AtUart for esp_idf_hal::uart::UartDriver<'_> {
    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), ModemError> {
        while !bytes.is_empty() {
            let n = self.write(bytes).map_err(|_| ModemError::Io)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout_ms: u32) -> Option<u8> {
        let mut buf = [0u8; 1];
        let ticks = esp_idf_hal::delay::TickType::new_millis(u64::from(timeout_ms)).ticks();
        match self.read(&mut buf, ticks) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}
