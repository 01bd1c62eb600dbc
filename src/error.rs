//! Error types used across the crate.

use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
#[cfg(any(feature = "native-tls", feature = "rustls-tls"))]
use std::net::TcpStream;
use std::result;

use bufstream::IntoInnerError as BufError;
#[cfg(feature = "native-tls")]
use native_tls::Error as TlsError;
#[cfg(feature = "native-tls")]
use native_tls::HandshakeError as TlsHandshakeError;
#[cfg(feature = "rustls-tls")]
use rustls_connector::HandshakeError as RustlsHandshakeError;

use crate::types::{CommandClass, ConnectionState};

/// A convenience wrapper around `Result` for `Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur in the IMAP client.
#[derive(Debug)]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to a
    /// network stream.
    Io(IoError),
    /// An error from the `native_tls` library during the TLS handshake.
    #[cfg(feature = "native-tls")]
    TlsHandshake(TlsHandshakeError<TcpStream>),
    /// An error from the `native_tls` library while managing the socket.
    #[cfg(feature = "native-tls")]
    Tls(TlsError),
    /// An error from the `rustls_connector` library during the TLS
    /// handshake.
    #[cfg(feature = "rustls-tls")]
    RustlsHandshake(RustlsHandshakeError<TcpStream>),
    /// The connection was terminated unexpectedly.
    ConnectionLost,
    /// A command was issued in a connection state it is not legal in.
    State(StateError),
    /// Outgoing command text or configuration failed validation, before
    /// anything was written to the server.
    Validate(ValidateError),
    /// A server response could not be parsed.
    Parse(ParseError),
    /// A `NO` response: the server understood the command but refused to
    /// perform it. The server's text is preserved verbatim.
    No(String),
    /// A `BAD` response: the server rejected the command itself.
    Bad(String),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl<T> From<BufError<T>> for Error {
    fn from(err: BufError<T>) -> Error {
        Error::Io(err.into())
    }
}

#[cfg(feature = "native-tls")]
impl From<TlsHandshakeError<TcpStream>> for Error {
    fn from(err: TlsHandshakeError<TcpStream>) -> Error {
        Error::TlsHandshake(err)
    }
}

#[cfg(feature = "native-tls")]
impl From<TlsError> for Error {
    fn from(err: TlsError) -> Error {
        Error::Tls(err)
    }
}

#[cfg(feature = "rustls-tls")]
impl From<RustlsHandshakeError<TcpStream>> for Error {
    fn from(err: RustlsHandshakeError<TcpStream>) -> Error {
        Error::RustlsHandshake(err)
    }
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Error {
        Error::State(err)
    }
}

impl From<ValidateError> for Error {
    fn from(err: ValidateError) -> Error {
        Error::Validate(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "native-tls")]
            Error::TlsHandshake(e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "native-tls")]
            Error::Tls(e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "rustls-tls")]
            Error::RustlsHandshake(e) => fmt::Display::fmt(e, f),
            Error::ConnectionLost => f.write_str("connection lost"),
            Error::State(e) => fmt::Display::fmt(e, f),
            Error::Validate(e) => fmt::Display::fmt(e, f),
            Error::Parse(e) => fmt::Display::fmt(e, f),
            Error::No(text) => write!(f, "command failed: {}", text),
            Error::Bad(text) => write!(f, "command rejected: {}", text),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            #[cfg(feature = "native-tls")]
            Error::TlsHandshake(e) => Some(e),
            #[cfg(feature = "native-tls")]
            Error::Tls(e) => Some(e),
            Error::State(e) => Some(e),
            Error::Validate(e) => Some(e),
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// A command was issued in a state that does not permit it. Nothing was
/// written to the server.
#[derive(Debug)]
pub struct StateError {
    /// The rejected command verb.
    pub command: String,
    /// The state class the command requires.
    pub required: CommandClass,
    /// The connection state at the time.
    pub state: ConnectionState,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requires the {} state, but the connection is {}",
            self.command, self.required, self.state
        )
    }
}

impl StdError for StateError {}

/// Outgoing data failed validation before any I/O took place.
#[derive(Debug)]
pub enum ValidateError {
    /// A command or argument contained a character that would break line
    /// framing.
    IllegalChar(char),
    /// The requested authentication mechanism is not supported, or not
    /// advertised by the server.
    UnsupportedMechanism(String),
    /// The server advertises `LOGINDISABLED`, so `LOGIN` must not be sent.
    LoginDisabled,
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // print the character in debug form because the offenders are
            // line breaks
            ValidateError::IllegalChar(c) => {
                write!(f, "invalid character in input: {:?}", c)
            }
            ValidateError::UnsupportedMechanism(m) => {
                write!(f, "unsupported authentication mechanism: {}", m)
            }
            ValidateError::LoginDisabled => {
                f.write_str("LOGIN is disabled by the server")
            }
        }
    }
}

impl StdError for ValidateError {}

/// A server response did not have the expected shape.
#[derive(Debug)]
pub enum ParseError {
    /// A response line that fits no known form.
    Invalid(String),
    /// A malformed `LIST`/`LSUB` line.
    List(String),
    /// A malformed `STATUS` line.
    Status(String),
    /// A malformed flag list.
    Flags(String),
    /// A malformed `ENVELOPE` structure.
    Envelope(String),
    /// A malformed `BODY`/`BODYSTRUCTURE` structure.
    BodyStructure(String),
    /// The authentication exchange went off script.
    Authentication(String),
    /// A literal announced more octets than the server delivered.
    LiteralLengthMismatch {
        /// The octet count announced in `{n}`.
        declared: usize,
        /// The octets actually received.
        got: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Invalid(line) => write!(f, "unparseable response: {}", line),
            ParseError::List(line) => write!(f, "unparseable LIST response: {}", line),
            ParseError::Status(line) => {
                write!(f, "unparseable STATUS response: {}", line)
            }
            ParseError::Flags(line) => write!(f, "unparseable flag list: {}", line),
            ParseError::Envelope(what) => write!(f, "malformed ENVELOPE: {}", what),
            ParseError::BodyStructure(what) => {
                write!(f, "malformed BODYSTRUCTURE: {}", what)
            }
            ParseError::Authentication(what) => {
                write!(f, "unexpected authentication response: {}", what)
            }
            ParseError::LiteralLengthMismatch { declared, got } => write!(
                f,
                "literal announced {} octets but {} were received",
                declared, got
            ),
        }
    }
}

impl StdError for ParseError {}
