//! A synchronous client-side engine for IMAP4rev1 (RFC 3501).
//!
//! The entry point is the [`Client`], generic over any `Read + Write`
//! transport. One command is in flight at a time: each call writes a tagged
//! command and reads its response stream to completion, returning owned,
//! typed results. Only the capability cache and the connection state live on
//! the client between calls.
//!
//! Commands are checked against the RFC 3501 state machine *before* any
//! bytes are written, so e.g. [`Client::fetch`] without a selected mailbox
//! fails locally with [`Error::State`]. A `NO` completion surfaces as
//! [`Error::No`] with the server's text verbatim; `BAD` as [`Error::Bad`].
//!
//! To connect, use [`ClientBuilder`] (implicit TLS, `STARTTLS`, or plain
//! TCP), then authenticate:
//!
//! ```no_run
//! # fn main() -> Result<(), mailbox_imap::Error> {
//! let mut client = mailbox_imap::ClientBuilder::new("imap.example.com", 993).native_tls()?;
//! client.login("user@example.com", "password")?;
//!
//! let mailbox = client.select("INBOX")?;
//! println!("{} messages", mailbox.exists);
//!
//! for fetch in client.fetch("1", "(UID BODY[TEXT])")? {
//!     if let Some(text) = fetch.text() {
//!         println!("{}", String::from_utf8_lossy(text));
//!     }
//! }
//! client.logout()?;
//! # Ok(())
//! # }
//! ```
//!
//! Until `ENABLE UTF8=...` succeeds (see [`Client::enable_utf8`]), mailbox
//! names are converted to and from modified UTF-7 transparently.

#![deny(missing_docs)]

mod parse;

pub mod auth;
pub mod builder;
pub mod client;
pub mod decode;
pub mod error;
pub mod types;
pub mod utf7;

#[cfg(test)]
mod mock_stream;

pub use crate::auth::AuthMechanism;
pub use crate::builder::ClientBuilder;
pub use crate::client::{Client, SetReadTimeout};
pub use crate::error::{Error, ParseError, Result, StateError, ValidateError};
pub use crate::types::*;
