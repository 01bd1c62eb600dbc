//! This module contains types used throughout the IMAP protocol engine.

use std::fmt;

mod body_structure;
pub use self::body_structure::{BodyParam, BodyStructure, ContentDisposition};

mod capabilities;
pub use self::capabilities::Capabilities;

mod envelope;
pub use self::envelope::{Address, Envelope};

mod fetch;
pub use self::fetch::Fetch;

mod mailbox;
pub use self::mailbox::Mailbox;

mod name;
pub use self::name::Name;

mod response;
pub use self::response::CommandResponse;

mod status;
pub use self::status::MailboxStatus;

/// A message identified by its sequence number within a mailbox.
///
/// Sequence numbers are assigned at `SELECT` time and renumbered by `EXPUNGE`,
/// so they are only meaningful within a single session.
pub type Seq = u32;

/// A message identified by its unique identifier.
///
/// UIDs are stable across sessions for a given `UIDVALIDITY` value.
pub type Uid = u32;

/// The condition reported by a tagged or untagged status line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// Success.
    Ok,
    /// Operational refusal; the command was understood but not performed.
    No,
    /// Protocol-level error; the command itself was unacceptable.
    Bad,
    /// Greeting only: the session starts pre-authenticated.
    PreAuth,
    /// The server is closing the connection.
    Bye,
}

impl Status {
    pub(crate) fn parse(word: &str) -> Option<Status> {
        match word {
            "OK" => Some(Status::Ok),
            "NO" => Some(Status::No),
            "BAD" => Some(Status::Bad),
            "PREAUTH" => Some(Status::PreAuth),
            "BYE" => Some(Status::Bye),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("OK"),
            Status::No => f.write_str("NO"),
            Status::Bad => f.write_str("BAD"),
            Status::PreAuth => f.write_str("PREAUTH"),
            Status::Bye => f.write_str("BYE"),
        }
    }
}

/// The connection states a command is legal in (RFC 3501 section 6).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandClass {
    /// Legal in every state.
    Any,
    /// Legal only before authentication.
    NotAuthenticated,
    /// Requires authentication; also legal with a mailbox selected.
    Authenticated,
    /// Requires a selected mailbox.
    Selected,
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandClass::Any => f.write_str("any"),
            CommandClass::NotAuthenticated => f.write_str("not-authenticated"),
            CommandClass::Authenticated => f.write_str("authenticated"),
            CommandClass::Selected => f.write_str("selected"),
        }
    }
}

/// The session state machine of RFC 3501 section 3.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    /// Connected, not yet authenticated.
    NotAuthenticated,
    /// Authenticated, no mailbox selected.
    Authenticated,
    /// A mailbox is selected.
    Selected {
        /// The selected mailbox name, as given to `SELECT`/`EXAMINE`.
        mailbox: String,
        /// Whether the mailbox was opened read-only (`EXAMINE`, or the
        /// server answered with a `READ-ONLY` response code).
        readonly: bool,
    },
}

impl ConnectionState {
    /// Whether a command of the given class is legal in this state.
    ///
    /// `Authenticated` commands remain legal while a mailbox is selected.
    pub fn satisfies(&self, class: CommandClass) -> bool {
        match class {
            CommandClass::Any => true,
            CommandClass::NotAuthenticated => {
                matches!(self, ConnectionState::NotAuthenticated)
            }
            CommandClass::Authenticated => {
                !matches!(self, ConnectionState::NotAuthenticated)
            }
            CommandClass::Selected => matches!(self, ConnectionState::Selected { .. }),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::NotAuthenticated => f.write_str("not-authenticated"),
            ConnectionState::Authenticated => f.write_str("authenticated"),
            ConnectionState::Selected { mailbox, readonly } => {
                if *readonly {
                    write!(f, "selected {:?} (read-only)", mailbox)
                } else {
                    write!(f, "selected {:?}", mailbox)
                }
            }
        }
    }
}
