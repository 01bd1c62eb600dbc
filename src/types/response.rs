use super::{Fetch, MailboxStatus, Name, Seq, Status};

/// Everything gathered while reading the response stream of one command.
///
/// Each command returns a fresh value; nothing accumulates across commands
/// except the client's capability cache and connection state. Fields the
/// server did not speak to stay at their defaults.
#[derive(Clone, Debug, Default)]
pub struct CommandResponse {
    /// The tagged completion condition, `None` if the read stopped at a
    /// continuation request.
    pub status: Option<Status>,
    /// The human-readable text of the tagged line.
    pub text: String,
    /// The text after `+ ` when the server requested a continuation; the
    /// tagged line has not been read yet in that case.
    pub continuation: Option<String>,

    /// `* n EXISTS`
    pub exists: Option<u32>,
    /// `* n RECENT`
    pub recent: Option<u32>,
    /// `* n EXPUNGE`, in arrival order.
    pub expunged: Vec<Seq>,
    /// `* n FETCH (...)`, one entry per message, in sequence-number order.
    pub fetches: Vec<Fetch>,
    /// `* LIST`/`* LSUB` entries.
    pub names: Vec<Name>,
    /// `* STATUS` attribute counts.
    pub mailbox_status: Option<MailboxStatus>,
    /// `* SEARCH` result numbers.
    pub search: Vec<u32>,
    /// `* FLAGS (...)`
    pub flags: Vec<String>,
    /// `[PERMANENTFLAGS (...)]`
    pub permanent_flags: Vec<String>,
    /// `[BADCHARSET (...)]`
    pub bad_charset: Vec<String>,
    /// `[READ-ONLY]`
    pub read_only: bool,
    /// `[READ-WRITE]`
    pub read_write: bool,
    /// `[UIDNEXT n]`
    pub uid_next: Option<u32>,
    /// `[UIDVALIDITY n]`
    pub uid_validity: Option<u32>,
    /// `[UNSEEN n]`
    pub unseen: Option<u32>,
    /// Response codes not interpreted above, as `(code, argument)` pairs.
    pub codes: Vec<(String, String)>,

    pub(crate) capabilities_updated: bool,
}
