use std::fmt;

/// Meta-information about a mailbox, as returned by `SELECT` and `EXAMINE`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mailbox {
    /// Flags defined in the mailbox.
    pub flags: Vec<String>,
    /// The number of messages in the mailbox.
    pub exists: u32,
    /// The number of messages with the `\Recent` flag set.
    pub recent: u32,
    /// The sequence number of the first unseen message, if the server
    /// reported one.
    pub unseen: Option<u32>,
    /// Flags the client can change permanently. `\*` means new keywords may
    /// be created.
    pub permanent_flags: Vec<String>,
    /// The next unique identifier value.
    pub uid_next: Option<u32>,
    /// The unique identifier validity value.
    pub uid_validity: Option<u32>,
    /// Whether the mailbox was opened read-only, either because `EXAMINE`
    /// was used or because the server said so.
    pub read_only: bool,
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flags: {:?}, exists: {}, recent: {}, unseen: {:?}, permanent_flags: {:?}, \
             uid_next: {:?}, uid_validity: {:?}, read_only: {}",
            self.flags,
            self.exists,
            self.recent,
            self.unseen,
            self.permanent_flags,
            self.uid_next,
            self.uid_validity,
            self.read_only,
        )
    }
}
