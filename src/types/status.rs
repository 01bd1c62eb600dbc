/// Attribute counts returned by a `STATUS` command.
///
/// Only the attributes that were requested (and answered) are present.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MailboxStatus {
    /// `MESSAGES`: number of messages in the mailbox.
    pub messages: Option<u32>,
    /// `RECENT`: number of messages with the `\Recent` flag set.
    pub recent: Option<u32>,
    /// `UIDNEXT`: the next unique identifier value.
    pub uid_next: Option<u32>,
    /// `UIDVALIDITY`: the unique identifier validity value.
    pub uid_validity: Option<u32>,
    /// `UNSEEN`: number of messages without the `\Seen` flag set.
    pub unseen: Option<u32>,
}
