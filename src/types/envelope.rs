/// The envelope structure of a message, from the `ENVELOPE` fetch item.
///
/// The fields mirror the fixed ten-slot record of RFC 3501 section 7.4.2.
/// `NIL` slots become `None` (or an empty list for the address fields). The
/// values are kept as the server sent them; RFC 2047 encoded words are not
/// decoded here.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Envelope {
    /// The `Date:` header, verbatim.
    pub date: Option<String>,
    /// The `Subject:` header, verbatim.
    pub subject: Option<String>,
    /// The `From:` addresses.
    pub from: Vec<Address>,
    /// The `Sender:` addresses.
    pub sender: Vec<Address>,
    /// The `Reply-To:` addresses.
    pub reply_to: Vec<Address>,
    /// The `To:` addresses.
    pub to: Vec<Address>,
    /// The `Cc:` addresses.
    pub cc: Vec<Address>,
    /// The `Bcc:` addresses.
    pub bcc: Vec<Address>,
    /// The `In-Reply-To:` header, verbatim.
    pub in_reply_to: Option<String>,
    /// The `Message-ID:` header, verbatim.
    pub message_id: Option<String>,
}

/// A single address from an envelope address list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Address {
    /// The display name.
    pub name: Option<String>,
    /// The source route (rarely used).
    pub adl: Option<String>,
    /// The local part, left of the `@`.
    pub mailbox: Option<String>,
    /// The domain, right of the `@`.
    pub host: Option<String>,
}
