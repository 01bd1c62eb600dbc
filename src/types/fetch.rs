use chrono::{DateTime, FixedOffset};

use super::{BodyStructure, Envelope, Seq, Uid};

/// The data of one message in a `FETCH` or `STORE` response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fetch {
    /// The message sequence number this data belongs to.
    pub message: Seq,
    /// The message's unique identifier, if `UID` was fetched (or a `UID`
    /// command was used).
    pub uid: Option<Uid>,
    /// The message size in octets, from `RFC822.SIZE`.
    pub size: Option<u32>,
    /// The flags set on the message, as raw atoms (`\Seen`, `\Flagged`,
    /// keywords).
    pub flags: Vec<String>,
    /// The server's `INTERNALDATE` for the message.
    pub internal_date: Option<DateTime<FixedOffset>>,
    /// The message envelope, if `ENVELOPE` was fetched.
    pub envelope: Option<Envelope>,
    /// The MIME structure, if `BODY` or `BODYSTRUCTURE` was fetched.
    pub body_structure: Option<BodyStructure>,

    pub(crate) sections: Vec<(String, Vec<u8>)>,
}

impl Fetch {
    /// The raw payload of a fetched item by its response name, e.g.
    /// `BODY[TEXT]`, `BODY[HEADER.FIELDS (SUBJECT)]`, `RFC822`. Names are
    /// compared case-insensitively, byte ranges (`<origin>`) included.
    pub fn section(&self, name: &str) -> Option<&[u8]> {
        self.sections
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, data)| &data[..])
    }

    /// Iterate over all fetched section payloads as `(name, bytes)` pairs.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.sections.iter().map(|(n, d)| (n.as_str(), &d[..]))
    }

    /// The full message body (`BODY[]` or `RFC822`), if fetched.
    pub fn body(&self) -> Option<&[u8]> {
        self.section("BODY[]").or_else(|| self.section("RFC822"))
    }

    /// The message header (`BODY[HEADER]` or `RFC822.HEADER`), if fetched.
    pub fn header(&self) -> Option<&[u8]> {
        self.section("BODY[HEADER]")
            .or_else(|| self.section("RFC822.HEADER"))
    }

    /// The message text (`BODY[TEXT]` or `RFC822.TEXT`), if fetched.
    pub fn text(&self) -> Option<&[u8]> {
        self.section("BODY[TEXT]")
            .or_else(|| self.section("RFC822.TEXT"))
    }
}
