/// A name that matched a `LIST` or `LSUB` command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Name {
    pub(crate) attributes: Vec<String>,
    pub(crate) delimiter: Option<char>,
    pub(crate) name: String,
}

impl Name {
    /// Name attributes as sent by the server, e.g. `\Noselect` or
    /// `\HasChildren`.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The hierarchy delimiter, or `None` if the server sent `NIL` (a flat
    /// namespace).
    pub fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    /// The mailbox name. Decoded from modified UTF-7 unless UTF-8 has been
    /// enabled on the session.
    pub fn name(&self) -> &str {
        &self.name
    }
}
