/// One `attribute`/`value` pair from a MIME parameter list.
///
/// Attribute names are normalized to uppercase; values are kept as sent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BodyParam {
    /// The parameter name, e.g. `CHARSET` or `FILENAME`.
    pub attribute: String,
    /// The parameter value, `None` if the server sent `NIL`.
    pub value: Option<String>,
}

/// The `Content-Disposition` of a body part.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentDisposition {
    /// The disposition type, normalized to uppercase (`INLINE`,
    /// `ATTACHMENT`, ...).
    pub disposition: String,
    /// Disposition parameters such as `FILENAME`.
    pub parameters: Vec<BodyParam>,
}

/// The MIME structure of a message, from the `BODY` or `BODYSTRUCTURE`
/// fetch item.
///
/// MIME type, subtype and transfer encoding tokens are normalized to
/// uppercase, so a text part always reads `TEXT`/`PLAIN` regardless of how
/// the server spelled it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BodyStructure {
    /// A `multipart/*` container.
    Multipart {
        /// The multipart subtype, e.g. `MIXED` or `ALTERNATIVE`.
        subtype: String,
        /// The child parts, in order.
        parts: Vec<BodyStructure>,
        /// Parameters of the multipart itself, e.g. `BOUNDARY`.
        parameters: Vec<BodyParam>,
        /// The container's `Content-Disposition`, if any.
        disposition: Option<ContentDisposition>,
        /// Body language values, if any.
        language: Vec<String>,
        /// Body location URI, if any.
        location: Option<String>,
    },
    /// A non-multipart part.
    Leaf {
        /// The MIME type, e.g. `TEXT` or `IMAGE`.
        content_type: String,
        /// The MIME subtype, e.g. `PLAIN` or `PNG`.
        subtype: String,
        /// Body parameters, e.g. `CHARSET`.
        parameters: Vec<BodyParam>,
        /// The `Content-ID`.
        id: Option<String>,
        /// The `Content-Description`.
        description: Option<String>,
        /// The content transfer encoding, e.g. `BASE64`.
        encoding: Option<String>,
        /// The body size in octets, as transferred.
        size: Option<u32>,
        /// For `TEXT` parts, the body size in lines.
        lines: Option<u32>,
        /// The body MD5, if the server computed one.
        md5: Option<String>,
        /// The part's `Content-Disposition`, if any.
        disposition: Option<ContentDisposition>,
        /// Body language values, if any.
        language: Vec<String>,
        /// Body location URI, if any.
        location: Option<String>,
    },
}

impl BodyStructure {
    /// Whether this node is a multipart container.
    pub fn is_multipart(&self) -> bool {
        matches!(self, BodyStructure::Multipart { .. })
    }

    /// The child parts of a multipart container; empty for a leaf.
    pub fn parts(&self) -> &[BodyStructure] {
        match self {
            BodyStructure::Multipart { parts, .. } => parts,
            BodyStructure::Leaf { .. } => &[],
        }
    }

    /// Look up a parameter value by attribute name, searching the part's own
    /// parameter list first and its disposition parameters second.
    pub fn param(&self, attribute: &str) -> Option<&str> {
        let attribute = attribute.to_ascii_uppercase();
        let (parameters, disposition) = match self {
            BodyStructure::Multipart {
                parameters,
                disposition,
                ..
            }
            | BodyStructure::Leaf {
                parameters,
                disposition,
                ..
            } => (parameters, disposition),
        };
        parameters
            .iter()
            .chain(disposition.iter().flat_map(|d| d.parameters.iter()))
            .find(|p| p.attribute == attribute)
            .and_then(|p| p.value.as_deref())
    }
}
