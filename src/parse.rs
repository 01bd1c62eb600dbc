//! Builders that turn response lines and decoded token trees into typed
//! results.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use regex::Regex;

use crate::decode::{decode, Token};
use crate::error::{Error, ParseError, Result};
use crate::types::{
    Address, BodyParam, BodyStructure, Capabilities, ContentDisposition, Envelope, Fetch,
    MailboxStatus, Name, Seq,
};
use crate::utf7::decode_utf7_imap;

lazy_static! {
    static ref LIST_LINE: Regex =
        Regex::new(r#"^\(([^)]*)\)\s+("[^"]*"|\S+)\s+(.+)$"#).unwrap();
    static ref STATUS_ITEM: Regex =
        Regex::new(r"(MESSAGES|RECENT|UIDNEXT|UIDVALIDITY|UNSEEN)\s+(\d+)").unwrap();
    static ref PAREN_LIST: Regex = Regex::new(r"\(([^)]*)\)").unwrap();
    static ref SECTION_ITEM: Regex =
        Regex::new(r"^(?:BODY\[[^\]]*\](?:<[^>]+>)?|RFC822(?:\.(?:TEXT|HEADER))?)$").unwrap();
}

/// Split a `CAPABILITY` listing into the capability map. `name=value` items
/// fold into one entry per name with the values in listing order.
pub(crate) fn parse_capabilities(line: &str) -> Capabilities {
    let mut caps: HashMap<String, Vec<String>> = HashMap::new();
    for item in line.split_whitespace() {
        match item.split_once('=') {
            None => {
                caps.entry(item.to_ascii_uppercase()).or_default();
            }
            Some((name, value)) => {
                caps.entry(name.to_ascii_uppercase())
                    .or_default()
                    .push(value.to_string());
            }
        }
    }
    Capabilities(caps)
}

/// Parse the remainder of a `* LIST`/`* LSUB` line:
/// `(attributes) delimiter name`.
pub(crate) fn parse_name(line: &str, utf8: bool) -> Result<Name> {
    let caps = LIST_LINE
        .captures(line.trim())
        .ok_or_else(|| Error::Parse(ParseError::List(line.to_string())))?;
    let attributes = caps[1].split_whitespace().map(str::to_string).collect();
    let delimiter = if &caps[2] == "NIL" {
        None
    } else {
        caps[2].trim_matches('"').chars().next()
    };
    let raw = caps[3].trim().trim_matches('"');
    let name = if utf8 {
        raw.to_string()
    } else {
        decode_utf7_imap(raw)
    };
    Ok(Name {
        attributes,
        delimiter,
        name,
    })
}

/// Parse the attribute counts of a `* STATUS mailbox (...)` line.
pub(crate) fn parse_status(line: &str) -> Result<MailboxStatus> {
    let inner = PAREN_LIST
        .captures(line)
        .ok_or_else(|| Error::Parse(ParseError::Status(line.to_string())))?;
    let mut status = MailboxStatus::default();
    let mut any = false;
    for item in STATUS_ITEM.captures_iter(&inner[1]) {
        let value: u32 = item[2]
            .parse()
            .map_err(|_| Error::Parse(ParseError::Status(line.to_string())))?;
        match &item[1] {
            "MESSAGES" => status.messages = Some(value),
            "RECENT" => status.recent = Some(value),
            "UIDNEXT" => status.uid_next = Some(value),
            "UIDVALIDITY" => status.uid_validity = Some(value),
            "UNSEEN" => status.unseen = Some(value),
            _ => {}
        }
        any = true;
    }
    if !any {
        return Err(Error::Parse(ParseError::Status(line.to_string())));
    }
    Ok(status)
}

/// Parse the number list of a `* SEARCH` line. An empty list is a valid
/// no-matches result.
pub(crate) fn parse_search(line: &str) -> Vec<u32> {
    line.split_whitespace()
        .filter_map(|word| word.parse().ok())
        .collect()
}

/// Parse a parenthesized flag list, as in `* FLAGS (...)` and
/// `[PERMANENTFLAGS (...)]`.
pub(crate) fn parse_flags(line: &str) -> Result<Vec<String>> {
    let caps = PAREN_LIST
        .captures(line)
        .ok_or_else(|| Error::Parse(ParseError::Flags(line.to_string())))?;
    Ok(caps[1].split_whitespace().map(str::to_string).collect())
}

fn text_of(token: &Token) -> Option<String> {
    match token {
        Token::Text(s) | Token::Section(s) => Some(s.clone()),
        Token::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn upper_of(token: &Token) -> Option<String> {
    text_of(token).map(|s| s.to_ascii_uppercase())
}

/// Build one address from its four-slot token list.
fn build_address(tokens: &[Token]) -> Address {
    Address {
        name: tokens.first().and_then(text_of),
        adl: tokens.get(1).and_then(text_of),
        mailbox: tokens.get(2).and_then(text_of),
        host: tokens.get(3).and_then(text_of),
    }
}

fn address_list(token: Option<&Token>, field: &str) -> Result<Vec<Address>> {
    match token {
        None | Some(Token::Nil) => Ok(Vec::new()),
        Some(Token::List(items)) => Ok(items
            .iter()
            .filter_map(|t| t.as_list().map(build_address))
            .collect()),
        Some(_) => Err(Error::Parse(ParseError::Envelope(format!(
            "{} is neither NIL nor an address list",
            field
        )))),
    }
}

/// Build an envelope from its fixed ten-slot token list.
pub(crate) fn build_envelope(tokens: &[Token]) -> Result<Envelope> {
    Ok(Envelope {
        date: tokens.first().and_then(text_of),
        subject: tokens.get(1).and_then(text_of),
        from: address_list(tokens.get(2), "from")?,
        sender: address_list(tokens.get(3), "sender")?,
        reply_to: address_list(tokens.get(4), "reply-to")?,
        to: address_list(tokens.get(5), "to")?,
        cc: address_list(tokens.get(6), "cc")?,
        bcc: address_list(tokens.get(7), "bcc")?,
        in_reply_to: tokens.get(8).and_then(text_of),
        message_id: tokens.get(9).and_then(text_of),
    })
}

fn build_params(token: Option<&Token>) -> Vec<BodyParam> {
    let items = match token {
        Some(Token::List(items)) => items,
        _ => return Vec::new(),
    };
    let mut params = Vec::new();
    for pair in items.chunks(2) {
        let attribute = match upper_of(&pair[0]) {
            Some(a) => a,
            None => continue,
        };
        // a trailing attribute without a value is dropped
        let value = match pair.get(1) {
            Some(token) => text_of(token),
            None => continue,
        };
        params.push(BodyParam { attribute, value });
    }
    params
}

fn build_disposition(token: Option<&Token>) -> Option<ContentDisposition> {
    let items = match token {
        Some(Token::List(items)) => items,
        _ => return None,
    };
    let disposition = upper_of(items.first()?)?;
    Some(ContentDisposition {
        disposition,
        parameters: build_params(items.get(1)),
    })
}

fn build_language(token: Option<&Token>) -> Vec<String> {
    match token {
        Some(Token::List(items)) => items.iter().filter_map(text_of).collect(),
        Some(token) => text_of(token).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Build the MIME tree from a `BODY`/`BODYSTRUCTURE` token list. A leading
/// nested list means multipart; otherwise the slots describe a single part.
pub(crate) fn build_body_structure(tokens: &[Token]) -> Result<BodyStructure> {
    let first = tokens
        .first()
        .ok_or_else(|| Error::Parse(ParseError::BodyStructure("empty structure".to_string())))?;

    if first.as_list().is_some() {
        let mut parts = Vec::new();
        let mut i = 0;
        while let Some(Token::List(items)) = tokens.get(i) {
            parts.push(build_body_structure(items)?);
            i += 1;
        }
        return Ok(BodyStructure::Multipart {
            subtype: tokens.get(i).and_then(upper_of).unwrap_or_default(),
            parts,
            parameters: build_params(tokens.get(i + 1)),
            disposition: build_disposition(tokens.get(i + 2)),
            language: build_language(tokens.get(i + 3)),
            location: tokens.get(i + 4).and_then(text_of),
        });
    }

    let content_type = upper_of(first).unwrap_or_default();
    let is_text = content_type == "TEXT";
    // TEXT parts carry a line count before the extension slots
    let ext = if is_text { 8 } else { 7 };
    Ok(BodyStructure::Leaf {
        subtype: tokens.get(1).and_then(upper_of).unwrap_or_default(),
        parameters: build_params(tokens.get(2)),
        id: tokens.get(3).and_then(text_of),
        description: tokens.get(4).and_then(text_of),
        encoding: tokens.get(5).and_then(upper_of),
        size: tokens.get(6).and_then(|t| t.as_number()).map(|n| n as u32),
        lines: if is_text {
            tokens.get(7).and_then(|t| t.as_number()).map(|n| n as u32)
        } else {
            None
        },
        md5: tokens.get(ext).and_then(text_of),
        disposition: build_disposition(tokens.get(ext + 1)),
        language: build_language(tokens.get(ext + 2)),
        location: tokens.get(ext + 3).and_then(text_of),
        content_type,
    })
}

fn parse_internal_date(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text.trim(), "%d-%b-%Y %H:%M:%S %z").ok()
}

/// Assemble one message's `FETCH` data from its ordered chunk list.
///
/// Chunks alternate between decoded syntax (the line that opened the item,
/// lines that followed a literal) and raw literal payloads. Item names pair
/// with the following value token; a `{n}` count means the next `n` octets
/// across the payload chunks are the value, and whatever follows the count
/// goes back through the decoder.
pub(crate) fn parse_fetch(message: Seq, chunks: &[Vec<u8>]) -> Result<Fetch> {
    let mut fetch = Fetch {
        message,
        ..Fetch::default()
    };
    let mut queue: VecDeque<Vec<u8>> = chunks.iter().cloned().collect();

    while let Some(chunk) = queue.pop_front() {
        let tokens = decode(&String::from_utf8_lossy(&chunk));
        for pair in tokens.chunks(2) {
            let name = match &pair[0] {
                Token::Text(s) | Token::Section(s) => s.clone(),
                _ => continue,
            };
            let value = pair.get(1);
            if SECTION_ITEM.is_match(&name) {
                match value {
                    Some(Token::Number(n)) => {
                        // the number is a literal octet count; the payload
                        // sits in the chunks that follow
                        let (payload, rest) = take_literal(*n as usize, &mut queue)?;
                        fetch.sections.push((name, payload));
                        if let Some(rest) = rest {
                            queue.push_front(rest);
                        }
                    }
                    Some(Token::Text(s)) => {
                        fetch.sections.push((name, s.clone().into_bytes()));
                    }
                    _ => {}
                }
                continue;
            }
            match name.as_str() {
                "UID" => {
                    fetch.uid = value.and_then(|t| t.as_number()).map(|n| n as u32);
                }
                "RFC822.SIZE" => {
                    fetch.size = value.and_then(|t| t.as_number()).map(|n| n as u32);
                }
                "INTERNALDATE" => {
                    fetch.internal_date =
                        value.and_then(|t| t.as_text()).and_then(parse_internal_date);
                }
                "FLAGS" => {
                    fetch.flags = value
                        .and_then(|t| t.as_list())
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(|t| t.as_text().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                }
                "ENVELOPE" => {
                    if let Some(Token::List(items)) = value {
                        fetch.envelope = Some(build_envelope(items)?);
                    }
                }
                "BODY" | "BODYSTRUCTURE" => {
                    if let Some(Token::List(items)) = value {
                        fetch.body_structure = Some(build_body_structure(items)?);
                    }
                }
                _ => {}
            }
        }
    }
    Ok(fetch)
}

fn take_literal(
    declared: usize,
    queue: &mut VecDeque<Vec<u8>>,
) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let mut payload = Vec::with_capacity(declared);
    while payload.len() < declared {
        let chunk = match queue.pop_front() {
            Some(chunk) => chunk,
            None => {
                return Err(Error::Parse(ParseError::LiteralLengthMismatch {
                    declared,
                    got: payload.len(),
                }))
            }
        };
        let need = declared - payload.len();
        if chunk.len() <= need {
            payload.extend_from_slice(&chunk);
        } else {
            payload.extend_from_slice(&chunk[..need]);
            let rest = chunk[need..].to_vec();
            if !rest.iter().all(|b| b.is_ascii_whitespace()) {
                return Ok((payload, Some(rest)));
            }
            return Ok((payload, None));
        }
    }
    Ok((payload, None))
}

/// Convert the accumulated per-message chunk lists of one response into
/// typed `Fetch` values, ordered by sequence number.
pub(crate) fn parse_fetches(entries: &BTreeMap<Seq, Vec<Vec<u8>>>) -> Result<Vec<Fetch>> {
    entries
        .iter()
        .map(|(seq, chunks)| parse_fetch(*seq, chunks))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&[u8]]) -> Vec<Vec<u8>> {
        parts.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn capabilities_fold_values_per_name() {
        let caps = parse_capabilities("IMAP4rev1 STARTTLS AUTH=PLAIN AUTH=LOGIN UTF8=ACCEPT");
        assert!(caps.has("IMAP4rev1"));
        assert!(caps.has("starttls"));
        assert_eq!(
            caps.values("AUTH"),
            Some(&["PLAIN".to_string(), "LOGIN".to_string()][..])
        );
        assert!(caps.has_value("utf8", "accept"));
        assert!(!caps.has("IDLE"));
    }

    #[test]
    fn capability_without_values_has_empty_list() {
        let caps = parse_capabilities("A B C=1 C=2");
        assert_eq!(caps.values("A"), Some(&[][..]));
        assert_eq!(caps.values("C"), Some(&["1".to_string(), "2".to_string()][..]));
        assert_eq!(caps.len(), 3);
    }

    #[test]
    fn list_line_parses_attributes_delimiter_and_name() {
        let name = parse_name(r#"(\HasNoChildren \Sent) "." "INBOX.Sent""#, false).unwrap();
        assert_eq!(name.attributes(), ["\\HasNoChildren", "\\Sent"]);
        assert_eq!(name.delimiter(), Some('.'));
        assert_eq!(name.name(), "INBOX.Sent");
    }

    #[test]
    fn list_nil_delimiter_and_utf7_name() {
        let name = parse_name(r#"() NIL "Entw&APw-rfe""#, false).unwrap();
        assert!(name.attributes().is_empty());
        assert_eq!(name.delimiter(), None);
        assert_eq!(name.name(), "Entwürfe");
    }

    #[test]
    fn list_name_passes_through_once_utf8_enabled() {
        let name = parse_name(r#"() "/" "Entw&APw-rfe""#, true).unwrap();
        assert_eq!(name.name(), "Entw&APw-rfe");
    }

    #[test]
    fn malformed_list_line_is_an_error() {
        assert!(matches!(
            parse_name("not a list line", false),
            Err(Error::Parse(ParseError::List(_)))
        ));
    }

    #[test]
    fn status_counts() {
        let status =
            parse_status(r#""INBOX" (MESSAGES 231 UIDNEXT 44292 UNSEEN 3)"#).unwrap();
        assert_eq!(status.messages, Some(231));
        assert_eq!(status.uid_next, Some(44292));
        assert_eq!(status.unseen, Some(3));
        assert_eq!(status.recent, None);
        assert_eq!(status.uid_validity, None);
    }

    #[test]
    fn status_without_counts_is_an_error() {
        assert!(parse_status("INBOX").is_err());
        assert!(parse_status("\"INBOX\" ()").is_err());
    }

    #[test]
    fn search_numbers() {
        assert_eq!(parse_search(" 2 84 882"), vec![2, 84, 882]);
        assert_eq!(parse_search(""), Vec::<u32>::new());
    }

    #[test]
    fn flag_list() {
        assert_eq!(
            parse_flags(r"(\Answered \Flagged \Deleted \Seen \Draft)").unwrap(),
            ["\\Answered", "\\Flagged", "\\Deleted", "\\Seen", "\\Draft"]
        );
    }

    #[test]
    fn envelope_fields_and_addresses() {
        let tokens = decode(concat!(
            r#"("Thu, 1 Jan 2026 00:00:00 +0000" "Hello" "#,
            r#"(("Ann" NIL "ann" "example.com")) NIL NIL "#,
            r#"(("Bob" NIL "bob" "example.org") (NIL NIL "carol" "example.org")) "#,
            r#"NIL NIL NIL "<id@example.com>")"#,
        ));
        let envelope = build_envelope(&tokens).unwrap();
        assert_eq!(envelope.subject.as_deref(), Some("Hello"));
        assert_eq!(envelope.from.len(), 1);
        assert_eq!(envelope.from[0].name.as_deref(), Some("Ann"));
        assert_eq!(envelope.from[0].mailbox.as_deref(), Some("ann"));
        assert_eq!(envelope.from[0].host.as_deref(), Some("example.com"));
        assert!(envelope.sender.is_empty());
        assert_eq!(envelope.to.len(), 2);
        assert_eq!(envelope.to[1].name, None);
        assert_eq!(envelope.to[1].mailbox.as_deref(), Some("carol"));
        assert!(envelope.cc.is_empty());
        assert_eq!(envelope.message_id.as_deref(), Some("<id@example.com>"));
    }

    #[test]
    fn envelope_with_scalar_address_slot_is_an_error() {
        let tokens = decode(r#"("date" "subject" "not-a-list")"#);
        assert!(matches!(
            build_envelope(&tokens),
            Err(Error::Parse(ParseError::Envelope(_)))
        ));
    }

    #[test]
    fn leaf_body_structure_normalizes_casing() {
        let tokens = decode(r#"("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 42 3)"#);
        let body = build_body_structure(&tokens).unwrap();
        match body {
            BodyStructure::Leaf {
                content_type,
                subtype,
                parameters,
                encoding,
                size,
                lines,
                ..
            } => {
                assert_eq!(content_type, "TEXT");
                assert_eq!(subtype, "PLAIN");
                assert_eq!(parameters[0].attribute, "CHARSET");
                assert_eq!(parameters[0].value.as_deref(), Some("utf-8"));
                assert_eq!(encoding.as_deref(), Some("7BIT"));
                assert_eq!(size, Some(42));
                assert_eq!(lines, Some(3));
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn non_text_leaf_has_no_line_count() {
        let tokens = decode(r#"("image" "png" NIL NIL NIL "base64" 1024)"#);
        let body = build_body_structure(&tokens).unwrap();
        match body {
            BodyStructure::Leaf { lines, size, .. } => {
                assert_eq!(lines, None);
                assert_eq!(size, Some(1024));
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn multipart_with_attachment_disposition() {
        let tokens = decode(concat!(
            r#"(("text" "plain" ("charset" "us-ascii") NIL NIL "7bit" 5 1) "#,
            r#"("text" "plain" ("charset" "us-ascii") NIL NIL "base64" 8 1 NIL "#,
            r#"("attachment" ("filename" "a.txt"))) "#,
            r#""mixed" ("boundary" "xyz"))"#,
        ));
        // the outer parens frame the line, so the decoded tokens are the
        // structure's slots themselves
        let body = build_body_structure(&tokens).unwrap();
        assert!(body.is_multipart());
        assert_eq!(body.parts().len(), 2);
        match &body {
            BodyStructure::Multipart {
                subtype, parameters, ..
            } => {
                assert_eq!(subtype, "MIXED");
                assert_eq!(parameters[0].attribute, "BOUNDARY");
            }
            other => panic!("expected multipart, got {:?}", other),
        }
        let attachment = &body.parts()[1];
        match attachment {
            BodyStructure::Leaf { disposition, .. } => {
                let disposition = disposition.as_ref().unwrap();
                assert_eq!(disposition.disposition, "ATTACHMENT");
                assert_eq!(disposition.parameters[0].attribute, "FILENAME");
                assert_eq!(
                    disposition.parameters[0].value.as_deref(),
                    Some("a.txt")
                );
            }
            other => panic!("expected leaf, got {:?}", other),
        }
        assert_eq!(attachment.param("filename"), Some("a.txt"));
    }

    #[test]
    fn trailing_parameter_attribute_without_value_is_dropped() {
        let tokens = decode(r#"("text" "plain" ("charset" "utf-8" "dangling") NIL NIL "7bit" 1 1)"#);
        let body = build_body_structure(&tokens).unwrap();
        match body {
            BodyStructure::Leaf { parameters, .. } => {
                assert_eq!(parameters.len(), 1);
                assert_eq!(parameters[0].attribute, "CHARSET");
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn fetch_scalar_items() {
        let fetch = parse_fetch(
            7,
            &chunks(&[br#"(FLAGS (\Seen \Answered) UID 443 RFC822.SIZE 1024 INTERNALDATE "14-Jul-2026 02:00:00 +0100")"#]),
        )
        .unwrap();
        assert_eq!(fetch.message, 7);
        assert_eq!(fetch.uid, Some(443));
        assert_eq!(fetch.size, Some(1024));
        assert_eq!(fetch.flags, ["\\Seen", "\\Answered"]);
        let date = fetch.internal_date.unwrap();
        assert_eq!(date.timezone().local_minus_utc(), 3600);
    }

    #[test]
    fn fetch_literal_payload_is_byte_exact() {
        // "Hello World" is 11 octets; the ')' after it closes the item list
        let fetch = parse_fetch(
            2,
            &chunks(&[b"(BODY[TEXT] {11}", b"Hello World)"]),
        )
        .unwrap();
        assert_eq!(fetch.section("BODY[TEXT]"), Some(&b"Hello World"[..]));
        assert_eq!(fetch.text(), Some(&b"Hello World"[..]));
    }

    #[test]
    fn fetch_literal_spanning_chunks() {
        let fetch = parse_fetch(
            1,
            &chunks(&[b"(RFC822 {12}", b"Hello\r\n", b"World", b")"]),
        )
        .unwrap();
        assert_eq!(fetch.body(), Some(&b"Hello\r\nWorld"[..]));
    }

    #[test]
    fn fetch_items_after_a_literal_are_still_seen() {
        let fetch = parse_fetch(
            3,
            &chunks(&[b"(BODY[HEADER] {4}", b"a: b", b" UID 9)"]),
        )
        .unwrap();
        assert_eq!(fetch.header(), Some(&b"a: b"[..]));
        assert_eq!(fetch.uid, Some(9));
    }

    #[test]
    fn short_literal_is_a_length_mismatch() {
        let err = parse_fetch(1, &chunks(&[b"(BODY[TEXT] {20}", b"short"])).unwrap_err();
        match err {
            Error::Parse(ParseError::LiteralLengthMismatch { declared, got }) => {
                assert_eq!(declared, 20);
                assert_eq!(got, 5);
            }
            other => panic!("expected length mismatch, got {:?}", other),
        }
    }

    #[test]
    fn fetch_quoted_section_value() {
        let fetch = parse_fetch(4, &chunks(&[br#"(BODY[TEXT] "inline text")"#])).unwrap();
        assert_eq!(fetch.section("body[text]"), Some(&b"inline text"[..]));
    }

    #[test]
    fn internal_date_format() {
        let date = parse_internal_date("17-Jul-1996 02:44:25 -0700").unwrap();
        assert_eq!(date.timezone().local_minus_utc(), -7 * 3600);
        assert!(parse_internal_date("not a date").is_none());
    }
}
