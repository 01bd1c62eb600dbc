//! Modified UTF-7 mailbox-name encoding (RFC 3501 section 5.1.3).
//!
//! Until `ENABLE UTF8=...` has been accepted, international mailbox names
//! travel as `&...-` blocks of base64-encoded UTF-16BE with `,` standing in
//! for `/`, and a literal `&` is written `&-`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref ENCODED_BLOCK: Regex = Regex::new("&([^-]*)-").unwrap();
}

/// Encode a UTF-8 mailbox name into modified UTF-7.
///
/// Printable ASCII passes through; everything else is collected into
/// `&...-` blocks.
pub fn encode_utf7_imap(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut run = String::new();
    for c in name.chars() {
        if c == '&' {
            flush_run(&mut out, &mut run);
            out.push_str("&-");
        } else if (' '..='\u{7e}').contains(&c) {
            flush_run(&mut out, &mut run);
            out.push(c);
        } else {
            run.push(c);
        }
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.is_empty() {
        return;
    }
    let mut utf16be = Vec::with_capacity(run.len() * 2);
    for unit in run.encode_utf16() {
        utf16be.extend_from_slice(&unit.to_be_bytes());
    }
    let encoded = STANDARD.encode(&utf16be);
    out.push('&');
    out.push_str(&encoded.trim_end_matches('=').replace('/', ","));
    out.push('-');
    run.clear();
}

/// Decode a modified UTF-7 mailbox name into UTF-8.
///
/// Blocks that do not decode cleanly are left as they arrived rather than
/// corrupting the rest of the name.
pub fn decode_utf7_imap(name: &str) -> String {
    ENCODED_BLOCK
        .replace_all(name, |caps: &Captures<'_>| {
            let block = &caps[1];
            if block.is_empty() {
                return "&".to_string();
            }
            decode_block(block).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_block(block: &str) -> Option<String> {
    let mut b64 = block.replace(',', "/");
    while b64.len() % 4 != 0 {
        b64.push('=');
    }
    let bytes = STANDARD.decode(b64).ok()?;
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(encode_utf7_imap("INBOX.Sent"), "INBOX.Sent");
        assert_eq!(decode_utf7_imap("INBOX.Sent"), "INBOX.Sent");
    }

    #[test]
    fn ampersand_is_escaped() {
        assert_eq!(encode_utf7_imap("Lost & Found"), "Lost &- Found");
        assert_eq!(decode_utf7_imap("Lost &- Found"), "Lost & Found");
    }

    #[test]
    fn umlaut_round_trips() {
        assert_eq!(encode_utf7_imap("Entwürfe"), "Entw&APw-rfe");
        assert_eq!(decode_utf7_imap("Entw&APw-rfe"), "Entwürfe");
    }

    #[test]
    fn accented_run_round_trips() {
        assert_eq!(encode_utf7_imap("théâtre"), "th&AOkA4g-tre");
        assert_eq!(decode_utf7_imap("th&AOkA4g-tre"), "théâtre");
    }

    #[test]
    fn cyrillic_round_trips() {
        let name = "Отправленные";
        assert_eq!(decode_utf7_imap(&encode_utf7_imap(name)), name);
    }

    #[test]
    fn non_bmp_round_trips() {
        let name = "mail📫box";
        assert_eq!(decode_utf7_imap(&encode_utf7_imap(name)), name);
    }

    #[test]
    fn undecodable_block_is_left_alone() {
        assert_eq!(decode_utf7_imap("&!!!-"), "&!!!-");
    }
}
