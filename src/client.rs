//! The IMAP client: the command gate, the response reader, and typed
//! wrappers for the RFC 3501 command set.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::str;
use std::time::Duration;

use bufstream::BufStream;
use lazy_static::lazy_static;
#[cfg(feature = "native-tls")]
use native_tls::{TlsConnector, TlsStream};
use regex::Regex;

use crate::auth::AuthMechanism;
use crate::error::{Error, ParseError, Result, StateError, ValidateError};
use crate::parse::{
    parse_capabilities, parse_fetches, parse_flags, parse_name, parse_search, parse_status,
};
use crate::types::{
    Capabilities, CommandClass, CommandResponse, ConnectionState, Fetch, Mailbox, MailboxStatus,
    Name, Seq, Status, Uid,
};
use crate::utf7::encode_utf7_imap;

const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

lazy_static! {
    static ref RESPONSE_CODE: Regex = Regex::new(r"\[([^\]]+)\]").unwrap();
}

macro_rules! quote {
    ($x:expr) => {
        format!("\"{}\"", $x.replace('\\', "\\\\").replace('"', "\\\""))
    };
}

fn validate_str(value: &str) -> Result<String> {
    let quoted = quote!(value);
    if quoted.contains('\n') {
        return Err(Error::Validate(ValidateError::IllegalChar('\n')));
    }
    if quoted.contains('\r') {
        return Err(Error::Validate(ValidateError::IllegalChar('\r')));
    }
    Ok(quoted)
}

/// The state class each known command verb requires (RFC 3501 section 6).
/// Unknown verbs, extensions included, pass through ungated.
fn command_class(verb: &str) -> Option<CommandClass> {
    use CommandClass::*;
    Some(match verb {
        "CAPABILITY" | "NOOP" | "LOGOUT" => Any,
        "STARTTLS" | "AUTHENTICATE" | "LOGIN" => NotAuthenticated,
        "SELECT" | "EXAMINE" | "CREATE" | "DELETE" | "RENAME" | "SUBSCRIBE" | "UNSUBSCRIBE"
        | "LIST" | "LSUB" | "STATUS" | "APPEND" => Authenticated,
        "CHECK" | "CLOSE" | "EXPUNGE" | "SEARCH" | "FETCH" | "STORE" | "COPY" | "UID" => Selected,
        _ => return None,
    })
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

fn trim_crlf(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(&CR) | Some(&LF)) {
        line.pop();
    }
}

/// A `{n}` count at the end of a line announces a literal of `n` octets.
fn literal_length(line: &[u8]) -> Option<usize> {
    if line.last() != Some(&b'}') {
        return None;
    }
    let open = line.iter().rposition(|&b| b == b'{')?;
    str::from_utf8(&line[open + 1..line.len() - 1])
        .ok()?
        .parse()
        .ok()
}

fn check_completion(response: CommandResponse) -> Result<CommandResponse> {
    match response.status {
        Some(Status::No) => Err(Error::No(response.text)),
        Some(Status::Bad) => Err(Error::Bad(response.text)),
        _ => Ok(response),
    }
}

fn mailbox_from(response: &CommandResponse) -> Mailbox {
    Mailbox {
        flags: response.flags.clone(),
        exists: response.exists.unwrap_or(0),
        recent: response.recent.unwrap_or(0),
        unseen: response.unseen,
        permanent_flags: response.permanent_flags.clone(),
        uid_next: response.uid_next,
        uid_validity: response.uid_validity,
        read_only: response.read_only,
    }
}

/// A client connection to an IMAP server, generic over the transport.
///
/// One command is in flight at a time: every command is written with a fresh
/// tag and its response stream is read to completion (or to a `+`
/// continuation request) before the call returns. Results are returned as
/// owned per-call values; only the capability cache and the connection state
/// persist on the client.
#[derive(Debug)]
pub struct Client<T: Read + Write> {
    stream: BufStream<T>,
    tag: u32,
    state: ConnectionState,
    capabilities: Capabilities,
    utf8: bool,
    last_status: Option<(Status, String)>,
    /// Enable debug mode for this connection so that all client-server
    /// interactions are printed to `STDERR`.
    pub debug: bool,
}

/// A transport on which a read timeout can be (re)set after connecting.
pub trait SetReadTimeout {
    /// Set the timeout for subsequent reads; `None` blocks forever.
    ///
    /// A read that times out leaves the session out of sync with the server,
    /// so the connection is no longer usable afterwards and should be
    /// dropped.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

impl SetReadTimeout for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        TcpStream::set_read_timeout(self, timeout).map_err(Error::Io)
    }
}

#[cfg(feature = "native-tls")]
impl SetReadTimeout for TlsStream<TcpStream> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.get_ref().set_read_timeout(timeout).map_err(Error::Io)
    }
}

#[cfg(feature = "rustls-tls")]
impl SetReadTimeout for rustls_connector::TlsStream<TcpStream> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.sock.set_read_timeout(timeout).map_err(Error::Io)
    }
}

impl Client<TcpStream> {
    /// Connect over plain TCP, read the server greeting, and make sure the
    /// capability cache is primed.
    ///
    /// A `PREAUTH` greeting starts the session in the authenticated state; a
    /// `BYE` greeting fails with [`Error::ConnectionLost`].
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Client<TcpStream>> {
        let stream = TcpStream::connect(addr)?;
        let mut client = Client::new(stream);
        client.read_greeting()?;
        if client.capabilities.is_empty() {
            client.capability()?;
        }
        Ok(client)
    }

    /// Upgrade to TLS with `STARTTLS`.
    ///
    /// The capability cache is invalidated by the upgrade, so `CAPABILITY`
    /// is re-issued over the encrypted stream.
    #[cfg(feature = "native-tls")]
    pub fn secure(
        mut self,
        domain: &str,
        ssl_connector: &TlsConnector,
    ) -> Result<Client<TlsStream<TcpStream>>> {
        self.run_command_and_check_ok("STARTTLS")?;
        self.upgrade(|tcp| Ok(ssl_connector.connect(domain, tcp)?))
    }
}

#[cfg(feature = "native-tls")]
impl Client<TlsStream<TcpStream>> {
    /// Connect over implicit TLS (usually port 993), read the greeting, and
    /// prime the capability cache.
    pub fn secure_connect<A: ToSocketAddrs>(
        addr: A,
        domain: &str,
        ssl_connector: &TlsConnector,
    ) -> Result<Client<TlsStream<TcpStream>>> {
        let stream = TcpStream::connect(addr)?;
        let tls = ssl_connector.connect(domain, stream)?;
        let mut client = Client::new(tls);
        client.read_greeting()?;
        if client.capabilities.is_empty() {
            client.capability()?;
        }
        Ok(client)
    }
}

impl<T: Read + Write> Client<T> {
    /// Create a new client over the given transport.
    ///
    /// The greeting has not been read yet; call [`read_greeting`](Self::read_greeting)
    /// (the `connect` constructors do this for you).
    pub fn new(stream: T) -> Client<T> {
        Client {
            stream: BufStream::new(stream),
            tag: 0,
            state: ConnectionState::NotAuthenticated,
            capabilities: Capabilities::default(),
            utf8: false,
            last_status: None,
            debug: false,
        }
    }

    /// The current connection state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The capabilities most recently advertised by the server.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// The condition and text of the most recent tagged or untagged status
    /// line, including `NO`/`BAD`/`BYE` lines.
    pub fn last_status(&self) -> Option<(Status, &str)> {
        self.last_status.as_ref().map(|(s, t)| (*s, t.as_str()))
    }

    /// Read the untagged greeting the server sends on connect.
    ///
    /// `PREAUTH` moves the session to the authenticated state, `BYE` fails
    /// with [`Error::ConnectionLost`], and a `[CAPABILITY ...]` response
    /// code primes the capability cache.
    pub fn read_greeting(&mut self) -> Result<()> {
        let mut raw = Vec::new();
        self.readline(&mut raw)?;
        trim_crlf(&mut raw);
        let line = String::from_utf8_lossy(&raw).into_owned();
        let rest = match line.strip_prefix("* ") {
            Some(rest) => rest,
            None => return Err(Error::Parse(ParseError::Invalid(line))),
        };
        let (word, text) = split_word(rest);
        let status = match Status::parse(word) {
            Some(status) => status,
            None => return Err(Error::Parse(ParseError::Invalid(line.clone()))),
        };
        self.last_status = Some((status, text.trim().to_string()));
        match status {
            Status::PreAuth => self.state = ConnectionState::Authenticated,
            Status::Bye => return Err(Error::ConnectionLost),
            _ => {}
        }
        let mut response = CommandResponse::default();
        self.handle_response_code(text, &mut response);
        Ok(())
    }

    /// Ask the server for its capabilities and replace the cache with the
    /// answer.
    pub fn capability(&mut self) -> Result<Capabilities> {
        self.run_command("CAPABILITY")?;
        Ok(self.capabilities.clone())
    }

    /// Authenticate with `LOGIN` and plaintext credentials.
    ///
    /// Rejected up front when the server advertises `LOGINDISABLED`. On
    /// success the capability cache is refreshed.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let command = format!(
            "LOGIN {} {}",
            validate_str(username)?,
            validate_str(password)?
        );
        self.run_command(&command)?;
        Ok(())
    }

    /// Authenticate with `AUTHENTICATE` and the given SASL mechanism.
    ///
    /// The mechanism must be advertised in the server's `AUTH=` capability
    /// values. `PLAIN` is inlined into the command when `SASL-IR` is
    /// advertised; otherwise the exchange is driven over `+` continuation
    /// requests. Any `NO`/`BAD` aborts the exchange with the server's text.
    pub fn authenticate(
        &mut self,
        mechanism: AuthMechanism,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let sasl_ir = self.capabilities.has("SASL-IR");
        let (initial, continuations) = mechanism.steps(username, password, sasl_ir);
        let mut response = self.run_command(&initial)?;
        if response.continuation.is_none() {
            // completed in one round trip; run_command applied the
            // transition
            return Ok(());
        }
        let mut continuations = continuations.into_iter();
        while let Some(prompt) = response.continuation.take() {
            let payload = match continuations.next() {
                Some(payload) => payload,
                None => return Err(Error::Parse(ParseError::Authentication(prompt))),
            };
            self.write_line(payload.as_bytes())?;
            let tag = self.last_tag();
            response = check_completion(self.read_response(&tag)?)?;
        }
        self.complete_authentication(response.capabilities_updated)
    }

    /// Select a mailbox for access; message-level commands become legal.
    pub fn select(&mut self, mailbox_name: &str) -> Result<Mailbox> {
        let command = format!("SELECT {}", self.quote_mailbox(mailbox_name)?);
        self.run_command(&command).map(|r| mailbox_from(&r))
    }

    /// Like [`select`](Self::select), but read-only.
    pub fn examine(&mut self, mailbox_name: &str) -> Result<Mailbox> {
        let command = format!("EXAMINE {}", self.quote_mailbox(mailbox_name)?);
        self.run_command(&command).map(|r| mailbox_from(&r))
    }

    /// Create a mailbox.
    pub fn create(&mut self, mailbox_name: &str) -> Result<()> {
        let command = format!("CREATE {}", self.quote_mailbox(mailbox_name)?);
        self.run_command_and_check_ok(&command)
    }

    /// Delete a mailbox.
    pub fn delete(&mut self, mailbox_name: &str) -> Result<()> {
        let command = format!("DELETE {}", self.quote_mailbox(mailbox_name)?);
        self.run_command_and_check_ok(&command)
    }

    /// Rename a mailbox.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let command = format!(
            "RENAME {} {}",
            self.quote_mailbox(from)?,
            self.quote_mailbox(to)?
        );
        self.run_command_and_check_ok(&command)
    }

    /// Add a mailbox to the subscription list.
    pub fn subscribe(&mut self, mailbox_name: &str) -> Result<()> {
        let command = format!("SUBSCRIBE {}", self.quote_mailbox(mailbox_name)?);
        self.run_command_and_check_ok(&command)
    }

    /// Remove a mailbox from the subscription list.
    pub fn unsubscribe(&mut self, mailbox_name: &str) -> Result<()> {
        let command = format!("UNSUBSCRIBE {}", self.quote_mailbox(mailbox_name)?);
        self.run_command_and_check_ok(&command)
    }

    /// List mailboxes matching the given reference and pattern.
    pub fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<Name>> {
        let command = format!(
            "LIST {} {}",
            self.quote_mailbox(reference)?,
            self.quote_mailbox(pattern)?
        );
        self.run_command(&command).map(|r| r.names)
    }

    /// List subscribed mailboxes matching the given reference and pattern.
    pub fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<Name>> {
        let command = format!(
            "LSUB {} {}",
            self.quote_mailbox(reference)?,
            self.quote_mailbox(pattern)?
        );
        self.run_command(&command).map(|r| r.names)
    }

    /// Query mailbox attribute counts without selecting it, e.g.
    /// `status("INBOX", "(MESSAGES UNSEEN)")`.
    pub fn status(&mut self, mailbox_name: &str, items: &str) -> Result<MailboxStatus> {
        let command = format!("STATUS {} {}", self.quote_mailbox(mailbox_name)?, items);
        self.run_command(&command).and_then(|r| {
            r.mailbox_status
                .ok_or_else(|| Error::Parse(ParseError::Status("response carried no STATUS data".to_string())))
        })
    }

    /// Request a checkpoint of the selected mailbox.
    pub fn check(&mut self) -> Result<()> {
        self.run_command_and_check_ok("CHECK")
    }

    /// Close the selected mailbox, expunging `\Deleted` messages without
    /// reporting them.
    pub fn close(&mut self) -> Result<()> {
        self.run_command_and_check_ok("CLOSE")
    }

    /// Permanently remove `\Deleted` messages; returns the expunged sequence
    /// numbers in arrival order.
    pub fn expunge(&mut self) -> Result<Vec<Seq>> {
        self.run_command("EXPUNGE").map(|r| r.expunged)
    }

    /// Search the selected mailbox, returning matching sequence numbers.
    pub fn search(&mut self, query: &str) -> Result<Vec<Seq>> {
        let command = format!("SEARCH {}", query);
        self.run_command(&command).map(|r| r.search)
    }

    /// Like [`search`](Self::search), returning UIDs.
    pub fn uid_search(&mut self, query: &str) -> Result<Vec<Uid>> {
        let command = format!("UID SEARCH {}", query);
        self.run_command(&command).map(|r| r.search)
    }

    /// Fetch data items for the given sequence set, e.g.
    /// `fetch("1:5", "(FLAGS ENVELOPE)")`.
    pub fn fetch(&mut self, sequence_set: &str, query: &str) -> Result<Vec<Fetch>> {
        let command = format!("FETCH {} {}", sequence_set, query);
        self.run_command(&command).map(|r| r.fetches)
    }

    /// Like [`fetch`](Self::fetch), addressing messages by UID.
    pub fn uid_fetch(&mut self, uid_set: &str, query: &str) -> Result<Vec<Fetch>> {
        let command = format!("UID FETCH {} {}", uid_set, query);
        self.run_command(&command).map(|r| r.fetches)
    }

    /// Alter message flags, e.g. `store("2", "+FLAGS (\\Seen)")`. The
    /// server's untagged `FETCH` replies report the new flags.
    pub fn store(&mut self, sequence_set: &str, query: &str) -> Result<Vec<Fetch>> {
        let command = format!("STORE {} {}", sequence_set, query);
        self.run_command(&command).map(|r| r.fetches)
    }

    /// Like [`store`](Self::store), addressing messages by UID.
    pub fn uid_store(&mut self, uid_set: &str, query: &str) -> Result<Vec<Fetch>> {
        let command = format!("UID STORE {} {}", uid_set, query);
        self.run_command(&command).map(|r| r.fetches)
    }

    /// Copy messages into another mailbox.
    pub fn copy(&mut self, sequence_set: &str, mailbox_name: &str) -> Result<()> {
        let command = format!("COPY {} {}", sequence_set, self.quote_mailbox(mailbox_name)?);
        self.run_command_and_check_ok(&command)
    }

    /// Like [`copy`](Self::copy), addressing messages by UID.
    pub fn uid_copy(&mut self, uid_set: &str, mailbox_name: &str) -> Result<()> {
        let command = format!(
            "UID COPY {} {}",
            uid_set,
            self.quote_mailbox(mailbox_name)?
        );
        self.run_command_and_check_ok(&command)
    }

    /// Do nothing, usefully: polls for unilateral server updates.
    pub fn noop(&mut self) -> Result<()> {
        self.run_command_and_check_ok("NOOP")
    }

    /// End the session. The server replies with an untagged `BYE` before the
    /// tagged completion.
    pub fn logout(&mut self) -> Result<()> {
        self.run_command_and_check_ok("LOGOUT")
    }

    /// Switch mailbox naming to UTF-8 if the server offers it.
    ///
    /// Sends `ENABLE UTF8=ACCEPT`/`ALL`/`ONLY` per the advertised `UTF8`
    /// capability values and returns whether UTF-8 naming is now active.
    /// Before this, mailbox names are converted to and from modified UTF-7.
    pub fn enable_utf8(&mut self) -> Result<bool> {
        let mode = if self.capabilities.has_value("UTF8", "ACCEPT") {
            "ACCEPT"
        } else if self.capabilities.has_value("UTF8", "ALL") {
            "ALL"
        } else if self.capabilities.has_value("UTF8", "ONLY") {
            "ONLY"
        } else {
            return Ok(false);
        };
        let command = format!("ENABLE UTF8={}", mode);
        self.run_command_and_check_ok(&command)?;
        self.utf8 = true;
        Ok(true)
    }

    /// Run a raw command and discard its data.
    pub fn run_command_and_check_ok(&mut self, command: &str) -> Result<()> {
        self.run_command(command).map(|_| ())
    }

    /// Run a raw command and return everything its response stream carried.
    ///
    /// The command is validated (no CR/LF) and checked against the state
    /// table before anything is written. `NO` and `BAD` completions surface
    /// as [`Error::No`] and [`Error::Bad`] with the server's text.
    pub fn run_command_and_read_response(&mut self, command: &str) -> Result<CommandResponse> {
        self.run_command(command)
    }

    fn run_command(&mut self, command: &str) -> Result<CommandResponse> {
        let command = command.trim();
        if command.contains('\n') {
            return Err(Error::Validate(ValidateError::IllegalChar('\n')));
        }
        if command.contains('\r') {
            return Err(Error::Validate(ValidateError::IllegalChar('\r')));
        }
        let (verb, args) = split_word(command);
        let verb = verb.to_ascii_uppercase();
        self.check_state(&verb, args)?;

        self.tag += 1;
        let tag = self.last_tag();
        let line = if args.is_empty() {
            format!("{} {}", tag, verb)
        } else {
            format!("{} {} {}", tag, verb, args)
        };
        self.write_line(line.as_bytes())?;

        let response = self.read_response(&tag)?;
        if response.continuation.is_some() {
            return Ok(response);
        }
        let response = check_completion(response)?;
        self.apply_transitions(&verb, args, &response)?;
        Ok(response)
    }

    /// The gate: reject a command that is illegal in the current state
    /// before any I/O happens.
    fn check_state(&self, verb: &str, args: &str) -> Result<()> {
        let class = match command_class(verb) {
            Some(class) => class,
            None => return Ok(()),
        };
        if !self.state.satisfies(class) {
            return Err(Error::State(StateError {
                command: verb.to_string(),
                required: class,
                state: self.state.clone(),
            }));
        }
        if verb == "AUTHENTICATE" {
            let (mechanism, _) = split_word(args);
            if !self.capabilities.has_value("AUTH", mechanism) {
                return Err(Error::Validate(ValidateError::UnsupportedMechanism(
                    mechanism.to_string(),
                )));
            }
        } else if verb == "LOGIN" && self.capabilities.has("LOGINDISABLED") {
            return Err(Error::Validate(ValidateError::LoginDisabled));
        }
        Ok(())
    }

    fn apply_transitions(
        &mut self,
        verb: &str,
        args: &str,
        response: &CommandResponse,
    ) -> Result<()> {
        match verb {
            "SELECT" | "EXAMINE" => {
                let (mailbox, _) = split_word(args);
                self.state = ConnectionState::Selected {
                    mailbox: mailbox.trim_matches('"').to_string(),
                    readonly: verb == "EXAMINE" || response.read_only,
                };
            }
            "CLOSE" => self.state = ConnectionState::Authenticated,
            "LOGOUT" => self.state = ConnectionState::NotAuthenticated,
            "LOGIN" | "AUTHENTICATE" => {
                self.complete_authentication(response.capabilities_updated)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn complete_authentication(&mut self, capabilities_updated: bool) -> Result<()> {
        self.state = ConnectionState::Authenticated;
        // capabilities usually change across the authentication boundary;
        // skip the round trip when the completion already carried them
        if !capabilities_updated {
            self.run_command("CAPABILITY")?;
        }
        Ok(())
    }

    fn quote_mailbox(&self, name: &str) -> Result<String> {
        if self.utf8 {
            validate_str(name)
        } else {
            validate_str(&encode_utf7_imap(name))
        }
    }

    /// Read response lines until the tagged completion for `tag`, or a `+`
    /// continuation request, demultiplexing untagged data on the way.
    fn read_response(&mut self, tag: &str) -> Result<CommandResponse> {
        let mut response = CommandResponse::default();
        let mut fetches: BTreeMap<Seq, Vec<Vec<u8>>> = BTreeMap::new();
        let mut open_fetch: Option<Seq> = None;

        loop {
            let mut raw = Vec::new();
            self.readline(&mut raw)?;
            trim_crlf(&mut raw);
            let line = String::from_utf8_lossy(&raw).into_owned();
            let (head, rest) = split_word(&line);

            if head == "+" {
                response.continuation = Some(rest.trim().to_string());
                return Ok(response);
            }
            if head == "*" {
                self.handle_untagged(rest, &mut response, &mut fetches, &mut open_fetch)?;
                continue;
            }
            if head == tag {
                let (word, text) = split_word(rest);
                let status = match Status::parse(word) {
                    Some(status) => status,
                    None => return Err(Error::Parse(ParseError::Invalid(line.clone()))),
                };
                self.last_status = Some((status, text.trim().to_string()));
                self.handle_response_code(text, &mut response);
                response.status = Some(status);
                response.text = text.trim().to_string();
                break;
            }
            // anything else is trailing data of the FETCH item still being
            // assembled, or noise to skip
            if let Some(seq) = open_fetch {
                if let Some(chunks) = fetches.get_mut(&seq) {
                    chunks.push(raw);
                }
            }
        }

        response.fetches = parse_fetches(&fetches)?;
        Ok(response)
    }

    fn handle_untagged(
        &mut self,
        rest: &str,
        response: &mut CommandResponse,
        fetches: &mut BTreeMap<Seq, Vec<Vec<u8>>>,
        open_fetch: &mut Option<Seq>,
    ) -> Result<()> {
        let (code, remainder) = split_word(rest);

        if let Ok(number) = code.parse::<u32>() {
            let (keyword, data) = split_word(remainder);
            match keyword {
                "EXISTS" => response.exists = Some(number),
                "RECENT" => response.recent = Some(number),
                "EXPUNGE" => response.expunged.push(number),
                "FETCH" => {
                    let chunks = fetches.entry(number).or_default();
                    let mut line = data.as_bytes().to_vec();
                    loop {
                        let literal = literal_length(&line);
                        chunks.push(line);
                        let declared = match literal {
                            Some(declared) => declared,
                            None => break,
                        };
                        let payload = self.read_literal(declared)?;
                        chunks.push(payload);
                        let mut raw = Vec::new();
                        self.readline(&mut raw)?;
                        trim_crlf(&mut raw);
                        line = raw;
                    }
                    *open_fetch = Some(number);
                }
                _ => {}
            }
            return Ok(());
        }

        if code == "CAPABILITY" {
            self.capabilities = parse_capabilities(remainder);
            response.capabilities_updated = true;
            return Ok(());
        }

        if let Some(status) = Status::parse(code) {
            self.last_status = Some((status, remainder.trim().to_string()));
            self.handle_response_code(remainder, response);
            return Ok(());
        }

        match code {
            "LIST" | "LSUB" => response.names.push(parse_name(remainder, self.utf8)?),
            "STATUS" => response.mailbox_status = Some(parse_status(remainder)?),
            "SEARCH" => response.search.extend(parse_search(remainder)),
            "FLAGS" => response.flags = parse_flags(remainder)?,
            // unknown untagged data is skipped, not fatal
            _ => {}
        }
        Ok(())
    }

    /// Interpret a `[CODE args]` response code on a status line.
    fn handle_response_code(&mut self, text: &str, response: &mut CommandResponse) {
        let caps = match RESPONSE_CODE.captures(text) {
            Some(caps) => caps,
            None => return,
        };
        let inner = caps[1].to_string();
        let (code, args) = split_word(&inner);
        match code {
            "CAPABILITY" => {
                self.capabilities = parse_capabilities(args);
                response.capabilities_updated = true;
            }
            "PERMANENTFLAGS" => {
                response.permanent_flags = parse_flags(args).unwrap_or_default();
            }
            "BADCHARSET" => response.bad_charset = parse_flags(args).unwrap_or_default(),
            "READ-ONLY" => response.read_only = true,
            "READ-WRITE" => response.read_write = true,
            "UIDNEXT" => response.uid_next = args.trim().parse().ok(),
            "UIDVALIDITY" => response.uid_validity = args.trim().parse().ok(),
            "UNSEEN" => response.unseen = args.trim().parse().ok(),
            _ => response.codes.push((code.to_string(), args.to_string())),
        }
    }

    /// Read exactly `n` octets of literal payload off the stream.
    fn read_literal(&mut self, declared: usize) -> Result<Vec<u8>> {
        let mut payload = vec![0; declared];
        let mut have = 0;
        while have < declared {
            match self.stream.read(&mut payload[have..]) {
                Ok(0) => {
                    return Err(Error::Parse(ParseError::LiteralLengthMismatch {
                        declared,
                        got: have,
                    }))
                }
                Ok(n) => have += n,
                Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(Error::Parse(ParseError::LiteralLengthMismatch {
                        declared,
                        got: have,
                    }))
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
        if self.debug {
            eprint!("S: {}", String::from_utf8_lossy(&payload));
        }
        Ok(payload)
    }

    fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        let read = self.stream.read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }
        if self.debug {
            eprint!("S: {}", String::from_utf8_lossy(&into[into.len() - read..]));
        }
        Ok(read)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        if self.debug {
            eprintln!("C: {}", String::from_utf8_lossy(buf));
        }
        Ok(())
    }

    fn last_tag(&self) -> String {
        format!("{:04}", self.tag)
    }

    /// Rebuild the client around an encrypted stream after `STARTTLS`.
    ///
    /// The tag counter, connection state and last-status fields carry over
    /// so tags stay unique for the lifetime of the connection; the
    /// capability cache does not survive the upgrade, so `CAPABILITY` is
    /// re-issued over the new stream.
    pub(crate) fn upgrade<C, F>(self, wrap: F) -> Result<Client<C>>
    where
        C: Read + Write,
        F: FnOnce(T) -> Result<C>,
    {
        let Client {
            stream,
            tag,
            state,
            utf8,
            last_status,
            debug,
            ..
        } = self;
        let tls = wrap(stream.into_inner()?)?;
        let mut client = Client {
            stream: BufStream::new(tls),
            tag,
            state,
            capabilities: Capabilities::default(),
            utf8,
            last_status,
            debug,
        };
        client.capability()?;
        Ok(client)
    }
}

impl<T: SetReadTimeout + Read + Write> Client<T> {
    /// Set the read deadline on the underlying transport.
    ///
    /// A read that hits the deadline fails with [`Error::Io`] and leaves the
    /// session out of sync with the server; drop the client afterwards.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.get_mut().set_read_timeout(timeout)
    }
}
