//! Connection setup: TCP, implicit TLS, and `STARTTLS` upgrades.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(feature = "native-tls")]
use native_tls::{TlsConnector, TlsStream};
#[cfg(feature = "rustls-tls")]
use rustls_connector::{RustlsConnector, TlsStream as RustlsStream};

use crate::client::Client;
use crate::error::{Error, Result};

/// A convenience builder for [`Client`] structs over various encrypted
/// transports.
///
/// Creating a [`Client`] over the default `native-tls` transport:
/// ```no_run
/// # use mailbox_imap::ClientBuilder;
/// # fn main() -> Result<(), mailbox_imap::Error> {
/// let client = ClientBuilder::new("imap.example.com", 993).native_tls()?;
/// # Ok(())
/// # }
/// ```
///
/// To use `STARTTLS`, call `starttls()` before one of the
/// [`Client`]-yielding functions:
/// ```no_run
/// # use mailbox_imap::ClientBuilder;
/// # fn main() -> Result<(), mailbox_imap::Error> {
/// let client = ClientBuilder::new("imap.example.com", 143)
///     .starttls()
///     .native_tls()?;
/// # Ok(())
/// # }
/// ```
///
/// The yielded client has read the greeting and has its capability cache
/// primed; authenticate with [`Client::login`] or [`Client::authenticate`].
pub struct ClientBuilder<D>
where
    D: AsRef<str>,
{
    domain: D,
    port: u16,
    starttls: bool,
    timeout: Option<Duration>,
}

impl<D> ClientBuilder<D>
where
    D: AsRef<str>,
{
    /// Make a new `ClientBuilder` using the given domain and port.
    pub fn new(domain: D, port: u16) -> Self {
        ClientBuilder {
            domain,
            port,
            starttls: false,
            timeout: None,
        }
    }

    /// Use `STARTTLS` for this connection.
    pub fn starttls(&mut self) -> &mut Self {
        self.starttls = true;
        self
    }

    /// Bound both the TCP connect and subsequent reads by the given
    /// timeout.
    ///
    /// A read that times out leaves the session out of sync, so the client
    /// is no longer usable after such an error.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return a new [`Client`] using a `native-tls` transport.
    #[cfg(feature = "native-tls")]
    pub fn native_tls(&mut self) -> Result<Client<TlsStream<TcpStream>>> {
        self.connect(|domain, tcp| {
            let ssl_conn = TlsConnector::builder().build()?;
            Ok(ssl_conn.connect(domain, tcp)?)
        })
    }

    /// Return a new [`Client`] using a `rustls` transport.
    #[cfg(feature = "rustls-tls")]
    pub fn rustls(&mut self) -> Result<Client<RustlsStream<TcpStream>>> {
        self.connect(|domain, tcp| {
            let ssl_conn = RustlsConnector::new_with_native_certs()?;
            Ok(ssl_conn.connect(domain, tcp)?)
        })
    }

    /// Return a new [`Client`] over plain TCP, without encryption.
    ///
    /// Only appropriate for test servers on localhost.
    pub fn insecure(&mut self) -> Result<Client<TcpStream>> {
        let tcp = self.tcp()?;
        let mut client = Client::new(tcp);
        client.read_greeting()?;
        if client.capabilities().is_empty() {
            client.capability()?;
        }
        Ok(client)
    }

    /// Make a [`Client`] using a custom TLS initialization, for setups that
    /// need private CAs or other specific TLS parameters.
    ///
    /// The `handshake` closure receives the domain and the connected
    /// [`TcpStream`] and returns the encrypted stream, such as a
    /// [`native_tls::TlsStream`]. With [`starttls`](Self::starttls) the
    /// socket handed to `handshake` has already completed the `STARTTLS`
    /// exchange.
    pub fn connect<F, C>(&mut self, handshake: F) -> Result<Client<C>>
    where
        F: FnOnce(&str, TcpStream) -> Result<C>,
        C: Read + Write,
    {
        if self.starttls {
            let tcp = self.tcp()?;
            let mut client = Client::new(tcp);
            client.read_greeting()?;
            client.run_command_and_check_ok("STARTTLS")?;
            client.upgrade(|tcp| handshake(self.domain.as_ref(), tcp))
        } else {
            let tcp = self.tcp()?;
            let tls = handshake(self.domain.as_ref(), tcp)?;
            let mut client = Client::new(tls);
            client.read_greeting()?;
            if client.capabilities().is_empty() {
                client.capability()?;
            }
            Ok(client)
        }
    }

    fn tcp(&self) -> Result<TcpStream> {
        match self.timeout {
            None => Ok(TcpStream::connect((self.domain.as_ref(), self.port))?),
            Some(timeout) => {
                let mut last_err = None;
                for addr in (self.domain.as_ref(), self.port).to_socket_addrs()? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(tcp) => {
                            tcp.set_read_timeout(Some(timeout))?;
                            return Ok(tcp);
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                Err(last_err.map(Error::Io).unwrap_or(Error::ConnectionLost))
            }
        }
    }
}
