//! SASL mechanism selection and exchange payloads for `AUTHENTICATE`.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, ValidateError};

/// The authentication mechanisms the client can drive.
///
/// Anything else, including mechanisms that are recognizable but not
/// implemented (`XOAUTH2`, `XOAUTHBEARER`, `PLAIN-CLIENTTOKEN`, `CRAM-MD5`),
/// fails validation before any I/O happens.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthMechanism {
    /// SASL `PLAIN` (RFC 4616): a single `\0user\0password` payload, inlined
    /// into the command when the server advertises `SASL-IR`.
    Plain,
    /// `LOGIN`: username and password sent as two separate continuation
    /// payloads. Also the fallback when no mechanism is configured.
    Login,
    /// Original `XOAUTH`: a single bearer-token command line with no
    /// continuation round-trips.
    Xoauth,
}

impl AuthMechanism {
    /// The mechanism name as it appears in `AUTH=` capability values.
    pub fn name(&self) -> &'static str {
        match self {
            AuthMechanism::Plain => "PLAIN",
            AuthMechanism::Login => "LOGIN",
            AuthMechanism::Xoauth => "XOAUTH",
        }
    }

    /// The initial `AUTHENTICATE` command and the payloads to send for each
    /// subsequent continuation request, in order.
    pub(crate) fn steps(
        &self,
        username: &str,
        password: &str,
        sasl_ir: bool,
    ) -> (String, Vec<String>) {
        match self {
            AuthMechanism::Plain => {
                let payload = STANDARD.encode(format!("\0{}\0{}", username, password));
                if sasl_ir {
                    (format!("AUTHENTICATE PLAIN {}", payload), Vec::new())
                } else {
                    ("AUTHENTICATE PLAIN".to_string(), vec![payload])
                }
            }
            AuthMechanism::Login => (
                "AUTHENTICATE LOGIN".to_string(),
                vec![STANDARD.encode(username), STANDARD.encode(password)],
            ),
            AuthMechanism::Xoauth => {
                let token = format!("user={}\x01auth=Bearer {}\x01\x01", username, password);
                (
                    format!("AUTHENTICATE XOAUTH {}", STANDARD.encode(token)),
                    Vec::new(),
                )
            }
        }
    }
}

impl FromStr for AuthMechanism {
    type Err = Error;

    fn from_str(s: &str) -> Result<AuthMechanism, Error> {
        match s.to_ascii_uppercase().as_str() {
            "PLAIN" => Ok(AuthMechanism::Plain),
            "LOGIN" => Ok(AuthMechanism::Login),
            "XOAUTH" => Ok(AuthMechanism::Xoauth),
            other => Err(Error::Validate(ValidateError::UnsupportedMechanism(
                other.to_string(),
            ))),
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_inlines_with_sasl_ir() {
        let (initial, continuations) = AuthMechanism::Plain.steps("user", "pass", true);
        assert_eq!(initial, "AUTHENTICATE PLAIN AHVzZXIAcGFzcw==");
        assert!(continuations.is_empty());
    }

    #[test]
    fn plain_uses_a_continuation_without_sasl_ir() {
        let (initial, continuations) = AuthMechanism::Plain.steps("user", "pass", false);
        assert_eq!(initial, "AUTHENTICATE PLAIN");
        assert_eq!(continuations, ["AHVzZXIAcGFzcw=="]);
    }

    #[test]
    fn login_sends_credentials_in_two_steps() {
        let (initial, continuations) = AuthMechanism::Login.steps("user", "pass", true);
        assert_eq!(initial, "AUTHENTICATE LOGIN");
        assert_eq!(continuations, ["dXNlcg==", "cGFzcw=="]);
    }

    #[test]
    fn xoauth_is_a_single_line() {
        let (initial, continuations) =
            AuthMechanism::Xoauth.steps("user@example.com", "token", false);
        assert!(initial.starts_with("AUTHENTICATE XOAUTH "));
        assert!(continuations.is_empty());
        let payload = initial.rsplit(' ').next().unwrap();
        let decoded = STANDARD.decode(payload).unwrap();
        assert_eq!(
            decoded,
            b"user=user@example.com\x01auth=Bearer token\x01\x01"
        );
    }

    #[test]
    fn unimplemented_mechanisms_fail_validation() {
        for name in ["XOAUTH2", "XOAUTHBEARER", "PLAIN-CLIENTTOKEN", "CRAM-MD5"] {
            assert!(matches!(
                name.parse::<AuthMechanism>(),
                Err(Error::Validate(ValidateError::UnsupportedMechanism(_)))
            ));
        }
    }

    #[test]
    fn mechanism_names_parse_case_insensitively() {
        assert_eq!("plain".parse::<AuthMechanism>().unwrap(), AuthMechanism::Plain);
        assert_eq!("Login".parse::<AuthMechanism>().unwrap(), AuthMechanism::Login);
        assert_eq!("XOAUTH".parse::<AuthMechanism>().unwrap(), AuthMechanism::Xoauth);
    }
}
