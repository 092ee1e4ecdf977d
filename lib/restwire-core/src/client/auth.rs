use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::request::BuiltRequest;

/// Credentials that cannot be sent as a request header.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum AuthenticationError {
    /// The credentials are not valid header content.
    #[display("{scheme} credentials rejected: {reason}")]
    InvalidCredentials {
        /// `Bearer`, `Basic` or `ApiKey`.
        scheme: &'static str,
        /// What is wrong with them.
        reason: String,
    },

    /// The API key header name is not a valid HTTP header name.
    #[display("'{header_name}' is not a valid header name")]
    InvalidHeaderName {
        /// The rejected name.
        header_name: String,
    },
}

/// Pre-send hook mutating a request, typically to add credentials.
///
/// Resolved per method, then per interface, then from the client default;
/// [`NoAuth`] is used when none is configured.
pub trait AuthProvider: Send + Sync + fmt::Debug {
    /// Applies authentication to the request, once per call, before the first attempt.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthenticationError`] if the credentials cannot be expressed as headers.
    fn apply(&self, request: &mut BuiltRequest) -> Result<(), AuthenticationError>;
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn apply(&self, _request: &mut BuiltRequest) -> Result<(), AuthenticationError> {
        Ok(())
    }
}

/// A secret, zeroed when dropped.
///
/// `Debug` never shows it; `Display` shows at most its first and last four characters.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize, derive_more::From)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    /// The secret itself.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString(***)")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars = self.0.chars().collect::<Vec<_>>();
        if chars.len() <= 8 {
            return f.write_str("***");
        }
        let head = chars.iter().take(4).collect::<String>();
        let tail = chars.iter().skip(chars.len() - 4).collect::<String>();
        write!(f, "{head}...{tail}")
    }
}

/// Header based credentials.
///
/// ```rust
/// use restwire_core::{Authentication, MethodDescriptor};
///
/// let method = MethodDescriptor::get("me", "/me")
///     .auth(Authentication::Bearer("my-api-token".into()));
///
/// let api_key = Authentication::ApiKey {
///     header_name: "X-API-Key".to_string(),
///     key: "secret-key".into(),
/// };
/// assert_eq!(api_key.to_string(), "X-API-Key: secr...-key");
/// # drop(method);
/// ```
#[derive(Clone, Serialize, Deserialize, derive_more::Debug, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Authentication {
    /// `Authorization: Bearer <token>`.
    #[display("Bearer {_0}")]
    Bearer(#[debug(skip)] SecureString),

    /// `Authorization: Basic <base64(username:password)>`.
    #[display("Basic {username}:***")]
    Basic {
        /// The username, must not contain `:`.
        username: String,
        /// The password.
        #[debug(skip)]
        password: SecureString,
    },

    /// `<header_name>: <key>`.
    #[display("{header_name}: {key}")]
    ApiKey {
        /// The header carrying the key.
        header_name: String,
        /// The key.
        #[debug(skip)]
        key: SecureString,
    },
}

impl Authentication {
    /// The header name and value sent for these credentials.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthenticationError`] if they are not valid header content.
    pub fn header(&self) -> Result<(String, String), AuthenticationError> {
        let (scheme, name, value) = match self {
            Self::Bearer(token) => (
                "Bearer",
                "Authorization".to_string(),
                format!("Bearer {}", token.expose()),
            ),
            Self::Basic { username, password } => {
                if username.contains(':') {
                    return Err(AuthenticationError::InvalidCredentials {
                        scheme: "Basic",
                        reason: format!("username '{username}' contains ':'"),
                    });
                }
                let encoded = STANDARD.encode(format!("{username}:{}", password.expose()));
                ("Basic", "Authorization".to_string(), format!("Basic {encoded}"))
            }
            Self::ApiKey { header_name, key } => {
                HeaderName::from_bytes(header_name.as_bytes()).map_err(|_| {
                    AuthenticationError::InvalidHeaderName {
                        header_name: header_name.clone(),
                    }
                })?;
                ("ApiKey", header_name.clone(), key.expose().to_string())
            }
        };

        HeaderValue::from_str(&value).map_err(|err| AuthenticationError::InvalidCredentials {
            scheme,
            reason: err.to_string(),
        })?;
        Ok((name, value))
    }
}

impl AuthProvider for Authentication {
    fn apply(&self, request: &mut BuiltRequest) -> Result<(), AuthenticationError> {
        let (name, value) = self.header()?;
        request.headers.insert(name, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use insta::{assert_debug_snapshot, assert_snapshot};

    use super::*;
    use crate::client::request::tests::request_for;

    #[test]
    fn test_bearer_sets_authorization() {
        let mut request = request_for("http://api.test/users");

        Authentication::Bearer("my-secret-token".into())
            .apply(&mut request)
            .expect("valid token");

        assert_eq!(
            request.headers.get("authorization"),
            Some("Bearer my-secret-token")
        );
    }

    #[test]
    fn test_basic_encodes_credentials() {
        let mut request = request_for("http://api.test/users");
        let auth = Authentication::Basic {
            username: "ann".to_string(),
            password: "s3cr3t".into(),
        };

        auth.apply(&mut request).expect("valid credentials");

        assert_eq!(
            request.headers.get("Authorization"),
            Some("Basic YW5uOnMzY3IzdA==")
        );
    }

    #[test]
    fn test_api_key_overrides_declared_header() {
        let mut request = request_for("http://api.test/users");
        request.headers.insert("x-tenant-key", "from-declaration");

        Authentication::ApiKey {
            header_name: "X-Tenant-Key".to_string(),
            key: "k-123".into(),
        }
        .apply(&mut request)
        .expect("valid key");

        assert_eq!(request.headers.get("x-tenant-key"), Some("k-123"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_no_auth_is_a_no_op() {
        let mut request = request_for("http://api.test/users");

        NoAuth.apply(&mut request).expect("no-op");

        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_rejected_credentials_leave_request_untouched() {
        let mut request = request_for("http://api.test/users");

        let bearer = Authentication::Bearer("line\nbreak".into())
            .apply(&mut request)
            .expect_err("control character");
        let basic = Authentication::Basic {
            username: "ann:admin".to_string(),
            password: "pass".into(),
        }
        .apply(&mut request)
        .expect_err("colon in username");
        let api_key = Authentication::ApiKey {
            header_name: "X Tenant".to_string(),
            key: "key".into(),
        }
        .apply(&mut request)
        .expect_err("space in header name");

        assert!(matches!(
            bearer,
            AuthenticationError::InvalidCredentials {
                scheme: "Bearer",
                ..
            }
        ));
        assert_snapshot!(basic, @"Basic credentials rejected: username 'ann:admin' contains ':'");
        assert_snapshot!(api_key, @"'X Tenant' is not a valid header name");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_secrets_are_masked() {
        let bearer = Authentication::Bearer("very-secret-token-12345".into());
        let basic = Authentication::Basic {
            username: "ann".to_string(),
            password: "pass".into(),
        };

        assert_snapshot!(bearer, @"Bearer very...2345");
        assert_snapshot!(basic, @"Basic ann:***");
        assert_debug_snapshot!(basic, @r#"
        Basic {
            username: "ann",
            ..
        }
        "#);
        assert_debug_snapshot!(SecureString::from("short"), @"SecureString(***)");
    }

    #[test]
    fn test_deserialize_from_config() {
        let auth: Authentication =
            serde_json::from_str(r#"{"bearer":"token-from-file"}"#).expect("deserializable");

        let (name, value) = auth.header().expect("valid token");

        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer token-from-file");
    }
}
