//! Submitted credential claims.

use std::collections::HashMap;
use std::fmt;

use zeroize::Zeroizing;

/// Token type of [`AuthenticationToken::username_password`].
pub const USERNAME_PASSWORD: &str = "username_password";

/// Token type of [`AuthenticationToken::bearer`].
pub const BEARER: &str = "bearer";

/// Secret bytes that are wiped on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Zeroizing<Vec<u8>>);

impl Credential {
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Raw bytes. Callers must not log them.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<Vec<u8>> for Credential {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl From<&[u8]> for Credential {
    fn from(v: &[u8]) -> Self {
        Self::new(v)
    }
}

/// A credential claim presented for verification. Immutable once built.
#[derive(Debug, Clone)]
pub struct AuthenticationToken {
    token_type: String,
    principal_hint: String,
    credential: Credential,
    host: Option<String>,
    remember_me: bool,
    metadata: HashMap<String, String>,
}

impl AuthenticationToken {
    #[must_use]
    pub fn builder(token_type: &str) -> AuthenticationTokenBuilder {
        AuthenticationTokenBuilder {
            token_type: token_type.to_owned(),
            ..AuthenticationTokenBuilder::default()
        }
    }

    /// Username/password claim.
    #[must_use]
    pub fn username_password(username: &str, password: impl Into<Credential>) -> Self {
        Self::builder(USERNAME_PASSWORD)
            .principal_hint(username)
            .credential(password)
            .build()
    }

    /// Opaque bearer token claim. The principal is unknown until a realm resolves it.
    #[must_use]
    pub fn bearer(token: impl Into<Credential>) -> Self {
        Self::builder(BEARER).credential(token).build()
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The claimed identity. Safe to log.
    #[must_use]
    pub fn principal_hint(&self) -> &str {
        &self.principal_hint
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}

#[derive(Default)]
pub struct AuthenticationTokenBuilder {
    token_type: String,
    principal_hint: String,
    credential: Credential,
    host: Option<String>,
    remember_me: bool,
    metadata: HashMap<String, String>,
}

impl AuthenticationTokenBuilder {
    #[must_use]
    pub fn principal_hint(mut self, hint: &str) -> Self {
        hint.clone_into(&mut self.principal_hint);
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: impl Into<Credential>) -> Self {
        self.credential = credential.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_owned());
        self
    }

    #[must_use]
    pub fn remember_me(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> AuthenticationToken {
        AuthenticationToken {
            token_type: self.token_type,
            principal_hint: self.principal_hint,
            credential: self.credential,
            host: self.host,
            remember_me: self.remember_me,
            metadata: self.metadata,
        }
    }
}
