//! An immutable HTTP cookie, rendered as a `Set-Cookie` header value
//! following RFC 6265.
use std::fmt;

use hyper::header::{HeaderValue, InvalidHeaderValue};

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cookie key could not be empty")]
    EmptyKey,

    #[error("cookie is not a valid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
}

/// A cookie to send to the client.
///
/// Key and value are form-encoded: spaces become `+` and every other byte
/// outside `A-Z a-z 0-9 - _ . ~` is percent-encoded.
///
/// ```rust
/// use routecore::Cookie;
///
/// let cookie = Cookie::new("session", "a b/c")?
///     .max_age(3600)
///     .path("/")
///     .http_only();
///
/// assert_eq!(cookie.to_string(), "session=a+b%2Fc; Max-Age=3600; Path=/; HttpOnly");
/// # Ok::<(), routecore::CookieError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    key: String,
    value: String,
    max_age: Option<i64>,
    path: Option<String>,
    domain: Option<String>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, CookieError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CookieError::EmptyKey);
        }

        Ok(Self {
            key,
            value: value.into(),
            max_age: None,
            path: None,
            domain: None,
            secure: false,
            http_only: false,
        })
    }

    /// Lifetime of the cookie in seconds.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Only send the cookie over HTTPS.
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Hide the cookie from client-side scripts.
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The cookie as a `Set-Cookie` header value.
    pub fn header_value(&self) -> Result<HeaderValue, CookieError> {
        Ok(HeaderValue::from_str(&self.to_string())?)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}",
            form_encode(&self.key),
            form_encode(&self.value)
        )?;

        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if let Some(ref path) = self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(ref domain) = self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }

        Ok(())
    }
}

fn form_encode(s: &str) -> String {
    // a literal '+' is already %2B, so the replacement cannot collide
    urlencoding::encode(s).replace("%20", "+")
}
