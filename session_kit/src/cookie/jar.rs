use chrono::Duration;
use headers::HeaderMapExt;
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};

use super::codec::{CookieCodec, TokenCodec};
use super::errors::CookieError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl std::str::FromStr for SameSite {
    type Err = CookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            other => Err(CookieError::Format(format!("Unknown SameSite value: {other}"))),
        }
    }
}

/// Attributes written alongside a cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub name: String,
    pub path: String,
    pub domain: Option<String>,
    /// `None` produces a browser-session cookie.
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl CookieOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: "/".to_string(),
            domain: None,
            max_age: None,
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }

    fn render(&self, value: &str, max_age: Option<i64>) -> String {
        let mut cookie = format!("{}={value}; Path={}", self.name, self.path);
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={domain}"));
        }
        if let Some(max_age) = max_age {
            cookie.push_str(&format!("; Max-Age={max_age}"));
            if max_age <= 0 {
                cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
            }
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie
    }
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: String) -> Result<(), CookieError> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|_| CookieError::Header("Failed to parse cookie".to_string()))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

/// Writes a plain `Set-Cookie` header.
pub fn set_cookie(
    headers: &mut HeaderMap,
    options: &CookieOptions,
    value: &str,
) -> Result<(), CookieError> {
    let max_age = options.max_age.map(whole_seconds_ceil);
    append_set_cookie(headers, options.render(value, max_age))
}

/// Sub-second remainders round up so a short positive lifetime never reads
/// as an immediate deletion.
fn whole_seconds_ceil(duration: Duration) -> i64 {
    let seconds = duration.num_seconds();
    if duration > Duration::seconds(seconds) {
        seconds + 1
    } else {
        seconds
    }
}

pub fn set_signed_cookie(
    headers: &mut HeaderMap,
    codec: &CookieCodec,
    options: &CookieOptions,
    value: &str,
) -> Result<(), CookieError> {
    let signed = codec.sign(value)?;
    set_cookie(headers, options, &signed)
}

pub fn set_encrypted_cookie(
    headers: &mut HeaderMap,
    codec: &dyn TokenCodec,
    options: &CookieOptions,
    value: &str,
) -> Result<(), CookieError> {
    let sealed = codec.encrypt(value)?;
    set_cookie(headers, options, &sealed)
}

/// Emits a cookie that the browser discards immediately.
pub fn delete_cookie(headers: &mut HeaderMap, options: &CookieOptions) -> Result<(), CookieError> {
    append_set_cookie(headers, options.render("", Some(0)))
}

/// Looks up a cookie across every `Cookie` header of a request.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.typed_get::<headers::Cookie>()?;
    let value = cookies.get(name).map(str::to_string);
    if value.is_none() {
        tracing::trace!("No cookie '{}' found in request", name);
    }
    value
}

pub fn get_signed_cookie(
    headers: &HeaderMap,
    codec: &CookieCodec,
    name: &str,
) -> Result<Option<String>, CookieError> {
    get_cookie(headers, name)
        .map(|value| codec.verify(&value))
        .transpose()
}

pub fn get_encrypted_cookie(
    headers: &HeaderMap,
    codec: &dyn TokenCodec,
    name: &str,
) -> Result<Option<String>, CookieError> {
    get_cookie(headers, name)
        .map(|value| codec.decrypt(&value))
        .transpose()
}
