use std::collections::HashMap;

use http::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE, USER_AGENT};

/// Keeps the cookies set by responses and sends them on later requests.
#[derive(Debug, Clone, Default)]
pub struct MockBrowser {
    cookies: HashMap<String, String>,
    user_agent: Option<String>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        Self {
            user_agent: Some(user_agent.to_string()),
            ..Self::default()
        }
    }

    pub fn set_user_agent(&mut self, user_agent: &str) {
        self.user_agent = Some(user_agent.to_string());
    }

    /// Headers of the next request.
    pub fn request(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        }
        if let Some(agent) = &self.user_agent {
            headers.insert(USER_AGENT, HeaderValue::from_str(agent).unwrap());
        }
        headers
    }

    /// Applies every `Set-Cookie` of a response in order, like a browser.
    pub fn receive(&mut self, response: &HeaderMap) {
        for set_cookie in response.get_all(SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let Some((name, value)) = set_cookie
                .split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
            else {
                continue;
            };

            let expired = set_cookie_attributes(set_cookie)
                .any(|(key, value)| key.eq_ignore_ascii_case("Max-Age") && value.starts_with(['0', '-']));
            if expired || value.is_empty() {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

fn set_cookie_attributes(set_cookie: &str) -> impl Iterator<Item = (&str, &str)> {
    set_cookie.split(';').skip(1).map(|attribute| {
        let attribute = attribute.trim();
        attribute.split_once('=').unwrap_or((attribute, ""))
    })
}

/// Every `Set-Cookie` header of a response.
pub fn set_cookies(response: &HeaderMap) -> Vec<String> {
    response
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
