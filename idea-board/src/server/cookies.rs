//! The `sess` cookie carrying the session JWT.
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::time::Duration;
use cookie::{Cookie, CookieBuilder, SameSite};

pub const SESSION_COOKIE: &str = "sess";

#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub domain: Option<String>,
    pub secure: bool,
    pub max_age: chrono::Duration,
}

impl SessionCookie {
    /// `Set-Cookie` value storing `token` for the token's lifetime.
    pub fn issue(&self, token: &str) -> String {
        self.builder(token.to_string())
            .max_age(Duration::seconds(self.max_age.num_seconds()))
            .build()
            .to_string()
    }

    /// `Set-Cookie` value that makes the browser drop the session.
    pub fn clear(&self) -> String {
        let mut cookie = self.builder(String::new()).build();
        cookie.make_removal();
        cookie.to_string()
    }

    fn builder(&self, value: String) -> CookieBuilder<'static> {
        let builder = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        match &self.domain {
            Some(domain) => builder.domain(domain.clone()),
            None => builder,
        }
    }
}

/// Reads the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}
