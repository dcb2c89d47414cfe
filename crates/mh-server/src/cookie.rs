//! The `mh_session` cookie (spec §6): `HttpOnly`, `SameSite=Strict` for
//! same-origin browser clients, `SameSite=None; Secure` for cross-origin
//! mobile clients that opt in via `X-Mh-Cross-Origin: true`.

use mh_core::SessionId;
use tower_cookies::cookie::SameSite;
use tower_cookies::Cookie;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "mh_session";

/// Header a cross-origin mobile client sets to request the
/// `SameSite=None; Secure` cookie variant instead of `Strict`.
pub const CROSS_ORIGIN_HEADER: &str = "x-mh-cross-origin";

/// Build the `Set-Cookie` value for a freshly created session.
#[must_use]
pub fn build(id: SessionId, cross_origin: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
    cookie.set_http_only(true);
    cookie.set_path("/");
    if cross_origin {
        cookie.set_same_site(SameSite::None);
        cookie.set_secure(true);
    } else {
        cookie.set_same_site(SameSite::Strict);
    }
    cookie
}

/// Build a cookie that immediately expires the session cookie (logout).
#[must_use]
pub fn removal() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(tower_cookies::cookie::time::Duration::ZERO);
    cookie
}
