//! Cookie jar backend.
//!
//! Cookies are the first-choice credential store because they keep working in
//! private browsing. Attributes follow the origin scheme: `Secure;
//! SameSite=None` over HTTPS, `SameSite=Lax` otherwise. Expired cookies are
//! never returned, mirroring browser behaviour.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use cadenza_core::types::Timestamp;

use crate::storage::{BackendKind, StorageBackend, StorageError};

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires_at: Option<Timestamp>,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Cookie {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Render the cookie as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}; Path=/", self.name, self.value);
        if let Some(expires_at) = self.expires_at {
            out.push_str(&format!(
                "; Expires={}",
                expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out.push_str("; SameSite=");
        out.push_str(self.same_site.as_str());
        out
    }
}

/// In-process cookie jar for a single origin.
pub struct CookieJar {
    secure: bool,
    cookies: Mutex<HashMap<String, Cookie>>,
    enabled: AtomicBool,
}

impl CookieJar {
    /// Jar for `origin`; `https://` origins get secure cross-site cookies.
    pub fn for_origin(origin: &str) -> Self {
        Self {
            secure: origin.trim().to_ascii_lowercase().starts_with("https://"),
            cookies: Mutex::new(HashMap::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Simulate a browser with cookies blocked.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn same_site(&self) -> SameSite {
        if self.secure {
            SameSite::None
        } else {
            SameSite::Lax
        }
    }

    /// Look up a cookie, including expired ones still physically stored.
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.cookies().get(name).cloned()
    }

    /// Place a cookie as-is, bypassing expiry checks.
    pub fn seed(&self, cookie: Cookie) {
        self.cookies().insert(cookie.name.clone(), cookie);
    }

    /// `Set-Cookie` header values for every live cookie, sorted by name.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        let now = Utc::now();
        let cookies = self.cookies();
        let mut live: Vec<&Cookie> = cookies.values().filter(|c| !c.is_expired_at(now)).collect();
        live.sort_by(|a, b| a.name.cmp(&b.name));
        live.into_iter().map(Cookie::to_header_value).collect()
    }

    fn cookies(&self) -> MutexGuard<'_, HashMap<String, Cookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_enabled(&self) -> Result<(), StorageError> {
        if self.enabled.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable(BackendKind::Cookie.as_str()))
        }
    }
}

impl StorageBackend for CookieJar {
    fn kind(&self) -> BackendKind {
        BackendKind::Cookie
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_enabled()?;
        let mut cookies = self.cookies();
        let expired = match cookies.get(key) {
            Some(cookie) => cookie.is_expired_at(Utc::now()),
            None => return Ok(None),
        };
        if expired {
            cookies.remove(key);
            return Ok(None);
        }
        Ok(cookies.get(key).map(|cookie| cookie.value.clone()))
    }

    fn write(
        &self,
        key: &str,
        value: &str,
        expires_at: Option<Timestamp>,
    ) -> Result<(), StorageError> {
        self.ensure_enabled()?;
        let cookie = Cookie {
            name: key.to_string(),
            value: value.to_string(),
            expires_at,
            secure: self.secure,
            same_site: self.same_site(),
        };
        self.cookies().insert(key.to_string(), cookie);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_enabled()?;
        self.cookies().remove(key);
        Ok(())
    }
}
