// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Host hostname resolution backed by the operating system.
//
// The short form is the first label of the kernel hostname. The fully
// qualified form comes from the resolver's canonical name for that host,
// falling back to the kernel hostname when no canonical name is available.

use tracing::debug;

use crate::domain::provider::HostnameResolver;

/// Hostname as reported by the operating system and its resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostname;

impl HostnameResolver for SystemHostname {
    fn hostname(&self, fqdn: bool) -> String {
        let name = ::hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_default();
        resolve_hostname(&name, fqdn, canonical_name)
    }
}

/// Short or fully qualified form of `os_name`.
///
/// `canonical` is only consulted for the fully qualified form. A lookup that
/// fails or yields a single-label name leaves the OS hostname in place.
pub fn resolve_hostname(
    os_name: &str,
    fqdn: bool,
    canonical: impl FnOnce(&str) -> Option<String>,
) -> String {
    let name = normalize(os_name);

    if !fqdn {
        return name.split('.').next().unwrap_or_default().to_string();
    }

    if name.is_empty() {
        return String::new();
    }

    match canonical(name).map(|c| normalize(&c).to_string()) {
        Some(canonical) if canonical.contains('.') => canonical,
        other => {
            debug!(hostname = %name, canonical = ?other, "No canonical host name, using OS hostname");
            name.to_string()
        }
    }
}

fn normalize(name: &str) -> &str {
    name.trim().trim_end_matches('.')
}

/// Canonical name for `host` via getaddrinfo(AI_CANONNAME)
#[cfg(unix)]
fn canonical_name(host: &str) -> Option<String> {
    use std::ffi::{CStr, CString};

    let node = CString::new(host).ok()?;

    // SAFETY: addrinfo is a plain C struct; all-zero is a valid hints value
    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_flags = libc::AI_CANONNAME;

    let mut result: *mut libc::addrinfo = std::ptr::null_mut();
    let rc = unsafe { libc::getaddrinfo(node.as_ptr(), std::ptr::null(), &hints, &mut result) };
    if rc != 0 || result.is_null() {
        return None;
    }

    // SAFETY: result is a list returned by getaddrinfo and freed exactly once
    let canonical = unsafe {
        let name = (*result).ai_canonname;
        let value = if name.is_null() {
            None
        } else {
            Some(CStr::from_ptr(name).to_string_lossy().into_owned())
        };
        libc::freeaddrinfo(result);
        value
    };

    canonical.filter(|c| !c.is_empty())
}

#[cfg(not(unix))]
fn canonical_name(_host: &str) -> Option<String> {
    None
}
