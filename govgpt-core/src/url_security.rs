//! URL allow-listing for outbound fetches
//!
//! Remote function and tool sources are only fetched from domains an operator
//! has explicitly approved. Everything else is denied; private ranges,
//! loopback names and internal suffixes are classified separately so the
//! security log says why.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{info, warn};
use url::Url;

pub const FUNCTION_DOMAINS_ENV: &str = "ADDITIONAL_FUNCTION_DOMAINS";
pub const TOOL_DOMAINS_ENV: &str = "ADDITIONAL_TOOL_DOMAINS";

const PRIVATE_PREFIXES: &[&str] = &[
    "10.", "172.16.", "172.17.", "172.18.", "172.19.", "172.20.", "172.21.", "172.22.", "172.23.",
    "172.24.", "172.25.", "172.26.", "172.27.", "172.28.", "172.29.", "172.30.", "172.31.",
    "192.168.", "127.", "169.254.",
];

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "0.0.0.0"];

const INTERNAL_SUFFIXES: &[&str] = &[
    ".local",
    ".internal",
    ".home",
    ".lan",
    ".corp",
    ".localdomain",
];

static DOTTED_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("static regex"));

static GITHUB_TREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/tree/([^/]+)/(.*)").expect("static regex")
});

static GITHUB_BLOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/blob/([^/]+)/(.*)").expect("static regex")
});

/// Why a URL was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    PrivateNetwork,
    Loopback,
    InternalDomain,
    DirectIp,
    UnauthorizedDomain,
    Unparseable,
}

impl DenyReason {
    pub fn describe(&self) -> &'static str {
        match self {
            DenyReason::PrivateNetwork => "private IP range",
            DenyReason::Loopback => "localhost/loopback",
            DenyReason::InternalDomain => "internal domain",
            DenyReason::DirectIp => "direct IP access",
            DenyReason::UnauthorizedDomain => "unauthorized domain",
            DenyReason::Unparseable => "unparseable URL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed { host: String },
    Denied { host: Option<String>, reason: DenyReason },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed { .. })
    }
}

/// Default-deny validator over an explicit set of domains
#[derive(Debug, Clone, Default)]
pub struct UrlSecurityValidator {
    allowed_domains: HashSet<String>,
}

impl UrlSecurityValidator {
    pub fn new(allowed_domains: &HashSet<String>) -> Self {
        Self {
            allowed_domains: allowed_domains.iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    /// Validator seeded from `seed` plus the comma-separated list in `env_var`
    pub fn from_env(seed: &[String], env_var: &str) -> Self {
        let mut validator = Self::default();
        for domain in seed {
            validator.add_domain(domain);
        }
        validator.add_domains_from_env(env_var);
        validator
    }

    /// Merge the comma-separated domains found in `env_var`
    pub fn add_domains_from_env(&mut self, env_var: &str) {
        let Ok(value) = std::env::var(env_var) else {
            return;
        };
        let added = self.add_domains_from_list(&value);
        if added > 0 {
            info!("Added {} domains from {}", added, env_var);
        }
    }

    /// Merge a comma-separated list; returns how many entries were parsed
    pub fn add_domains_from_list(&mut self, list: &str) -> usize {
        let domains: HashSet<String> = list
            .split(',')
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        let count = domains.len();
        self.allowed_domains.extend(domains);
        count
    }

    pub fn is_url_allowed(&self, url: &str) -> bool {
        match self.classify(url) {
            Verdict::Allowed { .. } => true,
            Verdict::Denied { host, reason } => {
                match reason {
                    DenyReason::Unparseable => warn!("Error parsing URL {}", url),
                    _ => warn!(
                        "Blocked {} access attempt: {}",
                        reason.describe(),
                        host.unwrap_or_default()
                    ),
                }
                false
            }
        }
    }

    /// Decide without logging
    pub fn classify(&self, url: &str) -> Verdict {
        let Some(host) = extract_host(url) else {
            return Verdict::Denied {
                host: None,
                reason: DenyReason::Unparseable,
            };
        };

        if self.allowed_domains.contains(&host) {
            return Verdict::Allowed { host };
        }

        let reason = if PRIVATE_PREFIXES.iter().any(|p| host.starts_with(p)) {
            DenyReason::PrivateNetwork
        } else if LOOPBACK_HOSTS.contains(&host.as_str()) {
            DenyReason::Loopback
        } else if INTERNAL_SUFFIXES.iter().any(|s| host.ends_with(s)) {
            DenyReason::InternalDomain
        } else if DOTTED_QUAD.is_match(&host) {
            DenyReason::DirectIp
        } else {
            DenyReason::UnauthorizedDomain
        };

        Verdict::Denied {
            host: Some(host),
            reason,
        }
    }

    /// Copy of the current allow-list
    pub fn allowed_domains(&self) -> HashSet<String> {
        self.allowed_domains.clone()
    }

    pub fn add_domain(&mut self, domain: &str) {
        self.allowed_domains.insert(domain.to_lowercase());
    }

    pub fn remove_domain(&mut self, domain: &str) {
        self.allowed_domains.remove(&domain.to_lowercase());
    }
}

/// Lower-cased host without port or IPv6 brackets
fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str().unwrap_or_default();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    Some(host.to_lowercase())
}

/// Validator for remote function sources
pub fn function_url_validator() -> UrlSecurityValidator {
    UrlSecurityValidator::from_env(&[], FUNCTION_DOMAINS_ENV)
}

/// Validator for remote tool sources
pub fn tool_url_validator() -> UrlSecurityValidator {
    UrlSecurityValidator::from_env(&[], TOOL_DOMAINS_ENV)
}

/// One-shot check; falls back to the function validator when no set is given
pub fn is_url_allowed(url: &str, allowed_domains: Option<&HashSet<String>>) -> bool {
    match allowed_domains {
        Some(domains) => UrlSecurityValidator::new(domains).is_url_allowed(url),
        None => function_url_validator().is_url_allowed(url),
    }
}

/// Rewrite GitHub tree/blob page URLs into raw content URLs.
///
/// Tree URLs point at a folder, so `main.py` is appended. Anything else is
/// returned unchanged.
pub fn github_url_to_raw_url(url: &str) -> String {
    if let Some(caps) = GITHUB_TREE.captures(url) {
        return format!(
            "https://raw.githubusercontent.com/{}/{}/refs/heads/{}/{}/main.py",
            &caps[1],
            &caps[2],
            &caps[3],
            caps[4].trim_end_matches('/')
        );
    }

    if let Some(caps) = GITHUB_BLOB.captures(url) {
        return format!(
            "https://raw.githubusercontent.com/{}/{}/refs/heads/{}/{}",
            &caps[1], &caps[2], &caps[3], &caps[4]
        );
    }

    url.to_string()
}
