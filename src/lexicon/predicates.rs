//! Pure `str -> bool` predicates for every built-in lexical kind.
//!
//! Mirrors the shape of the teacher crate's `validators.rs`: small,
//! independently testable functions, each returning a plain bool (callers
//! that need a user-facing error wrap these through [`crate::error`]).

use once_cell::sync::OnceCell;
use regex::Regex;
use std::net::Ipv6Addr;

fn octet_ok(s: &str) -> bool {
    if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if s.len() > 1 && s.starts_with('0') {
        return false;
    }
    s.parse::<u16>().map(|v| v <= 255).unwrap_or(false)
}

pub fn is_ip_addr(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| octet_ok(p))
}

fn ipv4_to_u32(s: &str) -> Option<u32> {
    let parts: Vec<u32> = s.split('.').map(|p| p.parse().ok()).collect::<Option<_>>()?;
    if parts.len() != 4 {
        return None;
    }
    Some((parts[0] << 24) | (parts[1] << 16) | (parts[2] << 8) | parts[3])
}

/// A mask is valid when it is a contiguous run of one-bits followed by
/// zero-bits (`11111111.11111111.11111111.00000000`, etc).
pub fn is_ip_mask(s: &str) -> bool {
    if !is_ip_addr(s) {
        return false;
    }
    let Some(bits) = ipv4_to_u32(s) else { return false };
    let ones = bits.leading_ones();
    bits == (!0u32).checked_shl(32 - ones).unwrap_or(0)
}

pub fn netmask_to_bits(bits: u32) -> Option<u32> {
    let ones = bits.leading_ones();
    if bits == (!0u32).checked_shl(32 - ones).unwrap_or(0) {
        Some(ones)
    } else {
        None
    }
}

pub fn bits_to_netmask(bits: u32) -> u32 {
    if bits == 0 {
        0
    } else {
        (!0u32) << (32 - bits.min(32))
    }
}

pub fn is_ip_prefix(s: &str) -> bool {
    match s.split_once('/') {
        Some((addr, bits)) => {
            is_ip_addr(addr) && bits.parse::<u8>().map(|n| n <= 32).unwrap_or(false) && !bits.starts_with('+')
        }
        None => false,
    }
}

pub fn is_ip_block(s: &str) -> bool {
    is_ip_prefix(s) || is_ip_addr(s)
}

pub fn is_ip_range(s: &str) -> bool {
    match s.split_once('-') {
        Some((from, to)) => is_ip_addr(from) && is_ip_addr(to),
        None => is_ip_addr(s),
    }
}

pub fn get_ip_range(s: &str) -> Option<(String, String)> {
    match s.split_once('-') {
        Some((from, to)) if is_ip_addr(from) && is_ip_addr(to) => {
            Some((from.to_string(), to.to_string()))
        }
        None if is_ip_addr(s) => Some((s.to_string(), s.to_string())),
        _ => None,
    }
}

pub fn is_ip6_addr(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

pub fn is_ip6_prefix(s: &str) -> bool {
    match s.split_once('/') {
        Some((addr, bits)) => is_ip6_addr(addr) && bits.parse::<u8>().map(|n| n <= 128).unwrap_or(false),
        None => false,
    }
}

pub fn is_ip6_block(s: &str) -> bool {
    is_ip6_prefix(s) || is_ip6_addr(s)
}

pub fn is_port(s: &str) -> bool {
    s.parse::<u32>().map(|v| v <= 65535).unwrap_or(false)
}

pub fn is_port_range(s: &str) -> bool {
    match s.split_once('-') {
        Some((from, to)) => is_port(from) && is_port(to),
        None => is_port(s),
    }
}

pub fn get_port_range(s: &str) -> Option<(u16, u16)> {
    match s.split_once('-') {
        Some((from, to)) if is_port(from) && is_port(to) => {
            Some((from.parse().ok()?, to.parse().ok()?))
        }
        None if is_port(s) => {
            let p = s.parse().ok()?;
            Some((p, p))
        }
        _ => None,
    }
}

pub fn is_vlan_id(s: &str) -> bool {
    s.parse::<u32>().map(|v| (1..=4094).contains(&v)).unwrap_or(false)
}

fn mac_cache() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9A-Fa-f]{12}|(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2})$").unwrap()
    })
}

pub fn is_mac_addr(s: &str) -> bool {
    mac_cache().is_match(s)
}

/// Canonicalize any accepted MAC form to `xx:xx:xx:xx:xx:xx`.
pub fn get_formal_mac(s: &str) -> Option<String> {
    if !is_mac_addr(s) {
        return None;
    }
    let hex: String = s.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 {
        return None;
    }
    let mut out = String::with_capacity(17);
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap());
    }
    Some(out.to_lowercase())
}

pub fn is_int(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_hex(s: &str) -> bool {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn is_decimal(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}

fn word_cache() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap())
}

pub fn is_word(s: &str) -> bool {
    word_cache().is_match(s)
}

pub fn is_words(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
}

fn label_cache() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").unwrap()
    })
}

pub fn is_host_name(s: &str) -> bool {
    !s.is_empty() && s.len() <= 255 && label_cache().is_match(s)
}

pub fn is_host(s: &str) -> bool {
    is_host_name(s) || is_ip_addr(s)
}

pub fn is_host6(s: &str) -> bool {
    is_host_name(s) || is_ip6_addr(s)
}

pub fn is_domain_name(s: &str) -> bool {
    is_host_name(s) && s.contains('.')
}

pub fn is_domain_wildcard(s: &str) -> bool {
    match s.strip_prefix("*.") {
        Some(rest) => is_domain_name(rest),
        None => is_domain_name(s),
    }
}

fn email_cache() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
    })
}

pub fn is_email_addr(s: &str) -> bool {
    email_cache().is_match(s)
}

fn url_scheme_ok(s: &str, scheme: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    if !lower.starts_with(&format!("{scheme}://")) {
        return false;
    }
    url::Url::parse(&lower).is_ok()
}

pub fn is_http_url(s: &str) -> bool {
    url_scheme_ok(s, "http")
}

pub fn is_https_url(s: &str) -> bool {
    url_scheme_ok(s, "https")
}

pub fn is_ftp_url(s: &str) -> bool {
    url_scheme_ok(s, "ftp")
}

pub fn is_scp_url(s: &str) -> bool {
    // scp URLs (user@host:path) are not a registered URL scheme; accept the
    // conventional `scp://` form used by the rest of this family plus the
    // classic `user@host:path` shorthand.
    url_scheme_ok(s, "scp") || (s.contains('@') && s.contains(':') && !s.contains("://"))
}

pub fn is_tftp_url(s: &str) -> bool {
    url_scheme_ok(s, "tftp")
}

pub fn get_uri_elements(s: &str) -> Option<(String, String, String)> {
    let url = url::Url::parse(s).ok()?;
    let host = url.host_str()?.to_string();
    let path = url.path().to_string();
    Some((url.scheme().to_string(), host, path))
}

pub fn is_file_name(s: &str) -> bool {
    !s.is_empty() && !s.contains('/') && s.len() < 256
}

pub fn is_file_path(s: &str) -> bool {
    !s.is_empty() && s.len() < 4096
}

pub fn is_uid(s: &str) -> bool {
    is_word(s)
}

pub fn is_net_uid(s: &str) -> bool {
    match s.split_once('@') {
        Some((user, host)) => is_word(user) && (is_ip_addr(host) || is_host_name(host)),
        None => false,
    }
}

pub fn is_net6_uid(s: &str) -> bool {
    match s.split_once('@') {
        Some((user, host)) => is_word(user) && (is_ip6_addr(host) || is_host_name(host)),
        None => false,
    }
}

fn date_time_cache() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(?:\.(\d{2}))?$").unwrap())
}

/// `YYYYMMDDhhmm[.ss]`, year >= 2015, per the original's `is_date_time`.
pub fn is_date_time(s: &str) -> bool {
    let Some(caps) = date_time_cache().captures(s) else { return false };
    let year: u32 = caps[1].parse().unwrap();
    let month: u32 = caps[2].parse().unwrap();
    let day: u32 = caps[3].parse().unwrap();
    let hour: u32 = caps[4].parse().unwrap();
    let minute: u32 = caps[5].parse().unwrap();
    let sec: u32 = caps.get(6).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    year >= 2015
        && (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && hour < 24
        && minute < 60
        && sec < 60
}

pub fn is_empty_line(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_addr_boundaries() {
        assert!(is_ip_addr("0.0.0.0"));
        assert!(is_ip_addr("255.255.255.255"));
        assert!(!is_ip_addr("256.0.0.1"));
        assert!(!is_ip_addr("01.0.0.1"));
    }

    #[test]
    fn ip_mask_accepts_contiguous_ones() {
        assert!(is_ip_mask("255.255.255.0"));
        assert!(is_ip_mask("255.255.255.255"));
        assert!(is_ip_mask("0.0.0.0"));
        assert!(!is_ip_mask("255.255.0.255"));
    }

    #[test]
    fn ip_prefix_boundaries() {
        assert!(is_ip_prefix("0.0.0.0/0"));
        assert!(is_ip_prefix("255.255.255.255/32"));
        assert!(!is_ip_prefix("10.0.0.0/33"));
    }

    #[test]
    fn port_boundaries() {
        assert!(is_port("0"));
        assert!(is_port("65535"));
        assert!(!is_port("65536"));
        assert!(!is_port("-1"));
    }

    #[test]
    fn vlan_boundaries() {
        assert!(is_vlan_id("1"));
        assert!(is_vlan_id("4094"));
        assert!(!is_vlan_id("0"));
        assert!(!is_vlan_id("4095"));
    }

    #[test]
    fn mac_addr_forms_and_canonicalization() {
        assert!(is_mac_addr("aabbccddeeff"));
        assert!(is_mac_addr("aa:bb:cc:dd:ee:ff"));
        assert!(is_mac_addr("AA-BB-CC-DD-EE-FF"));
        assert_eq!(get_formal_mac("AABBCCDDEEFF").as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn date_time_requires_recent_year() {
        assert!(is_date_time("202501011230"));
        assert!(is_date_time("202501011230.59"));
        assert!(!is_date_time("201401011230"));
    }

    #[test]
    fn urls_require_scheme_and_are_case_insensitive() {
        assert!(is_http_url("http://example.com/a"));
        assert!(is_http_url("HTTP://example.com/a"));
        assert!(!is_http_url("https://example.com/a"));
        assert!(is_https_url("https://example.com"));
    }

    #[test]
    fn email_basic() {
        assert!(is_email_addr("user@example.com"));
        assert!(!is_email_addr("not-an-email"));
    }
}
