//! Lexical validator registry: a typed catalog of string recognizers.
//!
//! Grounded on the teacher crate's `validators.rs` (small, independently
//! testable predicate functions returning a crate `Result`) and on the
//! original `lex.c`'s `lex_ent` table (a display name, predicate, help hint,
//! and optional completion prefix per kind, plus a process-wide regex
//! cache keyed by kind id).

pub mod ifname;
pub mod kinds;
pub mod predicates;

pub use kinds::{is_numeric_kind, BuiltinKind, LexKindId, LEX_CUSTOM_BASE, MAX_LEX_TYPE};

use std::collections::HashMap;

/// A custom predicate supplied by the embedding application.
pub type CustomPredicate = std::sync::Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// One entry in the lexical registry: display name, predicate, help text,
/// and an optional completion prefix (e.g. `eth` for `ETH_IFNAME`).
#[derive(Clone)]
pub struct LexEntry {
    pub id: LexKindId,
    pub name: String,
    pub help: String,
    pub prefix: Option<String>,
    predicate: LexPredicate,
}

#[derive(Clone)]
enum LexPredicate {
    Builtin(fn(&str) -> bool),
    Custom(CustomPredicate),
}

impl LexEntry {
    pub fn classify(&self, s: &str) -> bool {
        match &self.predicate {
            LexPredicate::Builtin(f) => f(s),
            LexPredicate::Custom(f) => f(s),
        }
    }
}

/// Numeric range check for `Int`/`Decimal` symbols.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            NumericRange { min: a, max: b }
        } else {
            NumericRange { min: b, max: a }
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Owns the full set of lexical kinds (built-in and custom-registered) and
/// classifies tokens against them. Regex compilation for kinds that use one
/// is amortized by the predicate functions themselves (each caches its own
/// compiled [`regex::Regex`] in a `OnceCell`), so the registry needs no
/// separate cache of its own beyond the entry table.
pub struct LexRegistry {
    entries: HashMap<u16, LexEntry>,
}

impl LexRegistry {
    /// Build a registry with every built-in kind registered.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for kind in BuiltinKind::all() {
            let id = kind.id();
            entries.insert(id.0, builtin_entry(*kind));
        }
        LexRegistry { entries }
    }

    pub fn get(&self, id: LexKindId) -> Option<&LexEntry> {
        self.entries.get(&id.0)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&LexEntry> {
        self.entries.values().find(|e| e.name == name)
    }

    /// Classify `s` against `id`'s predicate, applying an inclusive numeric
    /// range check when `range` is given and `id` is numeric.
    pub fn classify(&self, id: LexKindId, s: &str, range: Option<NumericRange>) -> bool {
        let Some(entry) = self.get(id) else { return false };
        if !entry.classify(s) {
            return false;
        }
        if let Some(range) = range {
            if is_numeric_kind(id) {
                return s.parse::<f64>().map(|v| range.contains(v)).unwrap_or(false);
            }
        }
        true
    }

    /// Register (or replace) a custom kind. `id` must lie in the reserved
    /// custom range.
    pub fn register_custom(
        &mut self,
        id: LexKindId,
        name: impl Into<String>,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        help: impl Into<String>,
        prefix: Option<String>,
    ) -> crate::error::Result<()> {
        if !id.is_custom() {
            return Err(crate::error::EngineError::CustomLexOutOfRange(id.0));
        }
        self.entries.insert(
            id.0,
            LexEntry {
                id,
                name: name.into(),
                help: help.into(),
                prefix,
                predicate: LexPredicate::Custom(std::sync::Arc::new(predicate)),
            },
        );
        Ok(())
    }
}

impl Default for LexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_entry(kind: BuiltinKind) -> LexEntry {
    use predicates as p;
    use BuiltinKind::*;

    let (predicate, help, prefix): (fn(&str) -> bool, &str, Option<&str>) = match kind {
        IpAddr => (p::is_ip_addr, "A.B.C.D IP address", None),
        IpMask => (p::is_ip_mask, "A.B.C.D subnet mask", None),
        IpPrefix => (p::is_ip_prefix, "A.B.C.D/N IP prefix", None),
        IpBlock => (p::is_ip_block, "A.B.C.D[/N] IP address or prefix", None),
        IpRange => (p::is_ip_range, "A.B.C.D[-A.B.C.D] IP address range", None),
        Ip6Addr => (p::is_ip6_addr, "X:X::X IPv6 address", None),
        Ip6Prefix => (p::is_ip6_prefix, "X:X::X/N IPv6 prefix", None),
        Ip6Block => (p::is_ip6_block, "X:X::X[/N] IPv6 address or prefix", None),
        Port => (p::is_port, "TCP/UDP port number (0-65535)", None),
        PortRange => (p::is_port_range, "port[-port] range", None),
        VlanId => (p::is_vlan_id, "VLAN id (1-4094)", None),
        MacAddr => (p::is_mac_addr, "MAC address", None),
        Word => (p::is_word, "a single identifier word", None),
        Words => (p::is_words, "free-form text", None),
        Int => (p::is_int, "an integer", None),
        Hex => (p::is_hex, "a hexadecimal number", None),
        Decimal => (p::is_decimal, "a decimal number", None),
        HostName => (p::is_host_name, "a host name", None),
        Host => (p::is_host, "a host name or IP address", None),
        Host6 => (p::is_host6, "a host name or IPv6 address", None),
        DomainName => (p::is_domain_name, "a domain name", None),
        DomainWildcard => (p::is_domain_wildcard, "a domain name or *.domain wildcard", None),
        Email => (p::is_email_addr, "an email address", None),
        HttpUrl => (p::is_http_url, "an http:// URL", None),
        HttpsUrl => (p::is_https_url, "an https:// URL", None),
        FtpUrl => (p::is_ftp_url, "an ftp:// URL", None),
        ScpUrl => (p::is_scp_url, "a scp URL or user@host:path", None),
        TftpUrl => (p::is_tftp_url, "a tftp:// URL", None),
        FileName => (p::is_file_name, "a file name", None),
        FilePath => (p::is_file_path, "a file path", None),
        Uid => (p::is_uid, "a user identifier", None),
        NetUid => (p::is_net_uid, "a user@host identifier", None),
        Net6Uid => (p::is_net6_uid, "a user@host6 identifier", None),
        DateTime => (p::is_date_time, "YYYYMMDDhhmm[.ss]", None),
        EthIfName => (ifname::is_eth_ifname, "an ethernet interface name", Some("eth")),
        TunIfName => (ifname::is_tun_ifname, "a tunnel interface name", Some("tun")),
        PppIfName => (ifname::is_ppp_ifname, "a PPP interface name", Some("ppp")),
    };

    LexEntry {
        id: kind.id(),
        name: kind.name().to_string(),
        help: help.to_string(),
        prefix: prefix.map(|s| s.to_string()),
        predicate: LexPredicate::Builtin(predicate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_classifies_builtin_kinds() {
        let reg = LexRegistry::new();
        assert!(reg.classify(BuiltinKind::Port.id(), "80", None));
        assert!(!reg.classify(BuiltinKind::Port.id(), "99999", None));
    }

    #[test]
    fn numeric_range_is_enforced() {
        let reg = LexRegistry::new();
        let range = NumericRange::new(1.0, 100.0);
        assert!(reg.classify(BuiltinKind::Int.id(), "50", Some(range)));
        assert!(!reg.classify(BuiltinKind::Int.id(), "101", Some(range)));
    }

    #[test]
    fn custom_kind_registration_and_rejection_out_of_range() {
        let mut reg = LexRegistry::new();
        let id = LexKindId(LEX_CUSTOM_BASE);
        reg.register_custom(id, "EVEN", |s| s.parse::<i64>().map(|v| v % 2 == 0).unwrap_or(false), "an even integer", None)
            .unwrap();
        assert!(reg.classify(id, "4", None));
        assert!(!reg.classify(id, "5", None));

        let bad_id = LexKindId(1);
        let err = reg.register_custom(bad_id, "X", |_| true, "help", None);
        assert!(err.is_err());
    }

    #[test]
    fn double_registration_replaces_prior_entry() {
        let mut reg = LexRegistry::new();
        let id = LexKindId(LEX_CUSTOM_BASE);
        reg.register_custom(id, "A", |_| true, "help", None).unwrap();
        reg.register_custom(id, "B", |_| false, "help", None).unwrap();
        assert_eq!(reg.get(id).unwrap().name, "B");
        assert!(!reg.classify(id, "anything", None));
    }
}
