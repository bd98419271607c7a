//! Interface-name kinds (`eth0`, `tun1`, `ppp0`, ...), whose upper bound on
//! the index is derived from the host's network interface inventory.

use once_cell::sync::OnceCell;

const DEF_ETH_IFNUM: u32 = 4;
const MAX_ETH_IFNUM: u32 = 10;
const MAX_TUN_PPP_IFNUM: u32 = 16;

/// Count ethernet-looking interfaces from `/proc/net/dev`, falling back to
/// [`DEF_ETH_IFNUM`] when unavailable or unparsable, capped at
/// [`MAX_ETH_IFNUM`]. Mirrors the original `get_eth_ifnum`.
fn count_eth_interfaces() -> u32 {
    #[cfg(target_os = "linux")]
    {
        match std::fs::read_to_string("/proc/net/dev") {
            Ok(contents) => {
                let count = contents
                    .lines()
                    .skip(2)
                    .filter_map(|line| line.split(':').next())
                    .map(|name| name.trim())
                    .filter(|name| name.starts_with("eth"))
                    .count() as u32;
                if count == 0 {
                    DEF_ETH_IFNUM
                } else {
                    count.min(MAX_ETH_IFNUM)
                }
            }
            Err(_) => DEF_ETH_IFNUM,
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        DEF_ETH_IFNUM
    }
}

fn eth_ifnum() -> u32 {
    static N: OnceCell<u32> = OnceCell::new();
    *N.get_or_init(count_eth_interfaces)
}

fn parse_indexed(s: &str, prefix: &str) -> Option<u32> {
    let rest = s.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

pub fn is_eth_ifname(s: &str) -> bool {
    parse_indexed(s, "eth").map(|n| n < eth_ifnum()).unwrap_or(false)
}

pub fn is_tun_ifname(s: &str) -> bool {
    parse_indexed(s, "tun").map(|n| n < MAX_TUN_PPP_IFNUM).unwrap_or(false)
}

pub fn is_ppp_ifname(s: &str) -> bool {
    parse_indexed(s, "ppp").map(|n| n < MAX_TUN_PPP_IFNUM).unwrap_or(false)
}
