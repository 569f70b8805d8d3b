//! Origin and source-address allow-list matching.

use std::net::IpAddr;

/// An empty list, or a request without an `Origin` header, is always accepted.
pub fn origin_allowed(allowlist: &[String], origin: Option<&str>) -> bool {
    match origin {
        Some(origin) if !allowlist.is_empty() => allowlist
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(origin.trim())),
        _ => true,
    }
}

/// `source` must equal one entry or fall inside one CIDR entry.
///
/// An empty list accepts any address; an unknown source is rejected when a
/// list is configured.
pub fn ip_allowed(allowlist: &[String], source: Option<IpAddr>) -> bool {
    if allowlist.is_empty() {
        return true;
    }
    // A configured list is never skipped: an unreported caller address is denied.
    let Some(source) = source.map(|ip| ip.to_canonical()) else {
        return false;
    };

    allowlist.iter().any(|entry| {
        if entry.contains('/') {
            ip_in_cidr(source, entry)
        } else {
            entry
                .parse::<IpAddr>()
                .is_ok_and(|allowed| allowed.to_canonical() == source)
        }
    })
}

/// Whether `ip` lies inside `cidr` (`a.b.c.d/n` or `x::y/n`).
///
/// Whole bytes are compared up to `n / 8`, then the leading `n % 8` bits of
/// the next byte. Mixed address families never match.
pub fn ip_in_cidr(ip: IpAddr, cidr: &str) -> bool {
    let Some((network, prefix)) = cidr.trim().split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<usize>()) else {
        return false;
    };

    let address = octets(ip);
    let network = octets(network);
    if address.len() != network.len() || prefix > address.len() * 8 {
        return false;
    }

    let full_bytes = prefix / 8;
    if address[..full_bytes] != network[..full_bytes] {
        return false;
    }

    let remaining_bits = prefix % 8;
    if remaining_bits == 0 {
        return true;
    }

    let mask = 0xFFu8 << (8 - remaining_bits);
    address[full_bytes] & mask == network[full_bytes] & mask
}

fn octets(ip: IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cidr_membership() {
        assert!(ip_in_cidr(ip("10.0.0.5"), "10.0.0.0/24"));
        assert!(!ip_in_cidr(ip("10.0.0.5"), "10.0.1.0/24"));
    }

    #[test]
    fn cidr_with_partial_byte_prefix() {
        assert!(ip_in_cidr(ip("192.168.1.130"), "192.168.1.128/25"));
        assert!(!ip_in_cidr(ip("192.168.1.127"), "192.168.1.128/25"));
        assert!(ip_in_cidr(ip("8.8.8.8"), "0.0.0.0/0"));
    }

    #[test]
    fn family_mismatch_never_matches() {
        assert!(!ip_in_cidr(ip("10.0.0.5"), "::/0"));
        assert!(!ip_in_cidr(ip("fe80::1"), "10.0.0.0/8"));
    }

    #[test]
    fn malformed_cidr_never_matches() {
        assert!(!ip_in_cidr(ip("10.0.0.5"), "10.0.0.0/33"));
        assert!(!ip_in_cidr(ip("10.0.0.5"), "10.0.0.0/abc"));
        assert!(!ip_in_cidr(ip("10.0.0.5"), "10.0.0.0"));
    }

    #[test]
    fn ip_allowlist_accepts_exact_and_cidr_entries() {
        let allowlist = list(&["192.168.1.7", "10.0.0.0/24"]);

        assert!(ip_allowed(&allowlist, Some(ip("192.168.1.7"))));
        assert!(ip_allowed(&allowlist, Some(ip("10.0.0.200"))));
        assert!(ip_allowed(&allowlist, Some(ip("::ffff:10.0.0.9"))));
        assert!(!ip_allowed(&allowlist, Some(ip("10.0.1.1"))));
        assert!(!ip_allowed(&allowlist, None));
        assert!(ip_allowed(&[], None));
    }

    #[test]
    fn origin_match_is_case_insensitive_and_optional() {
        let allowlist = list(&["https://hr.example.id"]);

        assert!(origin_allowed(&allowlist, Some("HTTPS://HR.example.id")));
        assert!(!origin_allowed(&allowlist, Some("https://evil.example")));
        assert!(origin_allowed(&allowlist, None));
        assert!(origin_allowed(&[], Some("https://anything.example")));
    }
}
