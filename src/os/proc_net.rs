// elevd — /proc/net Socket Table Parsing
//
// Pure parsers for the kernel's `/proc/net/tcp` and `/proc/net/tcp6` tables,
// kept free of filesystem access so they are testable against fixture text.
// Each row carries hex-encoded endpoints (4-byte groups printed in the
// kernel's native word order, ports big-endian) and the socket inode that
// links the row to an owning process via `/proc/<pid>/fd`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// One live socket from a `/proc/net/tcp{,6}` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SockEntry {
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub inode: u64,
}

/// Parse a whole table. The header row and any malformed row are skipped:
/// the table is advisory kernel state and a row we cannot read is
/// indistinguishable from a socket that closed mid-scan.
pub fn parse_table(content: &str, v6: bool) -> Vec<SockEntry> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| parse_line(line, v6))
        .collect()
}

fn parse_line(line: &str, v6: bool) -> Option<SockEntry> {
    let mut fields = line.split_whitespace();
    let _sl = fields.next()?;
    let local = parse_endpoint(fields.next()?, v6)?;
    let remote = parse_endpoint(fields.next()?, v6)?;
    // st, tx:rx, tr:when, retrnsmt, uid, timeout
    let mut fields = fields.skip(6);
    let inode = fields.next()?.parse::<u64>().ok()?;
    Some(SockEntry {
        local,
        remote,
        inode,
    })
}

/// Decode one `ADDR:PORT` field. Addresses are hex 4-byte groups in native
/// word order (so each group's network-order bytes come out little-endian),
/// ports are plain big-endian hex.
fn parse_endpoint(field: &str, v6: bool) -> Option<SocketAddr> {
    let (addr_hex, port_hex) = field.split_once(':')?;
    let port = u16::from_str_radix(port_hex, 16).ok()?;
    let ip = if v6 {
        if addr_hex.len() != 32 {
            return None;
        }
        let mut bytes = [0u8; 16];
        for (i, chunk) in bytes.chunks_exact_mut(4).enumerate() {
            let group = u32::from_str_radix(&addr_hex[i * 8..i * 8 + 8], 16).ok()?;
            chunk.copy_from_slice(&group.to_le_bytes());
        }
        IpAddr::V6(Ipv6Addr::from(bytes))
    } else {
        if addr_hex.len() != 8 {
            return None;
        }
        let group = u32::from_str_radix(addr_hex, 16).ok()?;
        IpAddr::V4(Ipv4Addr::from(group.to_le_bytes()))
    };
    Some(SocketAddr::new(ip, port))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
