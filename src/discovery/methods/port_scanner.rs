use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::discovery::error::DiscoveryError;
use crate::discovery::helper_client::PrivilegedHelperClient;
use crate::discovery::methods::DiscoveryMethod;
use crate::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType};

const PROC_NET_TCP: &str = "/proc/net/tcp";
const PROC_NET_TCP6: &str = "/proc/net/tcp6";

/// `st` field value for `TCP_LISTEN` in `/proc/net/tcp{,6}`.
const TCP_LISTEN_STATE: &str = "0A";

const WELL_KNOWN_PORTS: &[(u16, ServiceType)] = &[
    (3306, ServiceType::Mysql),
    (5432, ServiceType::Postgresql),
    (80, ServiceType::Nginx),
    (6379, ServiceType::Redis),
];

/// Reads listening TCP sockets straight from the kernel's procfs tables
/// (§4.3), rather than probing with outbound connects — a socket that
/// refuses our own connection attempt (e.g. firewalled to localhost, or
/// bound but not yet accepting) still shows up here. Falls back to the
/// privileged helper's `read_net_info` when the tables can't be read
/// directly (§4.3's delegation for sockets).
pub struct PortScanner {
    helper: Option<Arc<dyn PrivilegedHelperClient>>,
    proc_tcp: PathBuf,
    proc_tcp6: PathBuf,
}

impl PortScanner {
    pub fn new() -> Self {
        Self {
            helper: None,
            proc_tcp: PathBuf::from(PROC_NET_TCP),
            proc_tcp6: PathBuf::from(PROC_NET_TCP6),
        }
    }

    pub fn with_helper(helper: Arc<dyn PrivilegedHelperClient>) -> Self {
        Self {
            helper: Some(helper),
            ..Self::new()
        }
    }

    #[cfg(test)]
    fn with_proc_files(proc_tcp: PathBuf, proc_tcp6: PathBuf) -> Self {
        Self {
            helper: None,
            proc_tcp,
            proc_tcp6,
        }
    }

    #[cfg(test)]
    fn with_proc_files_and_helper(
        proc_tcp: PathBuf,
        proc_tcp6: PathBuf,
        helper: Arc<dyn PrivilegedHelperClient>,
    ) -> Self {
        Self {
            helper: Some(helper),
            proc_tcp,
            proc_tcp6,
        }
    }

    /// Reads one procfs table directly, falling back to
    /// `helper.read_net_info()["tcp"|"tcp6"]` when the direct read fails.
    fn read_table(&self, path: &Path, key: &str) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(_) => {
                let helper = self.helper.as_ref()?;
                let info = helper.read_net_info().ok()?;
                info.get(key)?.as_str().map(str::to_string)
            }
        }
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryMethod for PortScanner {
    fn kind(&self) -> DiscoveryMethodKind {
        DiscoveryMethodKind::PortScan
    }

    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
        let tcp = self.read_table(&self.proc_tcp, "tcp");
        let tcp6 = self.read_table(&self.proc_tcp6, "tcp6");

        if tcp.is_none() && tcp6.is_none() {
            return Err(DiscoveryError::MethodFailed(
                "port_scanner".to_string(),
                format!(
                    "could not read {} or {} directly or via the privileged helper",
                    self.proc_tcp.display(),
                    self.proc_tcp6.display()
                ),
            ));
        }

        let mut listening_ports: Vec<u16> = Vec::new();
        if let Some(contents) = &tcp {
            listening_ports.extend(listening_ports_in(contents));
        }
        if let Some(contents) = &tcp6 {
            listening_ports.extend(listening_ports_in(contents));
        }
        listening_ports.sort_unstable();
        listening_ports.dedup();

        let findings = WELL_KNOWN_PORTS
            .iter()
            .filter(|(port, _)| listening_ports.contains(port))
            .map(|(port, service_type)| RawFinding {
                service_type: service_type.clone(),
                endpoint: format!("0.0.0.0:{port}"),
                method: self.kind(),
                config_path: None,
                process_name: None,
            })
            .collect();

        Ok(findings)
    }
}

/// Parses the `sl  local_address rem_address st ...` lines of a
/// `/proc/net/tcp{,6}`-shaped table, returning the port of every socket in
/// `TCP_LISTEN` state. The address half of `local_address` is ignored: we
/// only need the port to match against [`WELL_KNOWN_PORTS`].
fn listening_ports_in(contents: &str) -> Vec<u16> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let local_address = fields.get(1)?;
            let state = fields.get(3)?;
            if *state != TCP_LISTEN_STATE {
                return None;
            }
            let (_, port_hex) = local_address.split_once(':')?;
            u16::from_str_radix(port_hex, 16).ok()
        })
        .collect()
}

/// Unswaps the little-endian-per-word hex address `/proc/net/tcp` stores
/// (e.g. `0100007F` is `127.0.0.1`). Kept for completeness and tested
/// directly; `scan` itself only needs the port.
#[allow(dead_code)]
fn parse_ipv4_hex(hex: &str) -> Option<Ipv4Addr> {
    if hex.len() != 8 {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok();
    Some(Ipv4Addr::new(byte(3)?, byte(2)?, byte(1)?, byte(0)?))
}

/// Same unswap as [`parse_ipv4_hex`] applied per 32-bit word of a
/// `/proc/net/tcp6` address.
#[allow(dead_code)]
fn parse_ipv6_hex(hex: &str) -> Option<Ipv6Addr> {
    if hex.len() != 32 {
        return None;
    }
    let mut bytes = [0u8; 16];
    for word in 0..4 {
        let word_hex = &hex[word * 8..word * 8 + 8];
        for i in 0..4 {
            let b = u8::from_str_radix(&word_hex[i * 2..i * 2 + 2], 16).ok()?;
            bytes[word * 4 + (3 - i)] = b;
        }
    }
    Some(Ipv6Addr::from(bytes))
}
