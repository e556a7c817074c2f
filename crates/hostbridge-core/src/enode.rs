//! Peer node URLs of the form `enode://<node-id>@<ip>:<port>[?discport=<udp>]`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::error::{CoreError, Result};

const SCHEME: &str = "enode://";

/// A parsed node URL. The node id is the 64-byte uncompressed public key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Enode {
    id: [u8; 64],
    ip: IpAddr,
    tcp_port: u16,
    udp_port: u16,
}

impl Enode {
    /// Parse an `enode://` URL.
    pub fn parse(rawurl: &str) -> Result<Self> {
        let rest = rawurl
            .strip_prefix(SCHEME)
            .ok_or_else(|| CoreError::InvalidEnode(format!("missing {SCHEME} scheme")))?;
        let (id_hex, location) = rest
            .split_once('@')
            .ok_or_else(|| CoreError::InvalidEnode("missing '@' after node id".into()))?;

        let mut id = [0u8; 64];
        hex::decode_to_slice(id_hex, &mut id)
            .map_err(|e| CoreError::InvalidEnode(format!("node id: {e}")))?;

        let (address, query) = match location.split_once('?') {
            Some((address, query)) => (address, Some(query)),
            None => (location, None),
        };
        let socket = SocketAddr::from_str(address)
            .map_err(|e| CoreError::InvalidEnode(format!("{address}: {e}")))?;

        let mut udp_port = socket.port();
        if let Some(query) = query {
            for pair in query.split('&') {
                if let Some(value) = pair.strip_prefix("discport=") {
                    udp_port = value
                        .parse()
                        .map_err(|_| CoreError::InvalidEnode(format!("bad discport {value:?}")))?;
                }
            }
        }

        Ok(Self {
            id,
            ip: socket.ip(),
            tcp_port: socket.port(),
            udp_port,
        })
    }

    pub fn id(&self) -> Vec<u8> {
        self.id.to_vec()
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    pub fn udp_port(&self) -> u16 {
        self.udp_port
    }
}

impl Default for Enode {
    fn default() -> Self {
        Self {
            id: [0u8; 64],
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            tcp_port: 0,
            udp_port: 0,
        }
    }
}

impl fmt::Display for Enode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let socket = SocketAddr::new(self.ip, self.tcp_port);
        write!(f, "{SCHEME}{}@{socket}", hex::encode(self.id))?;
        if self.udp_port != self.tcp_port {
            write!(f, "?discport={}", self.udp_port)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Enode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Enode({}..@{})",
            &hex::encode(self.id)[..16],
            SocketAddr::new(self.ip, self.tcp_port)
        )
    }
}

impl FromStr for Enode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Enode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Enode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Enodes;

    fn url(suffix: &str) -> String {
        format!("enode://{}@{suffix}", "a1".repeat(64))
    }

    #[test]
    fn test_parse_basic() {
        let node = Enode::parse(&url("10.3.58.6:30303")).unwrap();
        assert_eq!(node.ip(), "10.3.58.6".parse::<IpAddr>().unwrap());
        assert_eq!(node.tcp_port(), 30303);
        assert_eq!(node.udp_port(), 30303);
        assert_eq!(node.id(), vec![0xa1; 64]);
        assert_eq!(node.to_string(), url("10.3.58.6:30303"));
    }

    #[test]
    fn test_parse_discport_and_ipv6() {
        let node = Enode::parse(&url("[::1]:30303?discport=30301")).unwrap();
        assert!(node.ip().is_ipv6());
        assert_eq!(node.udp_port(), 30301);
        assert_eq!(node.to_string(), url("[::1]:30303?discport=30301"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Enode::parse("http://x").is_err());
        assert!(Enode::parse("enode://abcd@1.2.3.4:1").is_err());
        assert!(Enode::parse(&format!("enode://{}", "a1".repeat(64))).is_err());
        assert!(Enode::parse(&url("1.2.3.4")).is_err());
        assert!(Enode::parse(&url("1.2.3.4:30303?discport=x")).is_err());
    }

    #[test]
    fn test_enodes_append() {
        let mut nodes = Enodes::new_empty();
        nodes.append(&Enode::parse(&url("1.2.3.4:1")).unwrap());
        assert_eq!(nodes.size(), 1);
        assert_eq!(nodes.get(0).unwrap().tcp_port(), 1);
        assert!(nodes.get(1).is_err());
    }
}
