//! The closed set of transports the server listens on.

use std::fmt;

use crate::config::PortsConfig;

/// One listener's protocol: which family of responder it feeds and whether
/// the socket is wrapped in TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transport {
    /// HTTP/1.1 over plain TCP.
    Http,
    /// HTTP over TLS.
    Https,
    /// Raw byte stream over plain TCP.
    Tcp,
    /// Raw byte stream over TLS.
    Tls,
}

/// Which responder a transport hands its connections to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Http,
    Stream,
}

impl Transport {
    /// Every transport, in bind order.
    pub const ALL: [Transport; 4] = [Transport::Http, Transport::Https, Transport::Tcp, Transport::Tls];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Https => "https",
            Transport::Tcp => "tcp",
            Transport::Tls => "tls",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Transport::Http | Transport::Https => Family::Http,
            Transport::Tcp | Transport::Tls => Family::Stream,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Transport::Https | Transport::Tls)
    }

    /// The configured port for this transport.
    pub fn port(&self, ports: &PortsConfig) -> u16 {
        match self {
            Transport::Http => ports.http,
            Transport::Https => ports.https,
            Transport::Tcp => ports.tcp,
            Transport::Tls => ports.tls,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
