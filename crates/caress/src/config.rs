//! Server and touch-client configuration.

use serde::Serialize;

/// Broadcast capacity used when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (UDP socket and TCP listener).
    pub host: String,
    /// Port for both transports. TUIO trackers default to 3333.
    pub port: u16,
    /// Receive TUIO datagrams over UDP.
    pub use_udp: bool,
    /// Accept TUIO streams over TCP (OSC 1.0 size-prefixed frames).
    pub use_tcp: bool,
    /// What to publish for each received packet.
    pub format: PacketFormat,
    /// Largest datagram or TCP frame accepted, in bytes.
    pub max_packet_size: usize,
    /// Capacity of the broadcast channel feeding subscribers.
    pub channel_capacity: usize,
    /// Rebind backoff after a socket failure.
    pub reconnection: ReconnectionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3333,
            use_udp: true,
            use_tcp: false,
            format: PacketFormat::Tuio,
            max_packet_size: 65_536,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            reconnection: ReconnectionConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Rebind backoff.
#[derive(Debug, Clone)]
pub struct ReconnectionConfig {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 1,
            max_backoff_secs: 60,
        }
    }
}

/// Published form of a received packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketFormat {
    /// Decoded TUIO bundle ([tuio::TuioPacket]).
    #[default]
    Tuio,
    /// Raw OSC tree ([tuio::OscPacket]) without TUIO interpretation.
    Osc,
}

/// What the touch client does with bundles flagged `duplicate` (`fseq -1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Skip the bundle: a retransmission carries no new state.
    #[default]
    Suppress,
    /// Reconcile it like any other bundle.
    Apply,
}
