//! CaressServer: receives TUIO over UDP and/or TCP and publishes decoded packets.
//!
//! Each transport runs in its own task and rebinds with backoff after a socket
//! failure. Decoding is pure and happens in the receiving task; subscribers get
//! one [ServerEvent] per packet, in arrival order per transport.

use crate::config::{PacketFormat, ServerConfig};
use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use tuio::{decode_packet, decode_tuio, OscPacket, TuioPacket};

/// Bytes of a dropped packet included in the log line.
const DROPPED_PREFIX_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Udp,
    Tcp,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Transport::Udp => "udp",
            Transport::Tcp => "tcp",
        })
    }
}

/// Everything the server tells its subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    Listening { transport: Transport, addr: SocketAddr },
    Connected { peer: SocketAddr },
    Packet(TuioPacket),
    Osc(OscPacket),
    Dropped { transport: Transport, peer: SocketAddr, reason: String },
    Error { transport: Transport, message: String },
    Disconnected { peer: SocketAddr },
}

/// TCP stream framing failures (OSC 1.0: big-endian int32 size, then the packet).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame of {size} bytes exceeds limit of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("negative frame size {0}")]
    NegativeLength(i32),
    #[error("stream ended inside a frame")]
    Truncated,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads one size-prefixed frame. `Ok(None)` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            return if filled == 0 { Ok(None) } else { Err(FrameError::Truncated) };
        }
        filled += n;
    }
    let size = i32::from_be_bytes(prefix);
    if size < 0 {
        return Err(FrameError::NegativeLength(size));
    }
    let size = size as usize;
    if size > max {
        return Err(FrameError::TooLarge { size, max });
    }
    let mut frame = vec![0u8; size];
    reader.read_exact(&mut frame).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => FrameError::Truncated,
        _ => FrameError::Io(e),
    })?;
    Ok(Some(frame))
}

pub struct CaressServer {
    config: ServerConfig,
    event_tx: broadcast::Sender<ServerEvent>,
}

impl CaressServer {
    pub fn new(config: ServerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self { config, event_tx }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Subscribe before calling [run](Self::run) to see the `Listening` events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.event_tx.subscribe()
    }

    /// Binds the enabled transports and serves until the task is dropped.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let mut tasks = Vec::new();
        if self.config.use_udp {
            tasks.push(tokio::spawn(Arc::clone(&self).supervise(Transport::Udp)));
        }
        if self.config.use_tcp {
            tasks.push(tokio::spawn(Arc::clone(&self).supervise(Transport::Tcp)));
        }
        if tasks.is_empty() {
            anyhow::bail!("no transport enabled");
        }
        for task in tasks {
            task.await.context("transport task")?;
        }
        Ok(())
    }

    async fn supervise(self: Arc<Self>, transport: Transport) {
        let reconnection = self.config.reconnection.clone();
        let initial = Duration::from_secs(reconnection.initial_backoff_secs);
        let max = Duration::from_secs(reconnection.max_backoff_secs);
        let mut backoff = initial;
        loop {
            let result = match transport {
                Transport::Udp => Arc::clone(&self).run_udp().await,
                Transport::Tcp => Arc::clone(&self).run_tcp().await,
            };
            match result {
                Ok(()) => {
                    backoff = initial;
                    sleep(initial).await;
                }
                Err(e) => {
                    tracing::warn!(%transport, reason = %e, "listener failed, rebinding...");
                    self.publish(ServerEvent::Error {
                        transport,
                        message: format!("{:#}", e),
                    });
                    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
                    sleep(backoff + jitter).await;
                    backoff = std::cmp::min(backoff * 2, max);
                }
            }
        }
    }

    async fn run_udp(self: Arc<Self>) -> Result<()> {
        let addr = self.config.bind_addr();
        let socket = UdpSocket::bind(&addr)
            .await
            .with_context(|| format!("bind UDP {}", addr))?;
        let local = socket.local_addr().context("UDP local addr")?;
        tracing::info!(%local, "listening for TUIO over UDP");
        self.publish(ServerEvent::Listening {
            transport: Transport::Udp,
            addr: local,
        });

        let mut buf = vec![0u8; self.config.max_packet_size];
        loop {
            let (len, peer) = socket.recv_from(&mut buf).await.context("UDP recv")?;
            self.publish_packet(Transport::Udp, &buf[..len], peer);
        }
    }

    async fn run_tcp(self: Arc<Self>) -> Result<()> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("bind TCP {}", addr))?;
        let local = listener.local_addr().context("TCP local addr")?;
        tracing::info!(%local, "listening for TUIO over TCP");
        self.publish(ServerEvent::Listening {
            transport: Transport::Tcp,
            addr: local,
        });

        loop {
            let (stream, peer) = listener.accept().await.context("TCP accept")?;
            let server = Arc::clone(&self);
            tokio::spawn(async move { server.serve_connection(stream, peer).await });
        }
    }

    async fn serve_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        tracing::info!(%peer, "TUIO client connected");
        self.publish(ServerEvent::Connected { peer });
        let max = self.config.max_packet_size;
        loop {
            match read_frame(&mut stream, max).await {
                Ok(Some(frame)) => self.publish_packet(Transport::Tcp, &frame, peer),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(%peer, reason = %e, "closing TCP connection");
                    self.publish(ServerEvent::Error {
                        transport: Transport::Tcp,
                        message: format!("{}: {}", peer, e),
                    });
                    break;
                }
            }
        }
        tracing::info!(%peer, "TUIO client disconnected");
        self.publish(ServerEvent::Disconnected { peer });
    }

    fn publish_packet(&self, transport: Transport, bytes: &[u8], peer: SocketAddr) {
        let decoded = match self.config.format {
            PacketFormat::Tuio => decode_tuio(bytes).map(ServerEvent::Packet),
            PacketFormat::Osc => decode_packet(bytes).map(ServerEvent::Osc),
        };
        match decoded {
            Ok(event) => self.publish(event),
            Err(e) => {
                let prefix = hex::encode(&bytes[..bytes.len().min(DROPPED_PREFIX_LEN)]);
                tracing::debug!(%transport, %peer, len = bytes.len(), prefix = %prefix, reason = %e, "packet dropped");
                self.publish(ServerEvent::Dropped {
                    transport,
                    peer,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error.
        let _ = self.event_tx.send(event);
    }
}
