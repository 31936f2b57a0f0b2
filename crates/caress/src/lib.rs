//! Caress: TUIO server and touch client.
//!
//! - **CaressServer**: listens for TUIO over UDP datagrams and/or TCP streams, decodes each
//!   packet with the `tuio` crate and broadcasts [ServerEvent]s.
//! - **Reconciler**: turns successive alive/set messages into touch lifecycle events
//!   (touchstart, touchmove, touchend, touchcancel) per source and entity kind.
//! - **TouchClient**: owns one [Reconciler], drives it from a server subscription and
//!   rebroadcasts [TouchEvent]s.

pub mod client;
pub mod config;
pub mod entity;
pub mod event;
pub mod logging;
pub mod reconcile;
pub mod server;
pub mod touch;

pub use client::TouchClient;
pub use config::{DuplicatePolicy, DEFAULT_CHANNEL_CAPACITY, PacketFormat, ReconnectionConfig, ServerConfig};
pub use entity::TrackedEntity;
pub use event::{TouchEvent, TouchEventKind};
pub use reconcile::{ReconciliationState, Reconciler, LOCAL_SOURCE};
pub use server::{read_frame, CaressServer, FrameError, ServerEvent, Transport};
pub use touch::{Size, SurfacePoint, TargetId, TouchPoint, TouchSurface, Viewport};
pub use tuio::PROTOCOL;

/// Server version reported by the examples.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
