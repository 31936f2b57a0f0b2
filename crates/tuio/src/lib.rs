//! TUIO over OSC: pure, reentrant decoding of TUIO 1.1 bundles.
//!
//! - **atom / bundle**: OSC 1.0 binary format (big-endian numbers, 4-byte aligned
//!   strings and blobs, recursive `#bundle`s with a bounded nesting depth).
//! - **profile**: TUIO message types (`source`, `alive`, `set`, `fseq`) over the
//!   2D cursor, object and blob profiles.
//! - **packet**: [decode_tuio] turns one datagram/frame into a [TuioPacket], the
//!   structure published to event sinks, with duplicate-bundle detection.
//! - **encode**: the inverse direction, for simulators and fixtures.
//!
//! Nothing here holds state; the reconciliation of alive sets into touch
//! lifecycle events lives in the `caress` crate.

pub mod atom;
pub mod bundle;
pub mod encode;
pub mod error;
pub mod packet;
pub mod profile;

pub use atom::{OscAtom, OscTimestamp, Reader};
pub use bundle::{decode_packet, OscBundle, OscMessage, OscPacket, BUNDLE_TAG, MAX_BUNDLE_DEPTH};
pub use encode::encode_packet;
pub use error::DecodeError;
pub use packet::{decode_tuio, PacketEntry, RejectedMessage, TuioPacket};
pub use profile::{
    decode_message, Blob2D, Cursor2D, EntityKind, MessageBody, Object2D, Profile, SetFields,
    TuioMessage, DUPLICATE_FRAME_ID,
};

/// TUIO protocol version implemented.
pub const PROTOCOL: &str = "1.1";
