//! Decoded TUIO bundles, in the shape published to event sinks:
//! `{ bundle: true, duplicate, timestamp, messages: [...] }`.

use crate::atom::OscTimestamp;
use crate::bundle::{decode_packet, OscBundle, OscPacket};
use crate::error::DecodeError;
use crate::profile::{decode_message, TuioMessage};
use serde::Serialize;

/// A message that could not be interpreted. Kept in place so consumers see
/// where it was; it carries no decoded fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedMessage {
    pub profile: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip)]
    pub error: DecodeError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PacketEntry {
    Message(TuioMessage),
    Bundle(TuioPacket),
    Rejected(RejectedMessage),
}

/// One decoded TUIO bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuioPacket {
    /// Always true; bare messages are not TUIO packets.
    pub bundle: bool,
    /// Set when this bundle carries `fseq -1`.
    pub duplicate: bool,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: OscTimestamp,
    pub messages: Vec<PacketEntry>,
}

impl TuioPacket {
    /// Converts an already decoded OSC bundle.
    pub fn from_bundle(bundle: &OscBundle) -> TuioPacket {
        let mut messages = Vec::with_capacity(bundle.elements.len());
        let mut duplicate = false;
        for element in &bundle.elements {
            let entry = match element {
                OscPacket::Bundle(nested) => PacketEntry::Bundle(TuioPacket::from_bundle(nested)),
                OscPacket::Message(m) => match decode_message(m) {
                    Ok(message) => {
                        duplicate |= message.is_duplicate_marker();
                        PacketEntry::Message(message)
                    }
                    Err(error) => {
                        tracing::debug!(profile = %m.address, %error, "TUIO message rejected");
                        PacketEntry::Rejected(RejectedMessage {
                            profile: m.address.clone(),
                            kind: m.args.first().and_then(|a| a.as_str()).map(str::to_string),
                            error,
                        })
                    }
                },
            };
            messages.push(entry);
        }
        TuioPacket {
            bundle: true,
            duplicate,
            timestamp: bundle.timestamp,
            messages,
        }
    }

    /// Decoded messages of this bundle and all nested bundles, in wire order.
    pub fn iter_messages(&self) -> impl Iterator<Item = &TuioMessage> + '_ {
        let mut out = Vec::new();
        collect_messages(self, &mut out);
        out.into_iter()
    }

    /// Rejected messages of this bundle and all nested bundles, in wire order.
    pub fn rejected(&self) -> impl Iterator<Item = &RejectedMessage> + '_ {
        let mut out = Vec::new();
        collect_rejected(self, &mut out);
        out.into_iter()
    }
}

fn collect_messages<'a>(packet: &'a TuioPacket, out: &mut Vec<&'a TuioMessage>) {
    for entry in &packet.messages {
        match entry {
            PacketEntry::Message(m) => out.push(m),
            PacketEntry::Bundle(b) => collect_messages(b, out),
            PacketEntry::Rejected(_) => {}
        }
    }
}

fn collect_rejected<'a>(packet: &'a TuioPacket, out: &mut Vec<&'a RejectedMessage>) {
    for entry in &packet.messages {
        match entry {
            PacketEntry::Rejected(r) => out.push(r),
            PacketEntry::Bundle(b) => collect_rejected(b, out),
            PacketEntry::Message(_) => {}
        }
    }
}

fn serialize_timestamp<S: serde::Serializer>(t: &OscTimestamp, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(t.as_secs_f64())
}

/// Decodes a raw TUIO packet. Structural errors fail the whole packet;
/// per-message problems become [PacketEntry::Rejected].
pub fn decode_tuio(data: &[u8]) -> Result<TuioPacket, DecodeError> {
    match decode_packet(data)? {
        OscPacket::Bundle(bundle) => Ok(TuioPacket::from_bundle(&bundle)),
        OscPacket::Message(_) => Err(DecodeError::NotABundle),
    }
}
