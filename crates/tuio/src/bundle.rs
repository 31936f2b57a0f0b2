//! OSC packet tree: messages and (possibly nested) bundles.

use crate::atom::{OscAtom, OscTimestamp, Reader};
use crate::error::DecodeError;
use serde::Serialize;

/// Address literal that opens every OSC bundle.
pub const BUNDLE_TAG: &str = "#bundle";

/// Deepest bundle nesting accepted by [decode_packet]. OSC itself sets no limit.
pub const MAX_BUNDLE_DEPTH: usize = 8;

/// OSC message: address pattern plus positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscAtom>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscAtom>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }
}

/// OSC bundle: time tag plus ordered elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OscBundle {
    pub timestamp: OscTimestamp,
    pub elements: Vec<OscPacket>,
}

/// Either a single message or a bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

/// Decodes one complete OSC packet (a UDP datagram or one TCP frame).
pub fn decode_packet(data: &[u8]) -> Result<OscPacket, DecodeError> {
    decode_at_depth(data, 0)
}

fn decode_at_depth(data: &[u8], depth: usize) -> Result<OscPacket, DecodeError> {
    let mut reader = Reader::new(data);
    let address = reader.read_string()?;
    if address == BUNDLE_TAG {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(DecodeError::NestingTooDeep(MAX_BUNDLE_DEPTH));
        }
        decode_bundle_body(&mut reader, depth).map(OscPacket::Bundle)
    } else {
        decode_message_body(&mut reader, address).map(OscPacket::Message)
    }
}

fn decode_bundle_body(reader: &mut Reader<'_>, depth: usize) -> Result<OscBundle, DecodeError> {
    let timestamp = reader.read_timestamp()?;
    let mut elements = Vec::new();
    while !reader.is_empty() {
        let size = reader.read_i32()?;
        if size < 0 {
            return Err(DecodeError::InvalidLength(size));
        }
        let element = reader.take(size as usize)?;
        elements.push(decode_at_depth(element, depth + 1)?);
    }
    Ok(OscBundle {
        timestamp,
        elements,
    })
}

fn decode_message_body(reader: &mut Reader<'_>, address: String) -> Result<OscMessage, DecodeError> {
    // Address with nothing after it: no type tags, no arguments.
    if reader.is_empty() {
        return Ok(OscMessage {
            address,
            args: Vec::new(),
        });
    }
    let tags = reader.read_string()?;
    let tag_chars = match tags.strip_prefix(',') {
        Some(rest) => rest,
        None => return Err(DecodeError::MalformedTypeTags(tags)),
    };
    let mut args = Vec::with_capacity(tag_chars.len());
    for tag in tag_chars.chars() {
        args.push(reader.read_atom(tag)?);
    }
    Ok(OscMessage { address, args })
}
