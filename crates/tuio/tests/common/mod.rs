//! Common helpers for integration tests: hand-built OSC/TUIO packets.

#![allow(dead_code)]

use tuio::{OscAtom, OscBundle, OscMessage, OscPacket, OscTimestamp};

pub fn s(v: &str) -> OscAtom {
    OscAtom::String(v.to_string())
}

pub fn msg(address: &str, args: Vec<OscAtom>) -> OscPacket {
    OscPacket::Message(OscMessage::new(address, args))
}

pub fn bundle(elements: Vec<OscPacket>) -> OscPacket {
    OscPacket::Bundle(OscBundle {
        timestamp: OscTimestamp::IMMEDIATE,
        elements,
    })
}

pub fn source(profile: &str, address: &str) -> OscPacket {
    msg(profile, vec![s("source"), s(address)])
}

pub fn alive(profile: &str, ids: &[i32]) -> OscPacket {
    let mut args = vec![s("alive")];
    args.extend(ids.iter().map(|id| OscAtom::Int32(*id)));
    msg(profile, args)
}

pub fn fseq(profile: &str, frame: i32) -> OscPacket {
    msg(profile, vec![s("fseq"), OscAtom::Int32(frame)])
}

/// Full 2D cursor `set` with zero velocity and acceleration.
pub fn cursor_set(id: i32, x: f32, y: f32) -> OscPacket {
    msg(
        "/tuio/2Dcur",
        vec![
            s("set"),
            OscAtom::Int32(id),
            OscAtom::Float32(x),
            OscAtom::Float32(y),
            OscAtom::Float32(0.0),
            OscAtom::Float32(0.0),
            OscAtom::Float32(0.0),
        ],
    )
}

/// Hand-assembled bytes for a one-message bundle, independent of the encoder.
pub fn raw_single_message_bundle(message: &[u8]) -> Vec<u8> {
    let mut out = b"#bundle\0".to_vec();
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
    out.extend_from_slice(&(message.len() as i32).to_be_bytes());
    out.extend_from_slice(message);
    out
}
