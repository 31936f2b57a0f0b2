//! OSC encoder: the inverse of [crate::bundle::decode_packet].
//!
//! Used to produce TUIO streams (see the `tuio_send` example) and to build
//! fixtures in tests.

use crate::atom::{pad4, OscAtom, OscTimestamp};
use crate::bundle::{OscBundle, OscMessage, OscPacket, BUNDLE_TAG};

/// Encodes a packet into a fresh buffer.
pub fn encode_packet(packet: &OscPacket) -> Vec<u8> {
    let mut out = Vec::new();
    write_packet(&mut out, packet);
    out
}

/// Appends the encoding of `packet` to `out`.
pub fn write_packet(out: &mut Vec<u8>, packet: &OscPacket) {
    match packet {
        OscPacket::Message(m) => write_message(out, m),
        OscPacket::Bundle(b) => write_bundle(out, b),
    }
}

fn write_message(out: &mut Vec<u8>, message: &OscMessage) {
    write_string(out, &message.address);
    let mut tags = String::with_capacity(message.args.len() + 1);
    tags.push(',');
    tags.extend(message.args.iter().map(OscAtom::type_tag));
    write_string(out, &tags);
    for arg in &message.args {
        write_atom(out, arg);
    }
}

fn write_bundle(out: &mut Vec<u8>, bundle: &OscBundle) {
    write_string(out, BUNDLE_TAG);
    write_timestamp(out, bundle.timestamp);
    for element in &bundle.elements {
        let size_at = out.len();
        out.extend_from_slice(&[0; 4]);
        write_packet(out, element);
        let size = (out.len() - size_at - 4) as i32;
        out[size_at..size_at + 4].copy_from_slice(&size.to_be_bytes());
    }
}

pub fn write_atom(out: &mut Vec<u8>, atom: &OscAtom) {
    match atom {
        OscAtom::Int32(i) => out.extend_from_slice(&i.to_be_bytes()),
        OscAtom::Float32(f) => out.extend_from_slice(&f.to_be_bytes()),
        OscAtom::String(s) => write_string(out, s),
        OscAtom::Blob(b) => {
            out.extend_from_slice(&(b.len() as i32).to_be_bytes());
            out.extend_from_slice(b);
            out.resize(out.len() + pad4(b.len()) - b.len(), 0);
        }
    }
}

/// Zero-terminated, zero-padded to a multiple of 4 (always at least one zero).
pub fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    let padded = pad4(s.len() + 1);
    out.resize(out.len() + padded - s.len(), 0);
}

pub fn write_timestamp(out: &mut Vec<u8>, t: OscTimestamp) {
    out.extend_from_slice(&t.seconds.to_be_bytes());
    out.extend_from_slice(&t.fraction.to_be_bytes());
}
