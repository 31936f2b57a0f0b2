//! Common helpers for integration tests.
//! Some helpers are only used by specific test binaries; allow dead_code to avoid per-binary warnings.
#![allow(dead_code)]

use caress::{TouchEvent, TouchEventKind};
use tuio::{OscAtom, OscBundle, OscMessage, OscPacket, OscTimestamp, TuioPacket};

pub fn s(v: &str) -> OscAtom {
    OscAtom::String(v.to_string())
}

pub fn msg(address: &str, args: Vec<OscAtom>) -> OscMessage {
    OscMessage::new(address, args)
}

pub fn source(profile: &str, name: &str) -> OscMessage {
    msg(profile, vec![s("source"), s(name)])
}

pub fn alive(profile: &str, ids: &[i32]) -> OscMessage {
    let mut args = vec![s("alive")];
    args.extend(ids.iter().map(|i| OscAtom::Int32(*i)));
    msg(profile, args)
}

pub fn fseq(profile: &str, frame: i32) -> OscMessage {
    msg(profile, vec![s("fseq"), OscAtom::Int32(frame)])
}

pub fn cursor_set(id: i32, x: f32, y: f32) -> OscMessage {
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

pub fn blob_set(id: i32, x: f32, y: f32, width: f32, height: f32) -> OscMessage {
    msg(
        "/tuio/2Dblb",
        vec![
            s("set"),
            OscAtom::Int32(id),
            OscAtom::Float32(x),
            OscAtom::Float32(y),
            OscAtom::Float32(0.0),
            OscAtom::Float32(width),
            OscAtom::Float32(height),
            OscAtom::Float32(width * height),
        ],
    )
}

pub fn osc_bundle(messages: Vec<OscMessage>) -> OscPacket {
    OscPacket::Bundle(OscBundle {
        timestamp: OscTimestamp::IMMEDIATE,
        elements: messages.into_iter().map(OscPacket::Message).collect(),
    })
}

/// Decoded TUIO packet for a flat bundle of `messages`.
pub fn packet(messages: Vec<OscMessage>) -> TuioPacket {
    let bytes = tuio::encode_packet(&osc_bundle(messages));
    tuio::decode_tuio(&bytes).expect("fixture decodes")
}

pub fn summary(events: &[TouchEvent]) -> Vec<(TouchEventKind, String, i32)> {
    events
        .iter()
        .map(|e| (e.kind, e.touch.source.clone(), e.identifier()))
        .collect()
}
