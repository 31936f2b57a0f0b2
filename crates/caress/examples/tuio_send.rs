//! Example: simulate a TUIO tracker that moves cursors in a circle.
//!
//! Sends one bundle per frame (`source`, `alive`, one `set` per cursor, `fseq`) to a
//! caress listener, then an empty alive so every touch ends.
//!
//! Usage:
//!
//!   cargo run -p caress --example tuio_send -- [--to 127.0.0.1:3333] [--tcp] [--cursors 2] [--frames 120] [--fps 60]
//!
//! Options:
//!   --tcp             Send size-prefixed frames over TCP instead of UDP datagrams.
//!   --source <name>   Value of the `source` message. Default: tuio_send.
//!   --fps <N>         Frames per second, 1 to 1000.
//!   --repeat-dup      Resend every bundle with `fseq -1` to exercise duplicate handling.

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{interval, Duration};
use tuio::{encode_packet, OscAtom, OscBundle, OscMessage, OscPacket, OscTimestamp};

const PROFILE: &str = "/tuio/2Dcur";

enum Sink {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

impl Sink {
    async fn send(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        match self {
            Sink::Udp(socket) => {
                socket.send(bytes).await.context("UDP send")?;
            }
            Sink::Tcp(stream) => {
                stream
                    .write_all(&(bytes.len() as i32).to_be_bytes())
                    .await
                    .context("TCP write")?;
                stream.write_all(bytes).await.context("TCP write")?;
            }
        }
        Ok(())
    }
}

fn frame(source: &str, cursors: &[(i32, f32, f32)], fseq: i32) -> Vec<u8> {
    let mut elements = vec![OscMessage::new(
        PROFILE,
        vec![OscAtom::String("source".into()), OscAtom::String(source.into())],
    )];
    let mut alive = vec![OscAtom::String("alive".into())];
    alive.extend(cursors.iter().map(|(id, _, _)| OscAtom::Int32(*id)));
    elements.push(OscMessage::new(PROFILE, alive));
    for (id, x, y) in cursors {
        elements.push(OscMessage::new(
            PROFILE,
            vec![
                OscAtom::String("set".into()),
                OscAtom::Int32(*id),
                OscAtom::Float32(*x),
                OscAtom::Float32(*y),
                OscAtom::Float32(0.0),
                OscAtom::Float32(0.0),
                OscAtom::Float32(0.0),
            ],
        ));
    }
    elements.push(OscMessage::new(
        PROFILE,
        vec![OscAtom::String("fseq".into()), OscAtom::Int32(fseq)],
    ));
    encode_packet(&OscPacket::Bundle(OscBundle {
        timestamp: OscTimestamp::IMMEDIATE,
        elements: elements.into_iter().map(OscPacket::Message).collect(),
    }))
}

/// Highest frame rate sent; faster requests are clamped.
const MAX_FPS: u64 = 1000;

/// Time between frames; never zero, which `interval` rejects.
fn frame_period(fps: u64) -> Duration {
    Duration::from_secs_f64(1.0 / fps.clamp(1, MAX_FPS) as f64)
}

fn main() -> anyhow::Result<()> {
    caress::logging::init("tuio_send=info,caress=info");
    let args: Vec<String> = std::env::args().collect();
    let mut to = "127.0.0.1:3333".to_string();
    let mut use_tcp = false;
    let mut source = "tuio_send".to_string();
    let mut cursors: i32 = 2;
    let mut frames: i32 = 120;
    let mut fps: u64 = 60;
    let mut repeat_dup = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--to" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    to = s.clone();
                }
            }
            "--tcp" => use_tcp = true,
            "--source" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    source = s.clone();
                }
            }
            "--cursors" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cursors = s.parse().unwrap_or(cursors);
                }
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    frames = s.parse().unwrap_or(frames);
                }
            }
            "--fps" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    fps = s.parse().unwrap_or(fps).max(1);
                }
            }
            "--repeat-dup" => repeat_dup = true,
            "--help" | "-h" => {
                eprintln!(
                    "Usage: tuio_send [--to HOST:PORT] [--tcp] [--source NAME] [--cursors N] [--frames N] [--fps N] [--repeat-dup]\n\
                     Sends TUIO 2Dcur bundles moving N cursors in a circle."
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut sink = if use_tcp {
            Sink::Tcp(TcpStream::connect(&to).await.with_context(|| format!("connect {}", to))?)
        } else {
            let socket = UdpSocket::bind("0.0.0.0:0").await.context("bind UDP")?;
            socket.connect(&to).await.with_context(|| format!("connect {}", to))?;
            Sink::Udp(socket)
        };
        tracing::info!(%to, tcp = use_tcp, cursors, frames, "sending TUIO");

        let mut tick = interval(frame_period(fps));
        for n in 0..frames {
            tick.tick().await;
            let phase = n as f32 / frames.max(1) as f32 * std::f32::consts::TAU;
            let positions: Vec<(i32, f32, f32)> = (0..cursors)
                .map(|c| {
                    let angle = phase + c as f32 * std::f32::consts::TAU / cursors.max(1) as f32;
                    (c + 1, 0.5 + 0.3 * angle.cos(), 0.5 + 0.3 * angle.sin())
                })
                .collect();
            sink.send(&frame(&source, &positions, n + 1)).await?;
            if repeat_dup {
                sink.send(&frame(&source, &positions, tuio::DUPLICATE_FRAME_ID)).await?;
            }
        }
        sink.send(&frame(&source, &[], frames + 1)).await?;
        tracing::info!("done");
        Ok::<(), anyhow::Error>(())
    })
}
