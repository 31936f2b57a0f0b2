//! Example: run the TUIO listener and a touch client, printing one JSON line per event.
//!
//! Point a TUIO tracker (or the `tuio_send` example) at the listener. By default every
//! touch event is printed; `--packets` prints the decoded bundles instead.
//!
//! Usage:
//!
//!   cargo run -p caress --example caress_server -- [--host 0.0.0.0] [--port 3333] [--tcp] [--no-udp]
//!
//! Options:
//!   --packets           Print server events (decoded packets, connects, drops) instead of touches.
//!   --osc               Publish raw OSC packets instead of TUIO (implies --packets).
//!   --apply-duplicates  Reconcile bundles carrying `fseq -1` instead of skipping them.
//!   --capacity <N>      Event channel capacity for the server and the touch client. Default: 256.
//!   --width / --height  Viewport size used for client/page/screen coordinates. Default: 1920x1080.

use caress::{
    logging, CaressServer, DuplicatePolicy, PacketFormat, ServerConfig, TouchClient, Viewport,
    PROTOCOL, VERSION,
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    logging::init("caress=info");
    let args: Vec<String> = std::env::args().collect();
    let mut config = ServerConfig::default();
    let mut print_packets = false;
    let mut duplicates = DuplicatePolicy::Suppress;
    let mut width: f32 = 1920.0;
    let mut height: f32 = 1080.0;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                if let Some(h) = args.get(i) {
                    config.host = h.clone();
                }
            }
            "--port" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    config.port = s.parse().unwrap_or(3333);
                }
            }
            "--tcp" => config.use_tcp = true,
            "--no-udp" => config.use_udp = false,
            "--packets" => print_packets = true,
            "--osc" => {
                config.format = PacketFormat::Osc;
                print_packets = true;
            }
            "--apply-duplicates" => duplicates = DuplicatePolicy::Apply,
            "--capacity" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    config.channel_capacity = s.parse().unwrap_or(config.channel_capacity);
                }
            }
            "--width" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    width = s.parse().unwrap_or(width);
                }
            }
            "--height" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    height = s.parse().unwrap_or(height);
                }
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: caress_server [--host H] [--port P] [--tcp] [--no-udp] [--packets] [--osc]\n\
                     \x20                    [--apply-duplicates] [--capacity N] [--width W] [--height H]\n\
                     Prints one-line JSON per touch event (or per server event with --packets)."
                );
                std::process::exit(0);
            }
            other => tracing::warn!(arg = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    tracing::info!(version = VERSION, protocol = PROTOCOL, addr = %config.bind_addr(), "starting caress");
    let capacity = config.channel_capacity;
    let server = Arc::new(CaressServer::new(config));
    let mut packets = server.subscribe();
    let client = TouchClient::with_capacity(Viewport::new(width, height), duplicates, capacity);
    let mut touches = client.subscribe();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let server_task = tokio::spawn(Arc::clone(&server).run());
        tokio::spawn(client.run(server.subscribe()));
        loop {
            tokio::select! {
                Ok(ev) = packets.recv(), if print_packets => {
                    println!("{}", serde_json::to_string(&ev)?);
                }
                Ok(ev) = touches.recv(), if !print_packets => {
                    println!("{}", serde_json::to_string(&ev)?);
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        server_task.abort();
        Ok::<(), anyhow::Error>(())
    })
}
