//! Per-peer connection handling

use std::sync::Arc;

use linkd_bus::{Bus, Message, ObjectPath, Value, interfaces};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::SocketBus;
use crate::codec;
use crate::dispatch::Inbound;

/// Member of the greeting sent to every new peer
pub const HELLO: &str = "Hello";

/// Serve one peer until it disconnects or the server shuts down
///
/// Inbound lines are decoded and forwarded to the dispatcher. Outbound frames
/// queued on the bus are written as they arrive. When the peer closes its
/// end, each disconnect watch on it is reported to the dispatcher; after a
/// server shutdown the queue is drained (so final `Release` frames go out)
/// and the connection closes once the bus drops it.
pub async fn handle_connection(
    stream: UnixStream,
    bus: Arc<SocketBus>,
    inbound: mpsc::Sender<Inbound>,
    shutdown: CancellationToken,
) {
    let (name, mut outbound) = bus.connect_peer();
    info!(peer = %name, "client connected");

    let hello = Message::notify(
        name.clone(),
        ObjectPath::root(),
        interfaces::BUS,
        HELLO,
        vec![Value::String(name.clone())],
    );
    if let Err(e) = bus.send(hello) {
        warn!(peer = %name, error = %e, "failed to greet peer");
    }

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut reading = true;

    loop {
        tokio::select! {
            _ = shutdown.cancelled(), if reading => {
                debug!(peer = %name, "server shutting down, no longer reading");
                reading = false;
            }
            line = lines.next_line(), if reading => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if !forward(&name, &line, &inbound).await {
                        reading = false;
                    }
                }
                Ok(None) => {
                    reading = false;
                    peer_gone(&name, &bus, &inbound).await;
                }
                Err(e) => {
                    warn!(peer = %name, error = %e, "read failed");
                    reading = false;
                    peer_gone(&name, &bus, &inbound).await;
                }
            },
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = write_frame(&mut write_half, &frame).await {
                        warn!(peer = %name, error = %e, "write failed");
                        if reading {
                            peer_gone(&name, &bus, &inbound).await;
                        }
                        break;
                    }
                }
                None => break,
            },
        }
    }

    info!(peer = %name, "client disconnected");
}

/// Decode one line and hand it to the dispatcher
///
/// Returns `false` once the dispatcher is gone.
async fn forward(name: &str, line: &str, inbound: &mpsc::Sender<Inbound>) -> bool {
    let mut call = match codec::decode(line) {
        Ok(Message::Call(call)) => call,
        Ok(other) => {
            debug!(peer = name, frame = ?other, "ignoring non-call frame");
            return true;
        }
        Err(e) => {
            warn!(peer = name, error = %e, "dropping malformed frame");
            return true;
        }
    };
    // a peer cannot speak for anyone else
    call.sender = name.to_string();

    if inbound.send(Inbound::Call(call)).await.is_err() {
        debug!(peer = name, "dispatcher gone");
        return false;
    }
    true
}

async fn peer_gone(name: &str, bus: &SocketBus, inbound: &mpsc::Sender<Inbound>) {
    for id in bus.disconnect_peer(name) {
        if inbound.send(Inbound::WatchFired(id)).await.is_err() {
            break;
        }
    }
}

async fn write_frame(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    frame: &Message,
) -> std::io::Result<()> {
    let line = codec::encode(frame).map_err(std::io::Error::other)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
