//! Keepalive pings for the gateway session.
//!
//! Each ping carries a big-endian sequence number that the gateway echoes
//! back in its pong, so pong traces can be matched to the ping that caused
//! them. The read pump owns the pong deadline.

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use imagine_protocol::constants::WS_PING_PERIOD;

/// Sends a numbered ping every [`WS_PING_PERIOD`], starting one period in.
pub(crate) async fn ping_pump(
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + WS_PING_PERIOD, WS_PING_PERIOD);
    // After a stalled write, resume the cadence instead of bursting.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                seq = seq.wrapping_add(1);
                trace!(seq, "sending ping");
                let ping = tungstenite::Message::Ping(seq.to_be_bytes().to_vec().into());
                if write_tx.send(ping).await.is_err() {
                    debug!(seq, "writer gone, ping pump exiting");
                    break;
                }
            }
        }
    }
}

/// Sequence number carried by a ping or its pong, if it is one of ours.
pub(crate) fn ping_seq(data: &[u8]) -> Option<u64> {
    data.try_into().ok().map(u64::from_be_bytes)
}
