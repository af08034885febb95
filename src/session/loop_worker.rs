use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::PoseSession;
use crate::pose::PoseFrame;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Announces the session, then feeds every received frame to the session until cancelled or the sender side is gone,
/// then shuts the session down.
pub async fn frame_loop(
    mut session: PoseSession,
    mut frames: mpsc::Receiver<Option<PoseFrame>>,
    cancel_token: CancellationToken,
) {
    session.announce().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("frame loop shutting down");
                break;
            }
            frame = frames.recv() => match frame {
                Some(frame) => {
                    session.on_frame(frame).await;
                }
                None => {
                    log_info!("frame source closed");
                    break;
                }
            }
        }
    }

    session.shutdown().await;
}
