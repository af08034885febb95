use anyhow::{bail, Context, Result};
use log::{debug, info};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::pose::PoseFrame;

use super::loop_worker::frame_loop;
use super::PoseSession;

/// Frames buffered between the camera and the correction loop.
const FRAME_BUFFER: usize = 4;

/// Camera-side handle of a running session.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Option<PoseFrame>>,
}

impl FrameSender {
    /// Hand a frame to the loop without waiting. Returns false when it was dropped.
    pub fn offer(&self, frame: Option<PoseFrame>) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("frame loop behind, dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Wait for room in the buffer instead of dropping.
    pub async fn send(&self, frame: Option<PoseFrame>) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| anyhow::anyhow!("session is not running"))
    }
}

pub struct SessionController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn start(&mut self, session: PoseSession) -> Result<FrameSender> {
        if self.is_running() {
            bail!("session already active");
        }

        let cancel_token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);

        let handle = tokio::spawn(frame_loop(session, rx, cancel_token.clone()));
        info!("pose session started");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(FrameSender { tx })
    }

    /// Stop the loop and wait for it to cancel capture and speech.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("frame loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }

    /// Wait for the loop to end on its own, after every `FrameSender` is dropped.
    pub async fn join(&mut self) -> Result<()> {
        self.cancel_token = None;
        match self.handle.take() {
            Some(handle) => handle.await.context("frame loop task failed to join"),
            None => Ok(()),
        }
    }
}
