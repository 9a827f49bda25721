//! Controller event batches and the link boundary to the decoder
//!
//! The protocol layer that actually talks to the handheld controller is
//! an external collaborator; it pushes decoded event batches through a
//! bounded channel. The resolver polls the link with a bounded timeout
//! so it can observe shutdown even when the player is idle.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

/// One polling cycle's worth of decoded controller events
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerBatch {
    /// Shoot button pressed in this batch
    pub trigger: bool,
    /// Recharge button pressed in this batch
    pub recharge: bool,
    /// Valid infrared markers currently visible to the controller,
    /// the proxy for "drone is in the aim"
    pub marker_count: u32,
    /// Dedicated abort button pressed
    pub abort: bool,
}

/// Result of one bounded poll on a controller link
#[derive(Debug, Clone, Copy)]
pub enum ControllerPoll {
    /// A batch of events arrived
    Batch(ControllerBatch),
    /// The wait elapsed with no events
    Timeout,
    /// The controller is not connected
    Disconnected,
}

/// Boundary to the controller decoding layer
pub trait ControllerLink: Send {
    /// Wait at most `timeout` for the next event batch
    fn poll(&mut self, timeout: Duration) -> ControllerPoll;
}

/// Errors the decoder can hit when feeding batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControllerFeedError {
    /// Buffer is full (resolver is behind, batch dropped)
    #[error("controller buffer full")]
    Full,
    /// Resolver side was dropped
    #[error("controller link closed")]
    Closed,
}

/// Production link: a bounded channel fed by the controller decoder
pub struct ChannelLink {
    receiver: Receiver<ControllerBatch>,
}

/// Clonable sender handle for the controller decoder
#[derive(Clone)]
pub struct ControllerFeed {
    sender: Sender<ControllerBatch>,
}

impl ChannelLink {
    /// Create a link and its feed. Capacity bounds how many batches can
    /// pile up between resolver polls.
    pub fn new(capacity: usize) -> (Self, ControllerFeed) {
        let (sender, receiver) = bounded(capacity);
        (Self { receiver }, ControllerFeed { sender })
    }
}

impl ControllerLink for ChannelLink {
    fn poll(&mut self, timeout: Duration) -> ControllerPoll {
        match self.receiver.recv_timeout(timeout) {
            Ok(batch) => ControllerPoll::Batch(batch),
            Err(RecvTimeoutError::Timeout) => ControllerPoll::Timeout,
            Err(RecvTimeoutError::Disconnected) => ControllerPoll::Disconnected,
        }
    }
}

impl ControllerFeed {
    /// Submit a batch (non-blocking)
    pub fn try_send(&self, batch: ControllerBatch) -> Result<(), ControllerFeedError> {
        self.sender.try_send(batch).map_err(|e| match e {
            TrySendError::Full(_) => ControllerFeedError::Full,
            TrySendError::Disconnected(_) => ControllerFeedError::Closed,
        })
    }
}
