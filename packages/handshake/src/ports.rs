use crate::wire::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendRejected {
    /// The link already has an attempt outstanding.
    Busy,
    /// The transport refused the attempt outright.
    Rejected(u8),
}

/// One-shot outbound transport to the paired host. Acceptance means
/// exactly one `OutboxSent` or `OutboxFailed` event will follow;
/// rejection is synchronous and nothing was queued.
pub trait HostChannel {
    fn try_send(&mut self, frame: &Frame) -> Result<usize, SendRejected>;
}

pub trait Clock {
    fn epoch_seconds(&self) -> u32;
}

/// Latest compass bearing in whole degrees (0..360); `None` without a
/// fix. Queried synchronously when a delivery launches.
pub trait HeadingSource {
    fn heading_degrees(&mut self) -> Option<i16>;
}

/// Capabilities a dispatch call may reach for. `heading` is absent in
/// the minimal build variant.
pub struct Outbound<'a> {
    pub channel: &'a mut dyn HostChannel,
    pub clock: &'a dyn Clock,
    pub heading: Option<&'a mut dyn HeadingSource>,
}
