use statig::blocking::{IntoStateMachineExt as _, StateMachine};

use crate::delivery::{DeliveryContext, DeliveryEvent, DeliveryHsm, DeliveryStateId, DeliveryStats};
use crate::detect::{Classification, Detector};
use crate::ports::{Outbound, SendRejected};
use crate::types::{Event, SampleBatch};
use crate::wire::EventRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineAction {
    StatusUpdate { sensitivity: i32, detected: bool },
    HapticPulse,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionBuffer {
    len: usize,
    slots: [Option<EngineAction>; Self::MAX],
}

impl ActionBuffer {
    pub const MAX: usize = 4;

    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [None; Self::MAX],
        }
    }

    pub fn push(&mut self, action: EngineAction) {
        if self.len >= Self::MAX {
            return;
        }
        self.slots[self.len] = Some(action);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineAction> {
        self.slots[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn contains_haptic_pulse(&self) -> bool {
        self.iter()
            .any(|action| matches!(action, EngineAction::HapticPulse))
    }

    pub fn status_update(&self) -> Option<(i32, bool)> {
        self.iter().find_map(|action| match action {
            EngineAction::StatusUpdate {
                sensitivity,
                detected,
            } => Some((*sensitivity, *detected)),
            EngineAction::HapticPulse => None,
        })
    }
}

/// How the synchronous hand-off of one launch went.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LaunchOutcome {
    #[default]
    None,
    Accepted {
        bytes: usize,
    },
    RejectedBusy,
    RejectedByLink {
        code: u8,
    },
    EncodeFailed,
}

/// Per-dispatch diagnostics, for the task loop to log from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchTrace {
    pub state_id: DeliveryStateId,
    pub shake: bool,
    pub dy: i32,
    pub launch: LaunchOutcome,
    pub dropped_while_busy: bool,
    pub outcome_reason: Option<u8>,
    pub inbound_ignored: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EngineOutput {
    pub actions: ActionBuffer,
    pub trace: DispatchTrace,
}

/// The single control loop core: every callback of the system arrives
/// here as one `Event`, runs to completion, and maps deterministically
/// onto detector/delivery state plus a small action list.
pub struct Engine {
    detector: Detector,
    delivery: StateMachine<DeliveryHsm>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            detector: Detector::new(),
            delivery: DeliveryHsm::new().state_machine(),
        }
    }

    pub fn dispatch(&mut self, event: &Event, out: &mut Outbound<'_>) -> EngineOutput {
        let mut output = EngineOutput::default();

        match *event {
            Event::AccelBatch(batch) => self.on_batch(&batch, out, &mut output),
            Event::SensitivityUp => {
                let sensitivity = self.detector.raise();
                output.actions.push(EngineAction::StatusUpdate {
                    sensitivity,
                    detected: false,
                });
            }
            Event::SensitivityDown => {
                let sensitivity = self.detector.lower();
                output.actions.push(EngineAction::StatusUpdate {
                    sensitivity,
                    detected: false,
                });
            }
            Event::OutboxSent => {
                self.handle_delivery(DeliveryEvent::Sent);
            }
            Event::OutboxFailed { reason } => {
                // Re-arm only; the event is gone and the next physical
                // gesture is what triggers a new attempt.
                self.handle_delivery(DeliveryEvent::Failed { reason });
                output.trace.outcome_reason = Some(reason);
            }
            Event::HostInbound { .. } => {
                output.trace.inbound_ignored = true;
            }
        }

        output.trace.state_id = self.delivery.inner().state_id();
        output
    }

    pub fn sensitivity(&self) -> i32 {
        self.detector.sensitivity()
    }

    pub fn state_id(&self) -> DeliveryStateId {
        self.delivery.inner().state_id()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.delivery.inner().stats()
    }

    fn on_batch(&mut self, batch: &SampleBatch, out: &mut Outbound<'_>, output: &mut EngineOutput) {
        match self.detector.classify(batch) {
            Classification::Shake { dy } => {
                output.trace.shake = true;
                output.trace.dy = dy;
                output.actions.push(EngineAction::StatusUpdate {
                    sensitivity: self.detector.sensitivity(),
                    detected: true,
                });

                let context = self.handle_delivery(DeliveryEvent::Gesture);
                if context.launch_requested {
                    let launch = Self::launch(out);
                    output.trace.launch = launch;
                    if !matches!(launch, LaunchOutcome::Accepted { .. }) {
                        // Initiation failed synchronously; fall straight
                        // back to armed instead of leaking an attempt
                        // that will never resolve.
                        self.handle_delivery(DeliveryEvent::LaunchFailed);
                    }
                    output.actions.push(EngineAction::HapticPulse);
                } else {
                    output.trace.dropped_while_busy = true;
                }
            }
            Classification::Quiet => {
                output.actions.push(EngineAction::StatusUpdate {
                    sensitivity: self.detector.sensitivity(),
                    detected: false,
                });
            }
        }
    }

    fn launch(out: &mut Outbound<'_>) -> LaunchOutcome {
        let epoch_seconds = out.clock.epoch_seconds();
        let record = match out
            .heading
            .as_mut()
            .and_then(|source| source.heading_degrees())
        {
            Some(heading_degrees) => EventRecord::DirectedShake {
                epoch_seconds,
                heading_degrees,
            },
            None => EventRecord::Shake { epoch_seconds },
        };

        let frame = match record.encode() {
            Ok(frame) => frame,
            Err(_) => return LaunchOutcome::EncodeFailed,
        };

        match out.channel.try_send(&frame) {
            Ok(bytes) => LaunchOutcome::Accepted { bytes },
            Err(SendRejected::Busy) => LaunchOutcome::RejectedBusy,
            Err(SendRejected::Rejected(code)) => LaunchOutcome::RejectedByLink { code },
        }
    }

    fn handle_delivery(&mut self, event: DeliveryEvent) -> DeliveryContext {
        let mut context = DeliveryContext::default();
        self.delivery.handle_with_context(&event, &mut context);
        context
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
