use statig::prelude::*;

/// Inputs to the delivery machine. `Gesture` comes from the detector;
/// `LaunchFailed` is fed back by the engine when a hand-off fails
/// synchronously; `Sent`/`Failed` are the asynchronous link outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryEvent {
    Gesture,
    LaunchFailed,
    Sent,
    Failed { reason: u8 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryStateId {
    #[default]
    Armed,
    InFlight,
}

/// Effects requested during one dispatch; executed by the engine within
/// the same call.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeliveryContext {
    pub launch_requested: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub launched: u32,
    pub delivered: u32,
    pub failed: u32,
    pub launch_failures: u32,
    pub dropped_while_busy: u32,
}

pub struct DeliveryHsm {
    state_id: DeliveryStateId,
    stats: DeliveryStats,
    last_failure_reason: u8,
}

impl DeliveryHsm {
    pub fn new() -> Self {
        Self {
            state_id: DeliveryStateId::Armed,
            stats: DeliveryStats::default(),
            last_failure_reason: 0,
        }
    }

    pub fn state_id(&self) -> DeliveryStateId {
        self.state_id
    }

    pub fn stats(&self) -> DeliveryStats {
        self.stats
    }

    pub fn last_failure_reason(&self) -> u8 {
        self.last_failure_reason
    }
}

impl Default for DeliveryHsm {
    fn default() -> Self {
        Self::new()
    }
}

#[state_machine(initial = "State::armed()")]
impl DeliveryHsm {
    #[state]
    fn armed(&mut self, context: &mut DeliveryContext, event: &DeliveryEvent) -> Outcome<State> {
        match event {
            DeliveryEvent::Gesture => {
                context.launch_requested = true;
                self.stats.launched += 1;
                self.state_id = DeliveryStateId::InFlight;
                Transition(State::in_flight())
            }
            // Outcomes can only be stale here; the attempt they belong to
            // was already resolved.
            DeliveryEvent::LaunchFailed | DeliveryEvent::Sent | DeliveryEvent::Failed { .. } => {
                Handled
            }
        }
    }

    #[state]
    fn in_flight(
        &mut self,
        context: &mut DeliveryContext,
        event: &DeliveryEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            DeliveryEvent::Gesture => {
                // At most one attempt outstanding; extra gestures are
                // dropped, never queued.
                self.stats.dropped_while_busy += 1;
                Handled
            }
            DeliveryEvent::LaunchFailed => {
                self.stats.launch_failures += 1;
                self.state_id = DeliveryStateId::Armed;
                Transition(State::armed())
            }
            DeliveryEvent::Sent => {
                self.stats.delivered += 1;
                self.state_id = DeliveryStateId::Armed;
                Transition(State::armed())
            }
            DeliveryEvent::Failed { reason } => {
                self.stats.failed += 1;
                self.last_failure_reason = *reason;
                self.state_id = DeliveryStateId::Armed;
                Transition(State::armed())
            }
        }
    }
}
