#![no_std]

pub mod delivery;
pub mod detect;
pub mod engine;
pub mod ports;
pub mod types;
pub mod wire;

pub use delivery::{DeliveryStateId, DeliveryStats};
pub use detect::{status_line, Classification, Detector};
pub use engine::{ActionBuffer, Engine, EngineAction, EngineOutput, LaunchOutcome};
pub use ports::{Clock, HeadingSource, HostChannel, Outbound, SendRejected};
pub use types::{Event, Sample, SampleBatch, SAMPLES_PER_BATCH};
pub use wire::{EventRecord, Frame, WireError, FRAME_MAX};
