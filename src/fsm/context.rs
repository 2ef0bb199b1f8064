//! Blackboard threaded through one supervisor run.
//!
//! `CycleContext` holds boot-time decisions (config, ranger model,
//! carrier), the recovery state, and whatever the current cycle has
//! produced so far.  Each state reads what earlier states wrote:
//! `Acquire` fills the measurements, `Extract` the link and identity,
//! `Encode` the record.

use crate::config::DeviceConfig;
use crate::link::connect::Carrier;
use crate::link::{Identity, LinkStatus};
use crate::ranging::{RangingOutcome, RangingReading, SAMPLE_SLOTS};
use crate::ranging::model::SensorModel;
use crate::record::{RecordBuf, SampleSet};
use crate::recovery::{RecoveryState, ResetReason};
use crate::sensors::selector::SelectorSwitches;
use crate::transmit::TransmissionOutcome;

/// Measurements taken in `Acquire`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub ranging: RangingOutcome,
    pub battery_mv: Option<i16>,
    pub temperature_c: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct CycleContext {
    pub config: DeviceConfig,
    pub model: SensorModel,
    pub carrier: Carrier,
    pub recovery: RecoveryState,

    // --- Current cycle ---
    pub measurements: Option<Measurements>,
    pub link: LinkStatus,
    pub identity: Identity,
    pub record: RecordBuf,
    pub last_outcome: Option<TransmissionOutcome>,

    /// Set once the supervisor reaches `Reset`.
    pub reset_reason: Option<ResetReason>,
    pub cycles_completed: u32,
}

impl CycleContext {
    pub fn new(config: DeviceConfig) -> Self {
        let selectors = SelectorSwitches::default();
        Self {
            config,
            model: SensorModel::from_switches(&selectors),
            carrier: Carrier::from_switches(&selectors),
            recovery: RecoveryState::default(),
            measurements: None,
            link: LinkStatus::default(),
            identity: Identity::default(),
            record: RecordBuf::new(),
            last_outcome: None,
            reset_reason: None,
            cycles_completed: 0,
        }
    }

    /// Latch model and carrier from the boot-time selector sample.
    pub fn apply_selectors(&mut self, selectors: &SelectorSwitches) {
        self.model = SensorModel::from_switches(selectors);
        self.carrier = Carrier::from_switches(selectors);
    }

    /// Forget everything the previous cycle produced.
    pub fn begin_cycle(&mut self) {
        self.measurements = None;
        self.link = LinkStatus::default();
        self.identity = Identity::default();
        self.record.clear();
        self.last_outcome = None;
    }

    /// Assemble the sample set from this cycle's measurements and identity.
    /// Without measurements every ranging slot reads as timed out.
    pub fn sample_set(&self) -> SampleSet {
        let (ranging_mm, retry_count, battery_mv, temperature_c) = match self.measurements {
            Some(m) => (
                m.ranging.readings,
                m.ranging.retry_count(),
                m.battery_mv,
                m.temperature_c,
            ),
            None => ([RangingReading::Timeout; SAMPLE_SLOTS], 0, None, None),
        };
        SampleSet {
            timestamp: self.identity.timestamp.clone(),
            device_id: self.identity.iccid.clone(),
            battery_mv,
            temperature_c,
            ranging_mm,
            sensor_variant: self.model.variant(),
            retry_count,
        }
    }
}
