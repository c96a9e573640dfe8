/*
Parameter Automation
====================

An AudioParam is a value that can be scheduled to change over time on the
audio clock. Envelopes in this crate are nothing more than automation on a
gain parameter:

  pad swell     set 0.0001 at t, linear ramp to 0.12 at t + 4.2
  chime strike  set 0 at t, linear ramp to 0.25 at t + 0.01,
                exponential ramp to 0.0001 at t + 4.5

Events are kept sorted by time. To find the value at time t:

  1. prev = last event at or before t (or the plain value if none)
  2. next = first event after t
  3. if next is a ramp, interpolate from prev to next; otherwise hold prev

    value
      ^          linear         exponential
      |          ramp     ____  ramp
      |         /              \_
      |        /                 \__
      |_______/                     \_______
      +---------------------------------------> time
           set    ramp end        ramp end

Exponential ramps move by a constant ratio per unit time, which the ear
hears as a steady fade. They cannot cross or touch zero, so a target of 0 is
rejected and a ramp starting from 0 holds until its end time.

Events fully in the past are pruned as rendering advances; the last one is
kept as the anchor for any ramp that follows it.
*/

use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EventKind {
    SetValue,
    LinearRamp,
    ExponentialRamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AutomationEvent {
    kind: EventKind,
    time: f64,
    value: f32,
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f32,
    anchor: f64,
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            anchor: 0.0,
            events: Vec::new(),
        }
    }

    /// The plain value, ignoring automation.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set the value immediately, discarding all scheduled automation.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.events.clear();
    }

    pub fn has_automation(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(EventKind::SetValue, value, time);
    }

    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(EventKind::LinearRamp, value, time);
    }

    /// Ramp exponentially from the previous event to `value`, arriving at
    /// `time`. `value` must be positive.
    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f32,
        time: f64,
    ) -> Result<(), GraphError> {
        if value.is_nan() || value <= 0.0 {
            return Err(GraphError::InvalidRamp(value));
        }
        self.insert(EventKind::ExponentialRamp, value, time);
        Ok(())
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|event| event.time < time);
    }

    /// Value at `time` including automation.
    pub fn value_at(&self, time: f64) -> f32 {
        let next = self.events.partition_point(|event| event.time <= time);
        let (t0, v0) = match next.checked_sub(1).map(|i| self.events[i]) {
            Some(prev) => (prev.time, prev.value),
            None => (self.anchor, self.value),
        };

        match self.events.get(next) {
            Some(ramp) if ramp.kind == EventKind::LinearRamp => {
                let span = ramp.time - t0;
                if span <= 0.0 {
                    ramp.value
                } else {
                    let frac = ((time - t0) / span) as f32;
                    v0 + (ramp.value - v0) * frac
                }
            }
            Some(ramp) if ramp.kind == EventKind::ExponentialRamp => {
                let span = ramp.time - t0;
                if v0 <= 0.0 || span <= 0.0 {
                    v0
                } else {
                    let frac = ((time - t0) / span) as f32;
                    v0 * (ramp.value / v0).powf(frac)
                }
            }
            _ => v0,
        }
    }

    /// Write per-sample values for a block starting at `start`, then forget
    /// events that can no longer affect anything at or after `start`.
    pub fn fill(&mut self, start: f64, sample_rate: f32, out: &mut [f32]) {
        self.prune(start);

        let settled = self.events.last().map_or(true, |last| last.time <= start);
        if settled {
            out.fill(self.value_at(start));
            return;
        }

        let step = 1.0 / sample_rate as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start + i as f64 * step);
        }
    }

    /// Remove events before the last one at or before `time`. When that
    /// leaves a single past event, fold it into the plain value.
    pub fn prune(&mut self, time: f64) {
        let passed = self.events.partition_point(|event| event.time <= time);
        if passed > 1 {
            self.events.drain(..passed - 1);
        }
        if self.events.len() == 1 && self.events[0].time <= time {
            let last = self.events[0];
            self.value = last.value;
            self.anchor = last.time;
            self.events.clear();
        }
    }

    fn insert(&mut self, kind: EventKind, value: f32, time: f64) {
        let time = time.max(0.0);
        let index = self.events.partition_point(|event| event.time <= time);
        self.events.insert(index, AutomationEvent { kind, time, value });
    }
}
