//! Bounded, decimated time series of the circuit flows for display.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One recorded row. Flows are those applied over the step ending at `t_h`;
/// masses are the holdup at `t_h`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub t_h: f64,
    pub feed_flow_tph: f64,
    pub fines_flow_tph: f64,
    pub recirc_flow_tph: f64,
    pub discharge_flow_tph: f64,
    pub feed_grade: f64,
    pub mill_grade: f64,
    pub target_flow_tph: f64,
    pub target_grade: f64,
    pub solids_t: f64,
    pub water_t: f64,
    pub copper_t: f64,
    pub moisture: f64,
}

/// Sliding window of samples; the oldest is dropped once full.
#[derive(Clone, Debug)]
pub struct History {
    capacity: usize,
    samples: VecDeque<HistorySample>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: HistorySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Column-wise copy, oldest first.
    pub fn series(&self) -> HistorySeries {
        let mut s = HistorySeries::with_capacity(self.samples.len());
        for row in &self.samples {
            s.push(row);
        }
        s
    }
}

/// Parallel arrays, all the same length and indexed by the same position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub t_h: Vec<f64>,
    pub feed_flow_tph: Vec<f64>,
    pub fines_flow_tph: Vec<f64>,
    pub recirc_flow_tph: Vec<f64>,
    pub discharge_flow_tph: Vec<f64>,
    pub feed_grade: Vec<f64>,
    pub mill_grade: Vec<f64>,
    pub target_flow_tph: Vec<f64>,
    pub target_grade: Vec<f64>,
    pub solids_t: Vec<f64>,
    pub water_t: Vec<f64>,
    pub copper_t: Vec<f64>,
    pub moisture: Vec<f64>,
}

impl HistorySeries {
    fn with_capacity(n: usize) -> Self {
        Self {
            t_h: Vec::with_capacity(n),
            feed_flow_tph: Vec::with_capacity(n),
            fines_flow_tph: Vec::with_capacity(n),
            recirc_flow_tph: Vec::with_capacity(n),
            discharge_flow_tph: Vec::with_capacity(n),
            feed_grade: Vec::with_capacity(n),
            mill_grade: Vec::with_capacity(n),
            target_flow_tph: Vec::with_capacity(n),
            target_grade: Vec::with_capacity(n),
            solids_t: Vec::with_capacity(n),
            water_t: Vec::with_capacity(n),
            copper_t: Vec::with_capacity(n),
            moisture: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, row: &HistorySample) {
        self.t_h.push(row.t_h);
        self.feed_flow_tph.push(row.feed_flow_tph);
        self.fines_flow_tph.push(row.fines_flow_tph);
        self.recirc_flow_tph.push(row.recirc_flow_tph);
        self.discharge_flow_tph.push(row.discharge_flow_tph);
        self.feed_grade.push(row.feed_grade);
        self.mill_grade.push(row.mill_grade);
        self.target_flow_tph.push(row.target_flow_tph);
        self.target_grade.push(row.target_grade);
        self.solids_t.push(row.solids_t);
        self.water_t.push(row.water_t);
        self.copper_t.push(row.copper_t);
        self.moisture.push(row.moisture);
    }

    pub fn len(&self) -> usize {
        self.t_h.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_h.is_empty()
    }

    /// Named columns in a fixed order, for tabular export.
    pub fn columns(&self) -> [(&'static str, &[f64]); 13] {
        [
            ("t_h", self.t_h.as_slice()),
            ("feed_flow_tph", self.feed_flow_tph.as_slice()),
            ("fines_flow_tph", self.fines_flow_tph.as_slice()),
            ("recirc_flow_tph", self.recirc_flow_tph.as_slice()),
            ("discharge_flow_tph", self.discharge_flow_tph.as_slice()),
            ("feed_grade", self.feed_grade.as_slice()),
            ("mill_grade", self.mill_grade.as_slice()),
            ("target_flow_tph", self.target_flow_tph.as_slice()),
            ("target_grade", self.target_grade.as_slice()),
            ("solids_t", self.solids_t.as_slice()),
            ("water_t", self.water_t.as_slice()),
            ("copper_t", self.copper_t.as_slice()),
            ("moisture", self.moisture.as_slice()),
        ]
    }
}
