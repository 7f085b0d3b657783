//! Web-vitals recording from host performance entries.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Performance entries forwarded by the host, times in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry_type", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    Paint {
        start_time: f64,
    },
    LargestContentfulPaint {
        start_time: f64,
    },
    FirstInput {
        start_time: f64,
        processing_start: f64,
    },
    LayoutShift {
        value: f64,
        had_recent_input: bool,
    },
    Navigation {
        request_start: f64,
        response_start: f64,
    },
}

/// Raw metrics collected so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WebVitals {
    pub fcp: Option<f64>,
    pub lcp: Option<f64>,
    pub fid: Option<f64>,
    pub cls: f64,
    pub ttfb: Option<f64>,
}

/// Rounded metrics as sent to analytics. CLS is scaled by 1000.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsReport {
    pub fcp: i64,
    pub lcp: i64,
    pub fid: i64,
    pub cls_milli: i64,
    pub ttfb: i64,
}

#[derive(Debug, Clone)]
pub struct VitalsRecorder {
    vitals: WebVitals,
    report_after_ms: f64,
    reported: bool,
}

impl VitalsRecorder {
    pub fn new(cfg: &Config) -> Self {
        Self {
            vitals: WebVitals::default(),
            report_after_ms: f64::from(cfg.report_vitals_after_ms),
            reported: false,
        }
    }

    pub fn record(&mut self, entry: PerformanceEntry) {
        let v = &mut self.vitals;
        match entry {
            PerformanceEntry::Paint { start_time } => {
                if v.fcp.is_none() {
                    v.fcp = Some(start_time);
                }
            }
            // the latest candidate is the largest paint
            PerformanceEntry::LargestContentfulPaint { start_time } => v.lcp = Some(start_time),
            PerformanceEntry::FirstInput {
                start_time,
                processing_start,
            } => v.fid = Some(processing_start - start_time),
            PerformanceEntry::LayoutShift {
                value,
                had_recent_input,
            } => {
                if !had_recent_input {
                    v.cls += value;
                }
            }
            PerformanceEntry::Navigation {
                request_start,
                response_start,
            } => v.ttfb = Some(response_start - request_start),
        }
    }

    pub fn vitals(&self) -> &WebVitals {
        &self.vitals
    }

    pub fn report(&self) -> VitalsReport {
        let round = |v: Option<f64>| v.map_or(0, |ms| ms.round() as i64);
        VitalsReport {
            fcp: round(self.vitals.fcp),
            lcp: round(self.vitals.lcp),
            fid: round(self.vitals.fid),
            cls_milli: (self.vitals.cls * 1000.0).round() as i64,
            ttfb: round(self.vitals.ttfb),
        }
    }

    /// The report once `elapsed_ms` since start passes the reporting delay; only once.
    pub fn take_due_report(&mut self, elapsed_ms: f64) -> Option<VitalsReport> {
        if self.reported || elapsed_ms < self.report_after_ms {
            return None;
        }
        self.reported = true;
        Some(self.report())
    }
}
