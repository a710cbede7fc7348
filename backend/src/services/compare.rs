//! Side-by-side run of both strategies.
//!
//! The exhaustive scan is the oracle: every date it finds passing must be in
//! the analytic candidate set. A missed date means the candidate margin or
//! rate bound is wrong for the configured bodies.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::scan::{ScanOrchestrator, ScanReport, ScanStrategy};
use crate::error::AlignmentResult;
use crate::models::{Body, ScanWindow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleReport {
    pub exhaustive: ScanReport,
    pub analytic: ScanReport,
    /// Exhaustive passing dates absent from the analytic candidate set.
    pub missed_dates: Vec<NaiveDate>,
    pub intervals_agree: bool,
}

impl OracleReport {
    pub fn recall_ok(&self) -> bool {
        self.missed_dates.is_empty()
    }

    /// Fraction of daily queries the analytic strategy avoided.
    pub fn query_savings(&self) -> f64 {
        if self.exhaustive.candidates == 0 {
            return 0.0;
        }
        1.0 - self.analytic.candidates as f64 / self.exhaustive.candidates as f64
    }
}

impl fmt::Display for OracleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "exhaustive: {}", self.exhaustive.summary())?;
        writeln!(f, "analytic:   {}", self.analytic.summary())?;
        writeln!(
            f,
            "query savings: {:.1}%",
            self.query_savings() * 100.0
        )?;
        if self.recall_ok() {
            write!(
                f,
                "recall: complete; intervals {}",
                if self.intervals_agree { "agree" } else { "differ" }
            )
        } else {
            let missed: Vec<String> = self.missed_dates.iter().map(|d| d.to_string()).collect();
            write!(
                f,
                "recall: {} passing date(s) missed: {}",
                missed.len(),
                missed.join(", ")
            )
        }
    }
}

/// Run both strategies over the same inputs and check the oracle property.
pub async fn compare_strategies(
    orchestrator: &ScanOrchestrator,
    bodies: &[Body],
    window: &ScanWindow,
    threshold_deg: f64,
) -> AlignmentResult<OracleReport> {
    let exhaustive = orchestrator
        .scan(ScanStrategy::Exhaustive, bodies, window, threshold_deg)
        .await?;
    let analytic = orchestrator
        .scan(ScanStrategy::Analytic, bodies, window, threshold_deg)
        .await?;

    let candidates: BTreeSet<&NaiveDate> = analytic.candidate_dates.iter().collect();
    let missed_dates: Vec<NaiveDate> = exhaustive
        .passing_dates
        .iter()
        .filter(|d| !candidates.contains(d))
        .copied()
        .collect();

    let report = OracleReport {
        intervals_agree: exhaustive.intervals == analytic.intervals,
        exhaustive,
        analytic,
        missed_dates,
    };

    if report.recall_ok() {
        info!(
            "analytic strategy saved {:.1}% of queries with complete recall",
            report.query_savings() * 100.0
        );
    } else {
        warn!(
            "analytic strategy missed {} passing date(s)",
            report.missed_dates.len()
        );
    }
    Ok(report)
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod compare_tests;
