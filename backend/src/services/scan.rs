//! Scan orchestration: pick candidate dates, verify them concurrently, merge.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::info;
use serde::{Deserialize, Serialize};

use super::verifier::{AlignmentVerifier, Verification};
use crate::algorithms::candidates::{CandidateGenerator, CandidateSettings, CandidateStats};
use crate::algorithms::intervals::merge_intervals;
use crate::algorithms::orbital::Projection;
use crate::ephemeris::EphemerisClient;
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{AlignmentInterval, Body, ScanWindow, SkippedDate};

/// Which dates get verified. Both strategies share verification and merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStrategy {
    /// Every day in the window.
    Exhaustive,
    /// Only the analytic candidate dates.
    #[default]
    Analytic,
}

impl ScanStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStrategy::Exhaustive => "exhaustive",
            ScanStrategy::Analytic => "analytic",
        }
    }
}

impl fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStrategy {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exhaustive" | "brute-force" | "daily" => Ok(Self::Exhaustive),
            "analytic" | "candidates" => Ok(Self::Analytic),
            _ => Err(AlignmentError::domain(format!(
                "Unknown scan strategy: {} (expected exhaustive or analytic)",
                s
            ))),
        }
    }
}

/// Result of one scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub strategy: ScanStrategy,
    pub window: ScanWindow,
    pub threshold_deg: f64,
    pub bodies: Vec<String>,
    /// Ascending by start date.
    pub intervals: Vec<AlignmentInterval>,
    /// Number of dates selected for verification.
    pub candidates: usize,
    /// The selected dates, ascending.
    #[serde(skip)]
    pub candidate_dates: Vec<NaiveDate>,
    /// Dates with an observed spread.
    pub verified: usize,
    pub passed: usize,
    pub skipped: Vec<SkippedDate>,
    /// Verified dates whose spread met the threshold, ascending.
    pub passing_dates: Vec<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_stats: Option<CandidateStats>,
}

impl ScanReport {
    /// One-line summary; always states the skipped count.
    pub fn summary(&self) -> String {
        format!(
            "{} scan of {} days: {} candidates, {} verified, {} passed, {} skipped, {} interval(s)",
            self.strategy,
            self.window.len(),
            self.candidates,
            self.verified,
            self.passed,
            self.skipped.len(),
            self.intervals.len()
        )
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            writeln!(f, "No alignments found in the given window.")?;
        } else {
            writeln!(
                f,
                "Found {} alignment interval(s) where span <= {}°",
                self.intervals.len(),
                self.threshold_deg
            )?;
            for interval in &self.intervals {
                writeln!(f, "{}", interval)?;
            }
        }
        for skipped in &self.skipped {
            writeln!(f, "skipped {} ({}): {}", skipped.date, skipped.body, skipped.reason)?;
        }
        write!(f, "{}", self.summary())
    }
}

/// Runs either strategy against an injected ephemeris client.
#[derive(Clone)]
pub struct ScanOrchestrator {
    client: Arc<dyn EphemerisClient>,
    max_concurrency: usize,
    margin_factor: f64,
    projection: Projection,
    observer: Option<Body>,
}

impl ScanOrchestrator {
    pub fn new(client: Arc<dyn EphemerisClient>) -> Self {
        let defaults = CandidateSettings::new(1.0);
        Self {
            client,
            max_concurrency: 4,
            margin_factor: defaults.margin_factor,
            projection: defaults.projection,
            observer: None,
        }
    }

    /// Dates verified at the same time; at least 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_margin_factor(mut self, margin_factor: f64) -> Self {
        self.margin_factor = margin_factor;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Body the geocentric projection is computed from.
    pub fn with_observer(mut self, observer: Body) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn client(&self) -> &Arc<dyn EphemerisClient> {
        &self.client
    }

    pub fn candidate_settings(&self, threshold_deg: f64) -> CandidateSettings {
        CandidateSettings::new(threshold_deg)
            .with_margin_factor(self.margin_factor)
            .with_projection(self.projection)
    }

    /// Dates `strategy` would verify.
    pub fn candidate_dates(
        &self,
        strategy: ScanStrategy,
        bodies: &[Body],
        window: &ScanWindow,
        threshold_deg: f64,
    ) -> AlignmentResult<(Vec<NaiveDate>, Option<CandidateStats>)> {
        match strategy {
            ScanStrategy::Exhaustive => Ok((window.days().collect(), None)),
            ScanStrategy::Analytic => {
                let generator = CandidateGenerator::new(
                    bodies,
                    self.observer.as_ref(),
                    self.candidate_settings(threshold_deg),
                )?;
                let set = generator.generate(window)?;
                Ok((set.dates, Some(set.stats)))
            }
        }
    }

    /// Verify `dates` with bounded concurrency, re-collected in date order.
    pub async fn verify_dates(
        &self,
        verifier: &AlignmentVerifier,
        dates: Vec<NaiveDate>,
    ) -> AlignmentResult<BTreeMap<NaiveDate, Verification>> {
        let outcomes: Vec<(NaiveDate, AlignmentResult<Verification>)> = stream::iter(dates)
            .map(|date| async move { (date, verifier.verify(date).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut ordered = BTreeMap::new();
        for (date, outcome) in outcomes {
            ordered.insert(date, outcome?);
        }
        Ok(ordered)
    }

    /// Find alignment intervals of `bodies` in `window`.
    ///
    /// # Errors
    /// `Domain` for fewer than 2 bodies, a non-positive threshold or an inverted
    /// window. Dates the collaborator cannot answer are reported in
    /// [`ScanReport::skipped`], never as errors.
    pub async fn scan(
        &self,
        strategy: ScanStrategy,
        bodies: &[Body],
        window: &ScanWindow,
        threshold_deg: f64,
    ) -> AlignmentResult<ScanReport> {
        if window.start > window.end {
            return Err(AlignmentError::domain(format!(
                "scan window start {} is after end {}",
                window.start, window.end
            )));
        }
        let verifier = AlignmentVerifier::new(self.client.clone(), bodies, threshold_deg)?;
        let (dates, candidate_stats) =
            self.candidate_dates(strategy, bodies, window, threshold_deg)?;
        let candidates = dates.len();

        let results = self.verify_dates(&verifier, dates.clone()).await?;

        let mut verified = 0;
        let mut qualifying = Vec::new();
        let mut skipped = Vec::new();
        for (date, outcome) in results {
            match outcome {
                Verification::Verified(result) => {
                    verified += 1;
                    if result.passed {
                        qualifying.push((date, result.spread));
                    }
                }
                Verification::Unverifiable(skip) => skipped.push(skip),
            }
        }

        let intervals = merge_intervals(&qualifying)?;
        let report = ScanReport {
            strategy,
            window: *window,
            threshold_deg,
            bodies: bodies.iter().map(|b| b.id.clone()).collect(),
            intervals,
            candidates,
            candidate_dates: dates,
            verified,
            passed: qualifying.len(),
            skipped,
            passing_dates: qualifying.iter().map(|(date, _)| *date).collect(),
            candidate_stats,
        };
        info!("{}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod scan_tests;
