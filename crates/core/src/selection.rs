//! The metric selection: the one piece of state that changes during a
//! session.
//!
//! [`SelectionController::select`] takes `&mut self`, so a controller can
//! never run two compositions at once; a UI that dispatches events from
//! several threads has to serialize them through a single owner (or a
//! `Mutex`) before they reach it.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;
use tripchart_protocol::{ChartSet, DoseMarkers, MetricName};

use crate::model::{Session, Timeline};
use crate::views::CompositionError;
use crate::views::chart_set::{compose_chart_set, normalize_request};

/// Recently composed chart sets kept for flipping back and forth between
/// selections.
const CACHE_CAPACITY: usize = 8;

/// The currently requested metrics, in display order, without duplicates.
///
/// Replaced wholesale on every interaction, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    metrics: Vec<MetricName>,
}

impl SelectionState {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            metrics: normalize_request(names),
        }
    }

    pub fn metrics(&self) -> &[MetricName] {
        &self.metrics
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.metrics.iter().any(|m| m == metric)
    }

    /// The selection with `metric` added at the end, or removed if present.
    /// A blank name leaves the selection as it is.
    pub fn toggled(&self, metric: &str) -> Self {
        let Ok(metric) = MetricName::new(metric) else {
            return self.clone();
        };
        let mut metrics = self.metrics.clone();
        match metrics.iter().position(|m| *m == metric) {
            Some(i) => {
                metrics.remove(i);
            }
            None => metrics.push(metric),
        }
        Self { metrics }
    }
}

/// Owns the selection and turns each new one into a chart set.
#[derive(Debug, Clone)]
pub struct SelectionController {
    timeline: Arc<Timeline>,
    doses: DoseMarkers,
    selection: SelectionState,
    charts: ChartSet,
    /// Chart sets of the last few normalized requests, most recent first.
    /// The timeline never changes, so entries never go stale.
    cache: VecDeque<(Vec<MetricName>, ChartSet)>,
}

impl SelectionController {
    /// Create a controller and compose the initial selection.
    pub fn new(
        timeline: Arc<Timeline>,
        doses: DoseMarkers,
        initial: SelectionState,
    ) -> Result<Self, CompositionError> {
        let mut controller = Self {
            timeline,
            doses,
            selection: SelectionState::default(),
            charts: ChartSet::default(),
            cache: VecDeque::with_capacity(CACHE_CAPACITY),
        };
        controller.apply(initial)?;
        Ok(controller)
    }

    /// Create a controller for a loaded session.
    ///
    /// Default metrics the timeline does not track are dropped rather than
    /// failing, since the defaults are not tied to any particular dataset.
    pub fn for_session(
        session: &Session,
        default_metrics: &[MetricName],
    ) -> Result<Self, CompositionError> {
        let schema = session.timeline().schema();
        let initial = SelectionState::new(default_metrics.iter().filter(|m| schema.contains(m)));
        Self::new(session.timeline().clone(), session.doses().clone(), initial)
    }

    /// Replace the selection and return the freshly composed chart set.
    ///
    /// On error (an unknown metric) neither the selection nor the current
    /// chart set changes.
    pub fn select<I, S>(&mut self, names: I) -> Result<&ChartSet, CompositionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply(SelectionState::new(names))?;
        Ok(&self.charts)
    }

    /// Add or remove one metric from the current selection.
    pub fn toggle(&mut self, metric: &str) -> Result<&ChartSet, CompositionError> {
        self.apply(self.selection.toggled(metric))?;
        Ok(&self.charts)
    }

    fn apply(&mut self, selection: SelectionState) -> Result<(), CompositionError> {
        let hit = self
            .cache
            .iter()
            .position(|(request, _)| request.as_slice() == selection.metrics());
        let entry = match hit.and_then(|i| self.cache.remove(i)) {
            Some(entry) => {
                debug!(metrics = ?selection.metrics(), "chart set served from cache");
                entry
            }
            None => {
                let composed =
                    compose_chart_set(selection.metrics(), &self.timeline, &self.doses)?;
                (selection.metrics().to_vec(), composed)
            }
        };
        let charts = entry.1.clone();
        self.cache.push_front(entry);
        self.cache.truncate(CACHE_CAPACITY);
        self.selection = selection;
        self.charts = charts;
        Ok(())
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The chart set of the last successful selection.
    pub fn charts(&self) -> &ChartSet {
        &self.charts
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn doses(&self) -> &DoseMarkers {
        &self.doses
    }

    /// Metrics the user can choose from, in column order.
    pub fn available_metrics(&self) -> &[MetricName] {
        self.timeline.metric_names()
    }
}
