//! Environmental Data Aggregator
//!
//! Drives the single-shot dashboard pipeline:
//! `Idle -> Locating -> Fetching -> {Loaded | PartiallyLoaded | LocationFailed}`.
//!
//! The aggregator is the only writer of [`DashboardState`]. Readers get
//! immutable snapshots, either by calling [`Aggregator::snapshot`] or by
//! subscribing to the underlying `watch` channel.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::location::LocationProvider;
use crate::lookups::{EnvironmentalLookups, LookupError};
use crate::models::{Coordinate, PlaceName, RiskScore, WeatherReading};

/// Where the pipeline currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Idle,
    Locating,
    Fetching,
    Loaded,
    PartiallyLoaded,
    LocationFailed,
}

impl PipelinePhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelinePhase::Loaded | PipelinePhase::PartiallyLoaded | PipelinePhase::LocationFailed
        )
    }

    /// The dashboard shows its loading view until a terminal phase is reached
    #[must_use]
    pub fn is_loading(self) -> bool {
        !self.is_terminal()
    }

    #[must_use]
    pub fn can_transition_to(self, next: PipelinePhase) -> bool {
        use PipelinePhase::{Fetching, Idle, Loaded, LocationFailed, Locating, PartiallyLoaded};
        matches!(
            (self, next),
            (Idle, Locating)
                | (Locating, Fetching)
                | (Locating, LocationFailed)
                | (Fetching, Loaded)
                | (Fetching, PartiallyLoaded)
        )
    }
}

/// Immutable snapshot of everything the dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub phase: PipelinePhase,
    pub coordinate: Option<Coordinate>,
    pub weather: Option<WeatherReading>,
    pub risk: Option<RiskScore>,
    pub place: PlaceName,
    /// The logged failure that ended the pipeline early, if any
    pub failure: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            phase: PipelinePhase::Idle,
            coordinate: None,
            weather: None,
            risk: None,
            place: PlaceName::Fetching,
            failure: None,
        }
    }
}

impl DashboardState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }
}

/// Owned state plus the ordered list of phases entered
struct PipelineStore {
    state: watch::Sender<DashboardState>,
    history: Vec<PipelinePhase>,
}

impl PipelineStore {
    fn new() -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            state,
            history: vec![PipelinePhase::Idle],
        }
    }

    fn phase(&self) -> PipelinePhase {
        self.state.borrow().phase
    }

    /// Move to `next` if the state machine allows it
    fn transition(&mut self, next: PipelinePhase) -> bool {
        let current = self.phase();
        if !current.can_transition_to(next) {
            warn!("Rejected pipeline transition {:?} -> {:?}", current, next);
            return false;
        }

        self.state.send_modify(|state| {
            state.phase = next;
            // A place name that never arrived is unavailable, not pending
            if next.is_terminal() && state.place == PlaceName::Fetching {
                state.place = PlaceName::Unavailable;
            }
        });
        self.history.push(next);
        debug!("Pipeline {:?} -> {:?}", current, next);
        true
    }

    fn update(&mut self, modify: impl FnOnce(&mut DashboardState)) {
        self.state.send_modify(modify);
    }
}

/// Scoped `Fetching` phase.
///
/// Entering the guard moves the pipeline into `Fetching`; dropping it always
/// performs the terminal transition, `Loaded` when every lookup succeeded and
/// `PartiallyLoaded` otherwise.
struct FetchGuard<'a> {
    store: &'a mut PipelineStore,
    complete: bool,
}

impl<'a> FetchGuard<'a> {
    fn enter(store: &'a mut PipelineStore) -> Option<Self> {
        if !store.transition(PipelinePhase::Fetching) {
            return None;
        }
        Some(Self {
            store,
            complete: false,
        })
    }

    fn record_weather(&mut self, weather: WeatherReading) {
        self.store.update(|state| state.weather = Some(weather));
    }

    fn record_risk(&mut self, risk: RiskScore) {
        self.store.update(|state| state.risk = Some(risk));
    }

    fn record_place(&mut self, name: String) {
        self.store
            .update(|state| state.place = PlaceName::Resolved(name));
    }

    fn record_failure(&mut self, failure: &LookupError) {
        let message = failure.to_string();
        self.store.update(|state| state.failure = Some(message));
    }

    fn complete(&mut self) {
        self.complete = true;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let outcome = if self.complete {
            PipelinePhase::Loaded
        } else {
            PipelinePhase::PartiallyLoaded
        };
        self.store.transition(outcome);
    }
}

/// Runs the location request and the three lookups, once
pub struct Aggregator<L> {
    lookups: L,
    store: PipelineStore,
}

impl<L: EnvironmentalLookups> Aggregator<L> {
    pub fn new(lookups: L) -> Self {
        Self {
            lookups,
            store: PipelineStore::new(),
        }
    }

    /// Read-only view that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.store.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.store.state.borrow().clone()
    }

    /// Phases entered so far, starting with `Idle`
    pub fn history(&self) -> &[PipelinePhase] {
        &self.store.history
    }

    /// Acquire the position and, if that works, aggregate the lookups.
    ///
    /// A location failure ends the pipeline in `LocationFailed` without a
    /// single lookup being issued.
    pub async fn run(&mut self, provider: LocationProvider) -> DashboardState {
        if !self.store.transition(PipelinePhase::Locating) {
            warn!("Dashboard pipeline already started; ignoring run");
            return self.snapshot();
        }

        match provider.acquire_location().await {
            Ok(coordinate) => self.aggregate(coordinate).await,
            Err(e) => {
                error!("Error fetching location: {}", e);
                let message = e.to_string();
                self.store.update(|state| state.failure = Some(message));
                self.store.transition(PipelinePhase::LocationFailed);
                self.snapshot()
            }
        }
    }

    /// Issue forecast, fire-risk and place-name lookups in that order.
    ///
    /// Each result is published as soon as it arrives. The first failure is
    /// logged and ends the sequence, leaving later fields unavailable.
    pub async fn aggregate(&mut self, coordinate: Coordinate) -> DashboardState {
        // The caller already holds a coordinate, so locating is trivially done
        if self.store.phase() == PipelinePhase::Idle {
            self.store.transition(PipelinePhase::Locating);
        }

        let Self { lookups, store } = self;
        if store.phase() != PipelinePhase::Locating {
            warn!("Dashboard data already fetched this session; ignoring aggregate");
            return self.snapshot();
        }
        store.update(|state| state.coordinate = Some(coordinate));

        if let Some(mut guard) = FetchGuard::enter(store) {
            match Self::run_lookups(lookups, coordinate, &mut guard).await {
                Ok(()) => info!("Dashboard data loaded for {}", coordinate.format_coordinates()),
                Err(e) => {
                    error!("Error fetching data: {}", e);
                    guard.record_failure(&e);
                }
            }
        }

        self.snapshot()
    }

    async fn run_lookups(
        lookups: &L,
        coordinate: Coordinate,
        guard: &mut FetchGuard<'_>,
    ) -> Result<(), LookupError> {
        let weather = lookups.current_forecast(coordinate).await?;
        guard.record_weather(weather);

        let risk = lookups.fire_risk(coordinate).await?;
        guard.record_risk(risk);

        let place = lookups.city_name(coordinate).await?;
        guard.record_place(place);

        guard.complete();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DeniedPosition;
    use crate::lookups::LookupKind;
    use crate::models::CompassPoint;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Lookups that succeed unless told which one should fail
    #[derive(Default, Clone)]
    struct ScriptedLookups {
        fail_on: Option<LookupKind>,
        calls: Arc<Mutex<Vec<LookupKind>>>,
    }

    impl ScriptedLookups {
        fn failing(kind: LookupKind) -> Self {
            Self {
                fail_on: Some(kind),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<LookupKind> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, kind: LookupKind) -> Result<(), LookupError> {
            self.calls.lock().unwrap().push(kind);
            if self.fail_on == Some(kind) {
                return Err(LookupError::new(kind, "HTTP 500"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EnvironmentalLookups for ScriptedLookups {
        async fn current_forecast(&self, _coord: Coordinate) -> Result<WeatherReading, LookupError> {
            self.record(LookupKind::Forecast)?;
            Ok(WeatherReading {
                temperature_f: 68.0,
                relative_humidity_pct: Some(40.0),
                wind_speed_mph: Some(12.0),
                wind_direction: Some(CompassPoint::NW),
                observed_at: None,
            })
        }

        async fn fire_risk(&self, _coord: Coordinate) -> Result<RiskScore, LookupError> {
            self.record(LookupKind::FireRisk)?;
            Ok(RiskScore::new(62.0).unwrap())
        }

        async fn city_name(&self, _coord: Coordinate) -> Result<String, LookupError> {
            self.record(LookupKind::PlaceName)?;
            Ok("San Francisco".to_string())
        }
    }

    fn coord() -> Coordinate {
        Coordinate::new(37.77, -122.42).unwrap()
    }

    #[test]
    fn test_phase_transitions() {
        use PipelinePhase::*;
        assert!(Idle.can_transition_to(Locating));
        assert!(Locating.can_transition_to(Fetching));
        assert!(Locating.can_transition_to(LocationFailed));
        assert!(Fetching.can_transition_to(Loaded));
        assert!(Fetching.can_transition_to(PartiallyLoaded));

        assert!(!Idle.can_transition_to(Fetching));
        for terminal in [Loaded, PartiallyLoaded, LocationFailed] {
            assert!(terminal.is_terminal());
            for next in [Idle, Locating, Fetching, Loaded, PartiallyLoaded, LocationFailed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = DashboardState::default();
        assert!(state.is_loading());
        assert_eq!(state.place, PlaceName::Fetching);
    }

    #[tokio::test]
    async fn test_all_lookups_succeed() {
        let lookups = ScriptedLookups::default();
        let mut aggregator = Aggregator::new(lookups.clone());

        let state = aggregator.run(LocationProvider::fixed(coord())).await;

        assert_eq!(state.phase, PipelinePhase::Loaded);
        assert!(!state.is_loading());
        assert_eq!(state.coordinate, Some(coord()));
        assert_eq!(state.weather.unwrap().temperature_f, 68.0);
        assert_eq!(state.risk.unwrap().value(), 62.0);
        assert_eq!(state.place, PlaceName::Resolved("San Francisco".into()));
        assert!(state.failure.is_none());
        assert_eq!(
            lookups.calls(),
            vec![LookupKind::Forecast, LookupKind::FireRisk, LookupKind::PlaceName]
        );
        assert_eq!(
            aggregator.history(),
            &[
                PipelinePhase::Idle,
                PipelinePhase::Locating,
                PipelinePhase::Fetching,
                PipelinePhase::Loaded
            ]
        );
    }

    #[tokio::test]
    async fn test_forecast_failure_stops_sequence() {
        let lookups = ScriptedLookups::failing(LookupKind::Forecast);
        let mut aggregator = Aggregator::new(lookups.clone());

        let state = aggregator.run(LocationProvider::fixed(coord())).await;

        assert_eq!(lookups.calls(), vec![LookupKind::Forecast]);
        assert_eq!(state.phase, PipelinePhase::PartiallyLoaded);
        assert!(state.weather.is_none());
        assert!(state.risk.is_none());
        assert_eq!(state.place, PlaceName::Unavailable);
        assert!(state.failure.unwrap().contains("forecast"));

        let loading_cleared = aggregator
            .history()
            .iter()
            .filter(|phase| phase.is_terminal())
            .count();
        assert_eq!(loading_cleared, 1);
    }

    #[tokio::test]
    async fn test_risk_failure_keeps_weather() {
        let lookups = ScriptedLookups::failing(LookupKind::FireRisk);
        let mut aggregator = Aggregator::new(lookups.clone());

        let state = aggregator.aggregate(coord()).await;

        assert_eq!(lookups.calls(), vec![LookupKind::Forecast, LookupKind::FireRisk]);
        assert_eq!(state.phase, PipelinePhase::PartiallyLoaded);
        assert!(state.weather.is_some());
        assert!(state.risk.is_none());
        assert_eq!(state.place, PlaceName::Unavailable);
    }

    #[tokio::test]
    async fn test_place_failure_keeps_earlier_fields() {
        let lookups = ScriptedLookups::failing(LookupKind::PlaceName);
        let mut aggregator = Aggregator::new(lookups.clone());

        let state = aggregator.aggregate(coord()).await;

        assert_eq!(state.phase, PipelinePhase::PartiallyLoaded);
        assert!(state.weather.is_some());
        assert_eq!(state.risk.unwrap().value(), 62.0);
        assert_eq!(state.place, PlaceName::Unavailable);
    }

    #[tokio::test]
    async fn test_location_failure_skips_lookups() {
        let lookups = ScriptedLookups::default();
        let mut aggregator = Aggregator::new(lookups.clone());

        let provider = LocationProvider::new(Some(Box::new(DeniedPosition)));
        let state = aggregator.run(provider).await;

        assert!(lookups.calls().is_empty());
        assert_eq!(state.phase, PipelinePhase::LocationFailed);
        assert!(!state.is_loading());
        assert!(state.coordinate.is_none());
        assert!(state.weather.is_none());
        assert!(state.risk.is_none());
        assert_eq!(state.place, PlaceName::Unavailable);
        assert_eq!(state.failure.as_deref(), Some("location permission denied"));
    }

    #[tokio::test]
    async fn test_pipeline_runs_once() {
        let lookups = ScriptedLookups::default();
        let mut aggregator = Aggregator::new(lookups.clone());

        let first = aggregator.run(LocationProvider::fixed(coord())).await;
        let second = aggregator.run(LocationProvider::fixed(coord())).await;
        let third = aggregator.aggregate(coord()).await;

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(lookups.calls().len(), 3);
        assert_eq!(aggregator.history().len(), 4);
    }

    #[tokio::test]
    async fn test_subscriber_sees_terminal_snapshot() {
        let mut aggregator = Aggregator::new(ScriptedLookups::default());
        let receiver = aggregator.subscribe();
        assert!(receiver.borrow().is_loading());

        aggregator.run(LocationProvider::fixed(coord())).await;

        assert_eq!(receiver.borrow().phase, PipelinePhase::Loaded);
        assert!(receiver.has_changed().unwrap());
    }
}
