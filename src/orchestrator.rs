use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregate::{LocationRecord, aggregate};
use crate::catalog::{LocationSource, RuleSource};
use crate::channel::{PanelDocument, PanelTarget, PublishTarget};
use crate::error::{ForecastError, PatchError, RunFailure};
use crate::panel;
use crate::report::{render_panel_footer, render_panel_table, render_post};
use crate::schedule::{
    ActionKind, Decision, Phase, PhaseTrace, RunState, ScheduleRule, evaluate, select_rule,
};
use crate::store::StateStore;
use crate::weather::WeatherSource;

/// Values a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Timestamp assumed for both actions before any state has been persisted.
    pub default_epoch: DateTime<Utc>,
    /// Zone the panel's "last updated" stamp is shown in.
    pub reference_timezone: Tz,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No action was due. Nothing was fetched or written.
    NothingToDo { state: RunState },
    /// At least one action was due and every due action completed.
    Completed { posted: bool, panel_updated: bool },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NothingToDo { state } => write!(
                f,
                "Nothing to do. Last post {}, last panel {}",
                state.last_post_time.to_rfc3339(),
                state.last_panel_time.to_rfc3339()
            ),
            RunOutcome::Completed {
                posted,
                panel_updated,
            } => write!(f, "ok ({posted}, {panel_updated})"),
        }
    }
}

/// Record of one run, produced on success.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    /// State as persisted at the end of the run.
    pub state: RunState,
    pub phases: Vec<Phase>,
    pub now: DateTime<Utc>,
}

/// Read-only view of what a run would do right now.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: RunState,
    pub persisted: bool,
    pub rule: Option<ScheduleRule>,
    pub decision: Decision,
}

/// Rendered output without any side effect.
#[derive(Debug, Clone)]
pub struct Preview {
    pub post: String,
    pub panel_table: String,
    pub panel_footer: String,
}

/// Drives one invocation through the run phases.
pub struct RunOrchestrator<S, C, W, T> {
    pub store: S,
    pub catalog: C,
    pub weather: W,
    pub channel: T,
    pub settings: RunSettings,
}

fn fail(trace: &mut PhaseTrace, error: impl Into<ForecastError>) -> RunFailure {
    let phase = trace.fail();
    let failure = RunFailure::new(phase, error);
    tracing::error!(%phase, error = %failure.error, "run failed");
    failure
}

impl<S, C, W, T> RunOrchestrator<S, C, W, T>
where
    S: StateStore,
    C: RuleSource + LocationSource,
    W: WeatherSource,
    T: PublishTarget + PanelTarget,
{
    pub fn new(store: S, catalog: C, weather: W, channel: T, settings: RunSettings) -> Self {
        Self {
            store,
            catalog,
            weather,
            channel,
            settings,
        }
    }

    /// Run once at `now`, publishing and patching whatever the active rule says is due.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, RunFailure> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("run", run_id = %run_id);
        self.run_phases(run_id, now).instrument(span).await
    }

    async fn run_phases(&self, run_id: String, now: DateTime<Utc>) -> Result<RunReport, RunFailure> {
        let mut trace = PhaseTrace::new();

        // LOAD_STATE
        let mut state = match self.store.get().await {
            Ok(Some(state)) => state,
            Ok(None) => RunState::at(self.settings.default_epoch),
            Err(e) => return Err(fail(&mut trace, e)),
        };

        // SELECT_RULE
        trace.advance(Phase::SelectRule);
        let rules = match self.catalog.rules().await {
            Ok(rules) => rules,
            Err(e) => return Err(fail(&mut trace, e)),
        };
        let rule = select_rule(&rules, now);

        // EVALUATE
        trace.advance(Phase::Evaluate);
        let decision = match evaluate(rule, &state, now) {
            Ok(decision) => decision,
            Err(e) => return Err(fail(&mut trace, e)),
        };
        tracing::info!(
            rule_start = ?rule.map(|r| r.start),
            post_due = decision.post,
            panel_due = decision.panel,
            "evaluated schedule"
        );

        if !decision.any() {
            trace.advance(Phase::Skip);
            trace.advance(Phase::Done);
            return Ok(RunReport {
                run_id,
                outcome: RunOutcome::NothingToDo { state },
                state,
                phases: trace.phases(),
                now,
            });
        }

        // AGGREGATE
        trace.advance(Phase::Aggregate);
        let locations = match self.catalog.locations().await {
            Ok(locations) => locations,
            Err(e) => return Err(fail(&mut trace, e)),
        };
        let records = match aggregate(&self.weather, locations).await {
            Ok(records) => records,
            Err(e) => return Err(fail(&mut trace, e)),
        };

        let mut completed = Decision::default();

        // PUBLISH
        if decision.post {
            trace.advance(Phase::Publish);
            let body = render_post(&records, state.last_post_time, now);
            if let Err(e) = self.channel.publish(&body).await {
                return Err(fail(&mut trace, ForecastError::Publish(e)));
            }
            tracing::info!(locations = records.len(), "published forecast update");
            completed.post = true;
        }

        // PATCH
        if decision.panel {
            trace.advance(Phase::Patch);
            if let Err(e) = self.update_panel(&records, now).await {
                if !completed.post {
                    return Err(fail(&mut trace, e));
                }
                // The post went out; record it so a retry does not repeat it.
                state.mark(ActionKind::Post, now);
                return Err(match self.store.set(&state).await {
                    Ok(()) => fail(&mut trace, e),
                    Err(source) => fail(
                        &mut trace,
                        ForecastError::PostNotRecorded { patch: e, source },
                    ),
                });
            }
            tracing::info!("updated panel");
            completed.panel = true;
        }

        // PERSIST
        trace.advance(Phase::Persist);
        for kind in [ActionKind::Post, ActionKind::Panel] {
            if completed.is_due(kind) {
                state.mark(kind, now);
            }
        }
        if let Err(e) = self.store.set(&state).await {
            return Err(fail(&mut trace, e));
        }

        trace.advance(Phase::Done);
        Ok(RunReport {
            run_id,
            outcome: RunOutcome::Completed {
                posted: completed.post,
                panel_updated: completed.panel,
            },
            state,
            phases: trace.phases(),
            now,
        })
    }

    async fn update_panel(
        &self,
        records: &[LocationRecord],
        now: DateTime<Utc>,
    ) -> Result<(), PatchError> {
        let document = self.channel.read_panel().await?;
        let resources = panel::patch(
            &document.resources,
            &render_panel_table(records),
            &render_panel_footer(now, self.settings.reference_timezone),
        )?;
        self.channel
            .write_panel(&PanelDocument {
                resources,
                ..document
            })
            .await?;
        Ok(())
    }

    async fn load_state(&self) -> Result<(RunState, bool), ForecastError> {
        Ok(match self.store.get().await? {
            Some(state) => (state, true),
            None => (RunState::at(self.settings.default_epoch), false),
        })
    }

    /// Evaluate the schedule without fetching or writing anything.
    pub async fn status(&self, now: DateTime<Utc>) -> Result<StatusReport, ForecastError> {
        let (state, persisted) = self.load_state().await?;
        let rules = self.catalog.rules().await?;
        let rule = select_rule(&rules, now).cloned();
        let decision = evaluate(rule.as_ref(), &state, now)?;
        Ok(StatusReport {
            state,
            persisted,
            rule,
            decision,
        })
    }

    /// Fetch and render both reports without publishing, patching or persisting.
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<Preview, ForecastError> {
        let (state, _) = self.load_state().await?;
        let locations = self.catalog.locations().await?;
        let records = aggregate(&self.weather, locations).await?;
        Ok(Preview {
            post: render_post(&records, state.last_post_time, now),
            panel_table: render_panel_table(&records),
            panel_footer: render_panel_footer(now, self.settings.reference_timezone),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{StubWeather, location};
    use crate::catalog::Location;
    use crate::channel::ChannelError;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::Mutex;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 8, 13, 0, 0, 0).unwrap()
    }

    fn settings() -> RunSettings {
        RunSettings {
            default_epoch: t0(),
            reference_timezone: chrono_tz::America::Los_Angeles,
        }
    }

    struct MockCatalog {
        rules: Vec<ScheduleRule>,
        locations: Vec<Location>,
    }

    impl MockCatalog {
        fn with_rule(post: &str, panel: &str) -> Self {
            Self {
                rules: vec![ScheduleRule::new(t0(), post, panel)],
                locations: vec![
                    location(1, "Madras, OR", 44.0),
                    location(2, "Casper, WY", 42.0),
                    location(3, "Nashville, TN", 36.0),
                ],
            }
        }
    }

    impl RuleSource for MockCatalog {
        async fn rules(&self) -> Result<Vec<ScheduleRule>, ForecastError> {
            Ok(self.rules.clone())
        }
    }

    impl LocationSource for MockCatalog {
        async fn locations(&self) -> Result<Vec<Location>, ForecastError> {
            Ok(self.locations.clone())
        }
    }

    struct MockChannel {
        published: Mutex<Vec<String>>,
        document: Mutex<PanelDocument>,
        writes: Mutex<u32>,
        reject_publish: bool,
    }

    impl MockChannel {
        fn with_resources(resources: &str) -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                document: Mutex::new(PanelDocument {
                    title: "Eclipse".into(),
                    description: "Live coverage".into(),
                    resources: resources.into(),
                }),
                writes: Mutex::new(0),
                reject_publish: false,
            }
        }

        fn standard() -> Self {
            Self::with_resources(
                "#Links\n\n* map\n\n#Weather Forecast\n\nold\n\n*Last updated never*\n\n#Footer\n",
            )
        }

        fn publish_count(&self) -> usize {
            self.published.lock().unwrap().len()
        }

        fn write_count(&self) -> u32 {
            *self.writes.lock().unwrap()
        }
    }

    impl PublishTarget for MockChannel {
        async fn publish(&self, body: &str) -> Result<(), ChannelError> {
            if self.reject_publish {
                return Err(ChannelError::Rejected("RATELIMIT".into()));
            }
            self.published.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    impl PanelTarget for MockChannel {
        async fn read_panel(&self) -> Result<PanelDocument, ChannelError> {
            Ok(self.document.lock().unwrap().clone())
        }

        async fn write_panel(&self, document: &PanelDocument) -> Result<(), ChannelError> {
            *self.document.lock().unwrap() = document.clone();
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct ReadOnlyStore(Option<RunState>);

    impl StateStore for ReadOnlyStore {
        async fn get(&self) -> Result<Option<RunState>, StoreError> {
            Ok(self.0)
        }

        async fn set(&self, _state: &RunState) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    fn orchestrator<S: StateStore>(
        store: S,
        catalog: MockCatalog,
        weather: StubWeather,
        channel: MockChannel,
    ) -> RunOrchestrator<S, MockCatalog, StubWeather, MockChannel> {
        RunOrchestrator::new(store, catalog, weather, channel, settings())
    }

    #[tokio::test]
    async fn both_due_posts_patches_and_persists() {
        let now = t0() + TimeDelta::hours(7);
        let orch = orchestrator(
            MemoryStore::new(Some(RunState::at(t0()))),
            MockCatalog::with_rule("hourInterval(6)", "hourInterval(6)"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let report = orch.run(now).await.unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::Completed {
                posted: true,
                panel_updated: true
            }
        );
        assert_eq!(orch.store.snapshot(), Some(RunState::at(now)));
        assert_eq!(orch.channel.publish_count(), 1);
        assert_eq!(orch.channel.write_count(), 1);
        assert_eq!(orch.weather.calls.lock().unwrap().len(), 3);

        let body = orch.channel.published.lock().unwrap()[0].clone();
        for name in ["Madras, OR", "Casper, WY", "Nashville, TN"] {
            assert!(body.contains(name), "post missing {name}");
        }
        assert!(body.contains("Previous update was 7 hours ago."));

        let doc = orch.channel.document.lock().unwrap().clone();
        assert_eq!(doc.title, "Eclipse");
        assert_eq!(doc.description, "Live coverage");
        assert!(doc.resources.starts_with("#Links\n\n* map\n\n#Weather Forecast\n\nPlace|Weather|Cloud Cover|"));
        assert!(doc.resources.contains("Nashville, TN|"));
        assert!(doc.resources.contains("\n\n*Last updated August 13 2017, 12:00 am PDT (7:00 am UTC). Data from"));
        assert!(doc.resources.ends_with("*\n\n#Footer\n"));

        assert_eq!(
            report.phases,
            vec![
                Phase::LoadState,
                Phase::SelectRule,
                Phase::Evaluate,
                Phase::Aggregate,
                Phase::Publish,
                Phase::Patch,
                Phase::Persist,
                Phase::Done,
            ]
        );
    }

    #[tokio::test]
    async fn aggregation_failure_has_no_side_effects() {
        let now = t0() + TimeDelta::hours(7);
        let orch = orchestrator(
            MemoryStore::new(Some(RunState::at(t0()))),
            MockCatalog::with_rule("hourInterval(6)", "hourInterval(6)"),
            StubWeather::failing_at(42.0),
            MockChannel::standard(),
        );

        let failure = orch.run(now).await.unwrap_err();

        assert_eq!(failure.phase, Phase::Aggregate);
        assert!(matches!(failure.error, ForecastError::Aggregation { .. }));
        assert_eq!(orch.channel.publish_count(), 0);
        assert_eq!(orch.channel.write_count(), 0);
        assert_eq!(orch.store.snapshot(), Some(RunState::at(t0())));
    }

    #[tokio::test]
    async fn no_effective_rule_is_nothing_to_do() {
        let mut catalog = MockCatalog::with_rule("hourInterval(1)", "hourInterval(1)");
        catalog.rules[0].start = t0() + TimeDelta::days(30);
        let orch = orchestrator(
            MemoryStore::default(),
            catalog,
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let report = orch.run(t0() + TimeDelta::days(1)).await.unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::NothingToDo {
                state: RunState::at(t0())
            }
        );
        assert_eq!(orch.store.snapshot(), None);
        assert!(orch.weather.calls.lock().unwrap().is_empty());
        assert_eq!(
            report.phases,
            vec![
                Phase::LoadState,
                Phase::SelectRule,
                Phase::Evaluate,
                Phase::Skip,
                Phase::Done
            ]
        );
        assert_eq!(
            report.outcome.to_string(),
            "Nothing to do. Last post 2017-08-13T00:00:00+00:00, last panel 2017-08-13T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn malformed_rule_aborts_before_side_effects() {
        let orch = orchestrator(
            MemoryStore::default(),
            MockCatalog::with_rule("hourInterval(6)", "require('child_process')"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let failure = orch.run(t0() + TimeDelta::hours(7)).await.unwrap_err();

        assert_eq!(failure.phase, Phase::Evaluate);
        assert!(matches!(failure.error, ForecastError::Rule(_)));
        assert!(orch.weather.calls.lock().unwrap().is_empty());
        assert_eq!(orch.channel.publish_count(), 0);
        assert_eq!(orch.store.snapshot(), None);
    }

    #[tokio::test]
    async fn only_post_due_leaves_panel_alone() {
        let now = t0() + TimeDelta::hours(7);
        let orch = orchestrator(
            MemoryStore::new(Some(RunState::at(t0()))),
            MockCatalog::with_rule("hourInterval(6)", "never()"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let report = orch.run(now).await.unwrap();

        assert_eq!(report.outcome.to_string(), "ok (true, false)");
        assert_eq!(orch.channel.write_count(), 0);
        let state = orch.store.snapshot().unwrap();
        assert_eq!(state.last_post_time, now);
        assert_eq!(state.last_panel_time, t0());
    }

    #[tokio::test]
    async fn only_panel_due_skips_publish() {
        let now = t0() + TimeDelta::hours(7);
        let orch = orchestrator(
            MemoryStore::new(Some(RunState::at(t0()))),
            MockCatalog::with_rule("never()", "hourInterval(1)"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let report = orch.run(now).await.unwrap();

        assert_eq!(report.outcome.to_string(), "ok (false, true)");
        assert_eq!(orch.channel.publish_count(), 0);
        let state = orch.store.snapshot().unwrap();
        assert_eq!(state.last_post_time, t0());
        assert_eq!(state.last_panel_time, now);
        assert!(!report.phases.contains(&Phase::Publish));
    }

    #[tokio::test]
    async fn missing_region_fails_patch_but_keeps_post() {
        let now = t0() + TimeDelta::hours(7);
        let orch = orchestrator(
            MemoryStore::new(Some(RunState::at(t0()))),
            MockCatalog::with_rule("hourInterval(6)", "hourInterval(6)"),
            StubWeather::ok(),
            MockChannel::with_resources("#Links\n\nno forecast section here\n"),
        );

        let failure = orch.run(now).await.unwrap_err();

        assert_eq!(failure.phase, Phase::Patch);
        assert!(matches!(
            failure.error,
            ForecastError::Patch(PatchError::MissingHeader)
        ));
        assert_eq!(orch.channel.write_count(), 0);
        assert_eq!(orch.channel.publish_count(), 1);
        let state = orch.store.snapshot().unwrap();
        assert_eq!(state.last_post_time, now);
        assert_eq!(state.last_panel_time, t0());
    }

    #[tokio::test]
    async fn unrecorded_post_after_patch_failure_is_reported() {
        let orch = orchestrator(
            ReadOnlyStore(Some(RunState::at(t0()))),
            MockCatalog::with_rule("hourInterval(6)", "hourInterval(6)"),
            StubWeather::ok(),
            MockChannel::with_resources("#Links\n\nno forecast section here\n"),
        );

        let failure = orch.run(t0() + TimeDelta::hours(7)).await.unwrap_err();

        assert_eq!(failure.phase, Phase::Patch);
        assert_eq!(orch.channel.publish_count(), 1);
        match &failure.error {
            ForecastError::PostNotRecorded { patch, source } => {
                assert!(matches!(patch, PatchError::MissingHeader));
                assert!(matches!(source, StoreError::Io(_)));
            }
            other => panic!("expected PostNotRecorded, got {other:?}"),
        }
        assert!(failure.to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn rejected_publish_persists_nothing() {
        let mut channel = MockChannel::standard();
        channel.reject_publish = true;
        let orch = orchestrator(
            MemoryStore::new(Some(RunState::at(t0()))),
            MockCatalog::with_rule("hourInterval(6)", "hourInterval(6)"),
            StubWeather::ok(),
            channel,
        );

        let failure = orch.run(t0() + TimeDelta::hours(7)).await.unwrap_err();

        assert_eq!(failure.phase, Phase::Publish);
        assert_eq!(orch.channel.write_count(), 0);
        assert_eq!(orch.store.snapshot(), Some(RunState::at(t0())));
    }

    #[tokio::test]
    async fn state_write_failure_fails_run() {
        let orch = orchestrator(
            ReadOnlyStore(None),
            MockCatalog::with_rule("hourInterval(6)", "never()"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let failure = orch.run(t0() + TimeDelta::hours(7)).await.unwrap_err();

        assert_eq!(failure.phase, Phase::Persist);
        assert!(matches!(failure.error, ForecastError::State(_)));
    }

    #[tokio::test]
    async fn status_reports_without_side_effects() {
        let orch = orchestrator(
            MemoryStore::default(),
            MockCatalog::with_rule("hourInterval(6)", "never()"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let status = orch.status(t0() + TimeDelta::hours(7)).await.unwrap();

        assert!(!status.persisted);
        assert!(status.decision.post);
        assert!(!status.decision.panel);
        assert!(status.rule.is_some());
        assert!(orch.weather.calls.lock().unwrap().is_empty());
        assert_eq!(orch.store.snapshot(), None);
    }

    #[tokio::test]
    async fn preview_renders_without_side_effects() {
        let orch = orchestrator(
            MemoryStore::default(),
            MockCatalog::with_rule("never()", "never()"),
            StubWeather::ok(),
            MockChannel::standard(),
        );

        let preview = orch.preview(t0() + TimeDelta::hours(7)).await.unwrap();

        assert!(preview.post.contains("Madras, OR|"));
        assert_eq!(preview.panel_table.lines().count(), 5);
        assert!(preview.panel_footer.starts_with("August 13 2017"));
        assert_eq!(orch.channel.publish_count(), 0);
        assert_eq!(orch.channel.write_count(), 0);
        assert_eq!(orch.store.snapshot(), None);
    }
}
