//! Multi-stage pipeline composition.
//!
//! A pipeline is an ordered list of stages, each owning one selection tree
//! and the tables filled from its survivors. An event flows stage by stage:
//! it must pass a stage's selection before that stage's tables fill, and
//! before the next stage sees it. Stages share no counter state.
//!
//! The pipeline is single-threaded over its shard of events; parallelism
//! happens outside, by running one independent pipeline per shard and
//! merging the outputs afterwards.

use crate::aggregator::AggregationTable;
use crate::config::{AnalysisConfig, StageConfig};
use crate::event::{AttrRef, Event, RatioDerivation};
use crate::selection::SelectionTree;
use crate::utils::config::{MAX_LOGGED_EVENT_FAILURES, SCHEMA_VERSION};
use crate::utils::error::{ConfigError, EvalError, SourceError};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// One pipeline stage: a selection tree plus the tables it feeds
///
/// **Public** - output writers walk the stages after a run
#[derive(Debug)]
pub struct Stage {
    name: String,
    tree: SelectionTree,
    tables: Vec<AggregationTable>,
}

impl Stage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn tables(&self) -> &[AggregationTable] {
        &self.tables
    }

    fn from_config(cfg: &StageConfig) -> Result<Self, ConfigError> {
        let tree = SelectionTree::build(&cfg.selection)?;
        let tables = cfg
            .tables
            .iter()
            .map(AggregationTable::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: cfg.name.clone(),
            tree,
            tables,
        })
    }
}

/// Counters accumulated over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Events pulled from the source (including unreadable ones)
    pub events_read: u64,

    /// Events dropped by a per-event error (unreadable or faulting)
    pub events_failed: u64,

    /// Events that passed every stage
    pub events_surviving: u64,
}

/// The full analysis pipeline
///
/// **Public** - built once per run, before any event is read
#[derive(Debug)]
pub struct Pipeline {
    derivations: Vec<RatioDerivation>,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build from a validated configuration. Everything that can fail does
    /// so here, before the first event: a mid-run construction failure
    /// would leave half-populated, non-reproducible tables behind.
    ///
    /// # Errors
    /// * `ConfigError::NoStages` - an empty pipeline processes nothing
    /// * predicate, binning, and table-shape errors from the stage configs
    pub fn from_config(cfg: &AnalysisConfig) -> Result<Self, ConfigError> {
        if cfg.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }

        let derivations = cfg
            .derive
            .iter()
            .map(|d| {
                let numerator = parse_attr(&d.ratio.0)?;
                let denominator = parse_attr(&d.ratio.1)?;
                Ok(RatioDerivation::new(d.out.clone(), numerator, denominator))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let stages = cfg
            .stages
            .iter()
            .map(Stage::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "built pipeline: {} derivations, {} stages",
            derivations.len(),
            stages.len()
        );
        Ok(Self { derivations, stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run one event through every stage.
    ///
    /// Evaluation is two-phase: every stage first probes its tree and
    /// prepares its table fills without mutating anything, and only when
    /// the whole event processed cleanly do the traces and fills commit.
    /// A faulting event therefore leaves no trace in any counter or table.
    ///
    /// Returns whether the event passed every stage.
    ///
    /// # Errors
    /// * `EvalError` - some predicate, attribute, or binning faulted
    pub fn process(&mut self, mut event: Event) -> Result<bool, EvalError> {
        for derivation in &self.derivations {
            derivation.apply(&mut event)?;
        }

        let mut traces = Vec::with_capacity(self.stages.len());
        let mut fills: Vec<(usize, usize, crate::aggregator::Key, f64)> = Vec::new();
        let mut survived = true;

        for (stage_index, stage) in self.stages.iter().enumerate() {
            let trace = stage.tree.probe(&event)?;
            let passed = trace.passed();
            traces.push(trace);
            if !passed {
                survived = false;
                break;
            }
            for (table_index, table) in stage.tables.iter().enumerate() {
                let (key, weight) = table.prepare(&event)?;
                fills.push((stage_index, table_index, key, weight));
            }
        }

        for (stage, trace) in self.stages.iter_mut().zip(&traces) {
            stage.tree.commit(trace);
        }
        for (stage_index, table_index, key, weight) in fills {
            self.stages[stage_index].tables[table_index].record(key, weight);
        }

        Ok(survived)
    }

    /// Drain an event source, skipping and counting per-event failures.
    ///
    /// `max_events` caps how many events are pulled from the source; `None`
    /// drains it. Stopping early at any point leaves every counter a valid
    /// prefix sum, so partial outputs are still correct.
    pub fn run<I>(&mut self, events: I, max_events: Option<u64>) -> RunStats
    where
        I: IntoIterator<Item = Result<Event, SourceError>>,
    {
        let mut stats = RunStats::default();

        for item in events {
            if max_events.is_some_and(|cap| stats.events_read >= cap) {
                info!("reached event cap of {} events", max_events.unwrap_or(0));
                break;
            }
            stats.events_read += 1;

            let outcome = item.map_err(Failure::Source).and_then(|event| {
                self.process(event).map_err(Failure::Eval)
            });
            match outcome {
                Ok(true) => stats.events_surviving += 1,
                Ok(false) => {}
                Err(failure) => {
                    stats.events_failed += 1;
                    if stats.events_failed <= MAX_LOGGED_EVENT_FAILURES {
                        warn!("skipping event {}: {}", stats.events_read, failure);
                    } else if stats.events_failed == MAX_LOGGED_EVENT_FAILURES + 1 {
                        warn!("further event failures will be counted but not logged");
                    }
                }
            }
        }

        info!(
            "processed {} events: {} surviving, {} failed",
            stats.events_read, stats.events_surviving, stats.events_failed
        );
        stats
    }

    /// Assemble the run summary written next to the tables
    pub fn summary(&self, stats: &RunStats) -> RunSummary {
        RunSummary {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            events_read: stats.events_read,
            events_failed: stats.events_failed,
            events_surviving: stats.events_surviving,
            stages: self
                .stages
                .iter()
                .map(|stage| {
                    let (pass, total) = stage.tree.root_counts();
                    StageSummary {
                        name: stage.name.clone(),
                        selection_pass: pass,
                        selection_total: total,
                        tables: stage
                            .tables
                            .iter()
                            .map(|table| TableSummary {
                                name: table.name().to_string(),
                                distinct_keys: table.len(),
                            })
                            .collect(),
                    }
                })
                .collect(),
        }
    }
}

enum Failure {
    Source(SourceError),
    Eval(EvalError),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Source(e) => write!(f, "{}", e),
            Failure::Eval(e) => write!(f, "{}", e),
        }
    }
}

fn parse_attr(text: &str) -> Result<AttrRef, ConfigError> {
    AttrRef::parse(text).map_err(|source| ConfigError::AttrRef {
        text: text.to_string(),
        source,
    })
}

/// Run manifest written to `run_summary.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version for compatibility checking
    pub version: String,

    /// ISO 8601 timestamp of summary creation
    pub generated_at: String,

    pub events_read: u64,
    pub events_failed: u64,
    pub events_surviving: u64,

    /// Per-stage selection and table figures
    pub stages: Vec<StageSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub name: String,
    pub selection_pass: u64,
    pub selection_total: u64,
    pub tables: Vec<TableSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub distinct_keys: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::KeyAtom;
    use crate::config::AnalysisConfig;

    fn two_stage_config() -> AnalysisConfig {
        AnalysisConfig::from_json(
            r#"{
                "stages": [
                    {
                        "name": "coarse",
                        "selection": {"All": ["ev : ev.ht > 100"]},
                        "tables": [{
                            "attrs": ["ht"],
                            "columns": ["ht"],
                            "binnings": [{"round": {"width": 100.0, "max": 1000.0}}]
                        }]
                    },
                    {
                        "name": "tight",
                        "selection": {"All": ["ev : ev.njet >= 2"]},
                        "tables": [{
                            "attrs": ["njet"],
                            "columns": ["njet"],
                            "binnings": ["identity"]
                        }]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    fn ev(ht: f64, njet: f64) -> Event {
        Event::new().with("ht", ht).with("njet", njet)
    }

    #[test]
    fn test_second_stage_sees_only_first_stage_survivors() {
        let mut pipeline = Pipeline::from_config(&two_stage_config()).unwrap();

        // Fails stage 1: stage 2 must not be reached at all.
        assert!(!pipeline.process(ev(50.0, 5.0)).unwrap());
        // Passes stage 1, fails stage 2.
        assert!(!pipeline.process(ev(250.0, 1.0)).unwrap());
        // Passes both.
        assert!(pipeline.process(ev(250.0, 3.0)).unwrap());

        let (pass1, total1) = pipeline.stages()[0].tree().root_counts();
        let (pass2, total2) = pipeline.stages()[1].tree().root_counts();
        assert_eq!((pass1, total1), (2, 3));
        assert_eq!((pass2, total2), (1, 2));

        // Stage 1's table saw both of its survivors, stage 2's only one.
        assert_eq!(
            pipeline.stages()[0].tables()[0]
                .counts()
                .values()
                .map(|c| c.n)
                .sum::<f64>(),
            2.0
        );
        assert_eq!(pipeline.stages()[1].tables()[0].len(), 1);
    }

    #[test]
    fn test_faulting_event_commits_nothing_anywhere() {
        let mut pipeline = Pipeline::from_config(&two_stage_config()).unwrap();

        // Passes stage 1 but lacks `njet`: stage 2's predicate faults, and
        // not even stage 1's counters or table may remember the event.
        let event = Event::new().with("ht", 250.0);
        assert!(pipeline.process(event).is_err());

        assert_eq!(pipeline.stages()[0].tree().root_counts(), (0, 0));
        assert_eq!(pipeline.stages()[1].tree().root_counts(), (0, 0));
        assert!(pipeline.stages()[0].tables()[0].is_empty());
    }

    #[test]
    fn test_run_skips_failures_and_counts_them() {
        let mut pipeline = Pipeline::from_config(&two_stage_config()).unwrap();
        let events = vec![
            Ok(ev(250.0, 3.0)),
            Ok(Event::new().with("ht", 250.0)), // faults in stage 2
            Err(SourceError::NotAnObject { line: 3 }),
            Ok(ev(50.0, 0.0)),
        ];
        let stats = pipeline.run(events, None);
        assert_eq!(stats.events_read, 4);
        assert_eq!(stats.events_failed, 2);
        assert_eq!(stats.events_surviving, 1);
    }

    #[test]
    fn test_run_respects_max_events() {
        let mut pipeline = Pipeline::from_config(&two_stage_config()).unwrap();
        let events = (0..10).map(|_| Ok(ev(250.0, 3.0))).collect::<Vec<_>>();
        let stats = pipeline.run(events, Some(4));
        assert_eq!(stats.events_read, 4);
        assert_eq!(stats.events_surviving, 4);
    }

    #[test]
    fn test_derivation_feeds_later_cuts() {
        let cfg = AnalysisConfig::from_json(
            r#"{
                "derive": [{"out": "r", "ratio": ["mht", "met"]}],
                "stages": [{
                    "name": "ratio cut",
                    "selection": {"All": ["ev : ev.r < 1.25"]}
                }]
            }"#,
        )
        .unwrap();
        let mut pipeline = Pipeline::from_config(&cfg).unwrap();

        let passing = Event::new().with("mht", 100.0).with("met", 90.0);
        let failing = Event::new().with("mht", 200.0).with("met", 90.0);
        assert!(pipeline.process(passing).unwrap());
        assert!(!pipeline.process(failing).unwrap());
    }

    #[test]
    fn test_empty_stage_list_rejected() {
        let cfg = AnalysisConfig::from_json(r#"{"stages": []}"#).unwrap();
        assert!(matches!(
            Pipeline::from_config(&cfg),
            Err(ConfigError::NoStages)
        ));
    }

    #[test]
    fn test_summary_reflects_run() {
        let mut pipeline = Pipeline::from_config(&two_stage_config()).unwrap();
        let stats = pipeline.run(vec![Ok(ev(250.0, 3.0)), Ok(ev(450.0, 2.0))], None);
        let summary = pipeline.summary(&stats);

        assert_eq!(summary.events_read, 2);
        assert_eq!(summary.events_surviving, 2);
        assert_eq!(summary.stages.len(), 2);
        assert_eq!(summary.stages[0].selection_pass, 2);
        assert_eq!(summary.stages[0].tables[0].distinct_keys, 2);

        let keys: Vec<_> = pipeline.stages()[0].tables()[0]
            .counts()
            .keys()
            .cloned()
            .collect();
        assert_eq!(
            keys,
            vec![vec![KeyAtom::num(200.0)], vec![KeyAtom::num(400.0)]]
        );
    }
}
