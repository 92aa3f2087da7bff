//! Ingestion orchestrator
//!
//! Drives every source in priority order: read, extract, build, insert.
//! Record-level failures are counted and logged, source-level failures skip
//! the source, and only setup failures abort the run.

use crate::builder::RouteBuilder;
use crate::config::{IngestProfile, SourceSpec};
use crate::error::{IngestError, Result};
use crate::extract::{MetadataExtractor, RegionTable};
use crate::model::RawTrailRecord;
use crate::readers;
use crate::report::{StatsReport, StatsReporter};
use crate::store::{RouteStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Init,
    ConnectStore,
    Ingest,
    Report,
    Done,
    Failed,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Init => "init",
            RunPhase::ConnectStore => "connect_store",
            RunPhase::Ingest => "ingest",
            RunPhase::Report => "report",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of processing one record
#[derive(Debug)]
pub enum RecordOutcome {
    Imported { external_id: String, id: Uuid },
    Duplicate { external_id: String },
    Declined(IngestError),
    Failed(IngestError),
}

/// Counters for one source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub read: u64,
    pub imported: u64,
    pub skipped_duplicates: u64,
    pub declined: u64,
    pub failed: u64,
    /// Set when the whole source was skipped
    pub skipped_reason: Option<String>,
    pub duration_secs: f64,
}

impl SourceStats {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.read += 1;
        match outcome {
            RecordOutcome::Imported { .. } => self.imported += 1,
            RecordOutcome::Duplicate { .. } => self.skipped_duplicates += 1,
            RecordOutcome::Declined(_) => self.declined += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Counters for a whole run plus the final report
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub sources: Vec<SourceStats>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub report: Option<StatsReport>,
}

impl RunStats {
    fn new() -> Self {
        Self {
            sources: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            report: None,
        }
    }

    fn sum(&self, field: impl Fn(&SourceStats) -> u64) -> u64 {
        self.sources.iter().map(field).sum()
    }

    pub fn read(&self) -> u64 {
        self.sum(|s| s.read)
    }

    pub fn imported(&self) -> u64 {
        self.sum(|s| s.imported)
    }

    pub fn skipped_duplicates(&self) -> u64 {
        self.sum(|s| s.skipped_duplicates)
    }

    pub fn declined(&self) -> u64 {
        self.sum(|s| s.declined)
    }

    pub fn failed(&self) -> u64 {
        self.sum(|s| s.failed)
    }

    pub fn source(&self, name: &str) -> Option<&SourceStats> {
        self.sources.iter().find(|s| s.source == name)
    }
}

pub struct IngestOrchestrator {
    store: Arc<dyn RouteStore>,
    data_root: PathBuf,
    sources: Vec<SourceSpec>,
    extractor: MetadataExtractor,
    builder: RouteBuilder,
    phase: RunPhase,
}

impl IngestOrchestrator {
    pub fn new(
        store: Arc<dyn RouteStore>,
        data_root: impl Into<PathBuf>,
        sources: Vec<SourceSpec>,
        extractor: MetadataExtractor,
        builder: RouteBuilder,
    ) -> Self {
        Self {
            store,
            data_root: data_root.into(),
            sources,
            extractor,
            builder,
            phase: RunPhase::Init,
        }
    }

    /// Orchestrator for the sources and policies of a profile
    pub fn from_profile(
        store: Arc<dyn RouteStore>,
        data_root: impl Into<PathBuf>,
        profile: &IngestProfile,
    ) -> Result<Self> {
        let catalog = profile.catalog();
        catalog.validate()?;

        let extractor = MetadataExtractor::new(RegionTable::spain())
            .map_err(|e| IngestError::Setup(format!("invalid code pattern: {}", e)))?;

        Ok(Self::new(
            store,
            data_root,
            catalog.ordered(),
            extractor,
            profile.builder(),
        ))
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn store(&self) -> &Arc<dyn RouteStore> {
        &self.store
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = %self.phase, to = %phase, "Phase transition");
        self.phase = phase;
    }

    /// Run every source once; fails only on setup errors
    pub async fn run(&mut self) -> Result<RunStats> {
        let mut stats = RunStats::new();
        info!(
            data_root = %self.data_root.display(),
            sources = self.sources.len(),
            "Starting trail ingestion"
        );

        self.enter(RunPhase::ConnectStore);
        if let Err(e) = self.setup().await {
            self.enter(RunPhase::Failed);
            error!("Ingestion setup failed: {}", e);
            return Err(e);
        }

        self.enter(RunPhase::Ingest);
        // Fixed priority order regardless of how the list was built
        let mut sources = self.sources.clone();
        sources.sort_by_key(|source| source.provider.priority());
        for spec in &sources {
            let source_stats = self.ingest_source(spec).await;
            stats.sources.push(source_stats);
        }

        self.enter(RunPhase::Report);
        stats.report = StatsReporter::new(self.store.as_ref()).report().await;

        self.enter(RunPhase::Done);
        stats.completed_at = Some(Utc::now());
        info!(
            read = stats.read(),
            imported = stats.imported(),
            skipped_duplicates = stats.skipped_duplicates(),
            declined = stats.declined(),
            failed = stats.failed(),
            "Trail ingestion completed"
        );

        Ok(stats)
    }

    async fn setup(&self) -> Result<()> {
        if !self.data_root.is_dir() {
            return Err(IngestError::Setup(format!(
                "data root not found: {}",
                self.data_root.display()
            )));
        }

        self.store
            .ping()
            .await
            .map_err(|e| IngestError::Setup(format!("store unreachable: {}", e)))
    }

    /// Drain one source; a missing or unreadable source is skipped
    #[instrument(skip(self, spec), fields(source = %spec.name))]
    pub async fn ingest_source(&self, spec: &SourceSpec) -> SourceStats {
        let started = Instant::now();
        let mut stats = SourceStats::new(&spec.name);

        let records = match readers::open(spec, &self.data_root) {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping source: {}", e);
                stats.skipped_reason = Some(e.to_string());
                return stats;
            }
        };

        info!(kind = %spec.kind, provider = %spec.provider, "Ingesting source");
        for item in records {
            let outcome = self.process(item).await;
            stats.record(&outcome);
        }

        stats.duration_secs = started.elapsed().as_secs_f64();
        info!(
            read = stats.read,
            imported = stats.imported,
            skipped_duplicates = stats.skipped_duplicates,
            declined = stats.declined,
            failed = stats.failed,
            "Source completed"
        );
        stats
    }

    /// Build and insert one record
    pub async fn process(&self, item: Result<RawTrailRecord>) -> RecordOutcome {
        let raw = match item {
            Ok(raw) => raw,
            Err(e) => {
                warn!("✗ {}", e);
                return RecordOutcome::Failed(e);
            }
        };
        let context = raw.context.clone();
        let external_id = raw.external_id.clone();

        match self.store.exists(&external_id).await {
            Ok(true) => {
                debug!(%context, external_id = %external_id, "Already stored, skipping");
                return RecordOutcome::Duplicate { external_id };
            }
            Ok(false) => {}
            Err(e) => {
                let error = IngestError::record(context, format!("existence check failed: {}", e));
                error!("✗ {}", error);
                return RecordOutcome::Failed(error);
            }
        }

        let meta = self.extractor.extract(&raw);
        let route = match self.builder.build(raw, meta) {
            Ok(route) => route,
            Err(reason) => {
                let error = IngestError::Declined { context, reason };
                warn!("✗ {}", error);
                return RecordOutcome::Declined(error);
            }
        };

        match self.store.insert_one(&route).await {
            Ok(id) => {
                info!(
                    %context,
                    external_id = %external_id,
                    name = %route.name,
                    distance_km = route.distance_km,
                    "✓ Imported"
                );
                RecordOutcome::Imported { external_id, id }
            }
            Err(StoreError::DuplicateKey(_)) => {
                debug!(%context, external_id = %external_id, "Duplicate key on insert, skipping");
                RecordOutcome::Duplicate { external_id }
            }
            Err(e) => {
                let error = IngestError::record(context, format!("insert failed: {}", e));
                error!("✗ {}", error);
                RecordOutcome::Failed(error)
            }
        }
    }
}
