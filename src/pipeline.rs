use crate::config::Config;
use crate::constants::TABLE_ATTRIBS;
use crate::error::Result;
use crate::extract::extract;
use crate::query::{QueryResult, QueryRunner};
use crate::rates::RateMap;
use crate::sinks::{FlatFileSink, RelationalSink, StoreSession};
use crate::source::{DocumentSource, FileSource, HttpSource};
use crate::stage_log::StageLogger;
use crate::table::Table;
use crate::transform::transform;
use scraper::Html;
use std::fmt;
use tracing::{info, instrument};

/// Pipeline states, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    Extracted,
    Transformed,
    FlatWritten,
    DbConnected,
    DbWritten,
    Queried,
    Done,
}

impl Stage {
    /// Stage log line recorded on entering this state.
    pub fn log_message(self) -> &'static str {
        match self {
            Stage::Init => "Preliminaries complete. Initiating ETL process.",
            Stage::Extracted => "Data extraction complete. Initiating Transformation process.",
            Stage::Transformed => "Data transformation complete. Initiating loading process.",
            Stage::FlatWritten => "Data saved to CSV file.",
            Stage::DbConnected => "SQL Connection initiated.",
            Stage::DbWritten => "Data loaded to Database as table. Running the query.",
            Stage::Queried => "Queries executed. Closing SQL connection.",
            Stage::Done => "Process Complete.",
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Init => Some(Stage::Extracted),
            Stage::Extracted => Some(Stage::Transformed),
            Stage::Transformed => Some(Stage::FlatWritten),
            Stage::FlatWritten => Some(Stage::DbConnected),
            Stage::DbConnected => Some(Stage::DbWritten),
            Stage::DbWritten => Some(Stage::Queried),
            Stage::Queried => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "INIT",
            Stage::Extracted => "EXTRACTED",
            Stage::Transformed => "TRANSFORMED",
            Stage::FlatWritten => "FLAT_WRITTEN",
            Stage::DbConnected => "DB_CONNECTED",
            Stage::DbWritten => "DB_WRITTEN",
            Stage::Queried => "QUERIED",
            Stage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub table: Table,
    pub query_results: Vec<QueryResult>,
    pub stage: Stage,
}

/// Tracks the current stage and writes the stage log entry for each move.
struct StageTracker<'a> {
    logger: &'a StageLogger,
    stage: Stage,
}

impl<'a> StageTracker<'a> {
    fn start(logger: &'a StageLogger) -> Result<Self> {
        logger.log(Stage::Init.log_message())?;
        Ok(Self {
            logger,
            stage: Stage::Init,
        })
    }

    fn advance(&mut self, to: Stage) -> Result<()> {
        debug_assert_eq!(self.stage.next(), Some(to), "stage skipped");
        self.logger.log(to.log_message())?;
        info!(from = %self.stage, to = %to, "stage transition");
        self.stage = to;
        Ok(())
    }
}

/// Sequences extract, transform, load and query for one run.
pub struct Pipeline {
    config: Config,
    logger: StageLogger,
    queries: QueryRunner,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let logger = StageLogger::new(config.log_path.clone());
        let queries = QueryRunner::new(config.query_list());
        Self {
            config,
            logger,
            queries,
        }
    }

    /// Replace the fixed report queries. Not reachable from configuration;
    /// tests use it to exercise query failures.
    #[doc(hidden)]
    pub fn with_queries(mut self, queries: QueryRunner) -> Self {
        self.queries = queries;
        self
    }

    /// The configured document source: the local snapshot when set, else HTTP.
    pub fn default_source(&self) -> Result<Box<dyn DocumentSource>> {
        Ok(match &self.config.source_file {
            Some(path) => Box::new(FileSource::new(path.clone())),
            None => Box::new(HttpSource::new(self.config.source_url.clone())?),
        })
    }

    /// Run every stage in order. The first error stops the run where it is;
    /// outputs of completed stages are left in place.
    #[instrument(skip_all, fields(source = %source.describe()))]
    pub fn run(&self, source: &dyn DocumentSource) -> Result<PipelineReport> {
        let mut tracker = StageTracker::start(&self.logger)?;

        let body = source.fetch()?;
        let table = extract(&Html::parse_document(&body), &TABLE_ATTRIBS)?;
        tracker.advance(Stage::Extracted)?;

        let rates = RateMap::load(&self.config.rates_path)?;
        let table = transform(table, &rates)?;
        tracker.advance(Stage::Transformed)?;

        FlatFileSink::write(&table, &self.config.csv_output_path)?;
        tracker.advance(Stage::FlatWritten)?;

        let mut session = StoreSession::open(&self.config.db_path)?;
        let query_results = self.load_and_query(&mut session, &table, &mut tracker);
        let closed = session.close();
        let query_results = query_results?;
        closed?;
        tracker.advance(Stage::Done)?;

        Ok(PipelineReport {
            table,
            query_results,
            stage: tracker.stage,
        })
    }

    fn load_and_query(
        &self,
        session: &mut StoreSession,
        table: &Table,
        tracker: &mut StageTracker<'_>,
    ) -> Result<Vec<QueryResult>> {
        tracker.advance(Stage::DbConnected)?;

        RelationalSink::write(table, session.connection_mut()?, &self.config.table_name)?;
        tracker.advance(Stage::DbWritten)?;

        let results = self
            .queries
            .run(session.connection()?, |result| println!("{}", result))?;
        tracker.advance(Stage::Queried)?;
        Ok(results)
    }
}
