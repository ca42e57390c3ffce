//! Replay engine.
//!
//! Pulls records from a [`SessionSource`] one step at a time, translates them
//! into book commands, resolves crossed quotes, applies the commands to the
//! order book and feeds the metrics accumulator.

use crate::resolver::CrossedQuoteResolver;
use crate::session::{SessionLifecycle, SessionPhase};
use crate::stats::ReplayStats;
use lobsim_book::LimitOrderBook;
use lobsim_core::{
    BestQuote, BookCommand, BookState, BookView, Bucket, Qty, RawRecord, ReplayConfig, Result,
    TopOfBook,
};
use lobsim_ingestion::{LevelOneTranslator, RowTranslator, SessionRows, SessionSource};
use tracing::{debug, info};

/// Outcome of one [`ReplayEngine::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// A record (or a crossed-quote correction) was applied.
    Emitted(Vec<BookCommand>),
    /// The current session ran out of rows; the next step opens the next one.
    SessionEnded,
    /// No sessions remain. Returned on every call from here on.
    ReplayExhausted,
}

impl StepResult {
    /// Commands of an `Emitted` step.
    pub fn commands(&self) -> Option<&[BookCommand]> {
        match self {
            StepResult::Emitted(commands) => Some(commands),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, StepResult::ReplayExhausted)
    }
}

/// A step-driven market data replay.
///
/// One implementor exists per feed format; the simulation loop only needs
/// to pull steps and know which session it is in.
pub trait OrderMatching {
    /// Advance by one record.
    fn step(&mut self, verbose: bool) -> Result<StepResult>;

    /// Name of the session being replayed. Empty once the replay is exhausted.
    fn current_session_id(&self) -> String;
}

/// Level-I replay engine over a session source.
pub struct ReplayEngine<S, T = LevelOneTranslator> {
    config: ReplayConfig,
    source: S,
    translator: T,
    resolver: CrossedQuoteResolver,
    lifecycle: SessionLifecycle,
    /// Rows of the open session; `None` until the session is opened.
    rows: Option<SessionRows>,
    book: LimitOrderBook,
    /// Record held back by a crossed-quote correction or a failed step.
    pending: Option<RawRecord>,
    stats: ReplayStats,
}

impl<S: SessionSource> ReplayEngine<S> {
    /// Create an engine with the Level-I translator.
    pub fn new(config: ReplayConfig, source: S) -> Result<Self> {
        Self::with_translator(config, source, LevelOneTranslator)
    }
}

impl<S: SessionSource, T: RowTranslator> ReplayEngine<S, T> {
    /// Create an engine with a custom row translator.
    pub fn with_translator(config: ReplayConfig, source: S, translator: T) -> Result<Self> {
        config.validate()?;

        let lifecycle = SessionLifecycle::new(
            config.engine.start_session,
            source.session_count(),
            config.engine.bucket_seconds,
        );
        let resolver = CrossedQuoteResolver::new(config.engine.warmup_rows);
        let book = LimitOrderBook::new(config.instrument.symbol.clone());

        info!(
            symbol = %config.instrument.symbol,
            sessions = source.session_count(),
            start = config.engine.start_session,
            "replay engine created"
        );

        Ok(Self {
            config,
            source,
            translator,
            resolver,
            lifecycle,
            rows: None,
            book,
            pending: None,
            stats: ReplayStats::default(),
        })
    }

    /// Advance by one record.
    ///
    /// A step either applies all of its commands or none: when the book
    /// rejects a command, it is restored, the metrics and cursor are left
    /// untouched and the record is retried by the next call.
    pub fn step(&mut self, verbose: bool) -> Result<StepResult> {
        if self.lifecycle.phase() == SessionPhase::Exhausted {
            return Ok(StepResult::ReplayExhausted);
        }

        let record = match self.pending.take() {
            Some(record) => record,
            None => match self.next_record()? {
                Some(record) => record,
                None => return Ok(self.end_session()),
            },
        };

        let result = self.process(record, verbose)?;
        self.lifecycle.activate();
        Ok(result)
    }

    /// Clear the session counters, unless nothing was consumed since the
    /// last reset. Returns whether anything was cleared.
    ///
    /// The book is kept, so the best-quote cache restarts from it.
    pub fn reset_session(&mut self) -> bool {
        if !self.lifecycle.reset() {
            return false;
        }
        let top = self.book.top_of_book();
        if top.is_two_sided() {
            self.lifecycle.state_mut().quotes = top;
        }
        true
    }

    fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let rows = match self.rows.take() {
            Some(rows) => rows,
            None => self.open_session()?,
        };
        self.rows.insert(rows).next().transpose()
    }

    fn open_session(&mut self) -> Result<SessionRows> {
        let index = self.lifecycle.index();
        let rows = self.source.open_session(index)?;
        self.book = LimitOrderBook::new(self.config.instrument.symbol.clone());

        info!(
            symbol = %self.book.symbol(),
            session = index,
            name = %self.source.session_name(index).unwrap_or_default(),
            "session opened"
        );
        Ok(rows)
    }

    fn end_session(&mut self) -> StepResult {
        self.rows = None;
        self.stats.sessions_completed += 1;

        let finished = self.lifecycle.index();
        let phase = self.lifecycle.roll_over(self.source.session_count());
        info!(session = finished, "session ended");

        if phase == SessionPhase::Exhausted {
            info!(
                steps = self.stats.steps,
                corrections = self.stats.corrections,
                "replay exhausted"
            );
            StepResult::ReplayExhausted
        } else {
            StepResult::SessionEnded
        }
    }

    fn process(&mut self, record: RawRecord, verbose: bool) -> Result<StepResult> {
        let quotes = self.lifecycle.state().quotes;
        let correction = self
            .resolver
            .resolve(&record, &quotes, &self.book, &self.translator);
        let corrected = correction.is_some();
        let commands = match correction {
            Some(correction) => correction.commands,
            None => self.translator.translate(record.row, &record, None, &self.book),
        };

        let snapshot = self.book.clone();
        for command in &commands {
            if let Err(err) = self.book.apply(command) {
                debug!(row = record.row, %err, "step rolled back");
                self.book = snapshot;
                self.pending = Some(record);
                return Err(err);
            }
            if verbose {
                info!(
                    row = command.row,
                    side = %command.side,
                    price = command.price,
                    qty = command.qty,
                    status = ?command.status,
                    aggressor = command.aggressor,
                    "command"
                );
            }
        }

        let top = self.book.top_of_book();
        let state = self.lifecycle.state_mut();
        let metrics = state
            .metrics
            .on_step(&state.quotes, &top, &commands, record.seconds);
        if let Some(index) = metrics.closed_bucket {
            debug!(
                bucket = index,
                ofi = state.metrics.ofi(),
                traded_bid = state.metrics.qty_traded_at_bid(),
                traded_ask = state.metrics.qty_traded_at_ask(),
                "bucket closed"
            );
        }
        if top.is_two_sided() {
            state.quotes = top;
        }

        if corrected {
            self.stats.corrections += 1;
            self.pending = Some(record);
        } else {
            state.cursor += 1;
            self.stats.records += 1;
        }
        if let Some(delta) = metrics.ofi_delta {
            self.stats.ofi_updates += u64::from(delta != 0.0);
        }
        self.stats.steps += 1;
        self.stats.commands += commands.len() as u64;
        self.stats.aggressive_fills +=
            commands.iter().filter(|c| c.is_aggressive_fill()).count() as u64;

        Ok(StepResult::Emitted(commands))
    }
}

impl<S: SessionSource, T> ReplayEngine<S, T> {
    /// Name of the session being replayed. Empty once the replay is exhausted.
    pub fn current_session_id(&self) -> String {
        self.source
            .session_name(self.lifecycle.index())
            .unwrap_or_default()
    }

    /// Number of sessions in the source.
    pub fn session_count(&self) -> usize {
        self.source.session_count()
    }
}

impl<S, T> ReplayEngine<S, T> {
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Cumulative order flow imbalance of the session.
    pub fn cumulative_ofi(&self) -> f64 {
        self.lifecycle.state().metrics.ofi()
    }

    /// Quantity traded against resting bids this session.
    pub fn qty_traded_at_bid(&self) -> Qty {
        self.lifecycle.state().metrics.qty_traded_at_bid()
    }

    /// Quantity traded against resting asks this session.
    pub fn qty_traded_at_ask(&self) -> Qty {
        self.lifecycle.state().metrics.qty_traded_at_ask()
    }

    /// Last closed bucket of the session.
    pub fn last_bucket(&self) -> Option<&Bucket> {
        self.lifecycle.state().metrics.last_bucket()
    }

    /// Closed buckets of the session, oldest first.
    pub fn buckets(&self) -> &[Bucket] {
        self.lifecycle.state().metrics.buckets()
    }

    /// Cached best quotes: the last two-sided top of book of the session.
    pub fn top_of_book(&self) -> TopOfBook {
        self.lifecycle.state().quotes
    }

    pub fn best_bid(&self) -> Option<BestQuote> {
        self.lifecycle.state().quotes.bid
    }

    pub fn best_ask(&self) -> Option<BestQuote> {
        self.lifecycle.state().quotes.ask
    }

    /// Index of the current session.
    pub fn session_index(&self) -> usize {
        self.lifecycle.index()
    }

    /// Records consumed from the current session.
    pub fn row_cursor(&self) -> u64 {
        self.lifecycle.state().cursor
    }

    pub fn phase(&self) -> SessionPhase {
        self.lifecycle.phase()
    }

    /// Record to be processed by the next step instead of a fresh one.
    pub fn pending(&self) -> Option<&RawRecord> {
        self.pending.as_ref()
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    pub fn book(&self) -> &LimitOrderBook {
        &self.book
    }
}

impl<S: SessionSource, T: RowTranslator> OrderMatching for ReplayEngine<S, T> {
    fn step(&mut self, verbose: bool) -> Result<StepResult> {
        ReplayEngine::step(self, verbose)
    }

    fn current_session_id(&self) -> String {
        ReplayEngine::current_session_id(self)
    }
}
