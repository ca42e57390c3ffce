//! PyO3 bindings for the lobsim replay engine.
//!
//! Exposes the step-driven replay to a Python simulation loop:
//! - Book commands and closed buckets as plain value classes
//! - The replay engine over a zip archive or a directory of sessions

use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::Path;

use lobsim_core::{
    BookCommand as RustBookCommand, Bucket as RustBucket, Error as RustError, ReplayConfig,
};
use lobsim_ingestion::{DirectorySource, SessionSource, ZipArchiveSource};
use lobsim_replay::{ReplayEngine, StepResult};

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::ArchiveOpen { .. } | RustError::Io(_) => PyIOError::new_err(err.to_string()),
        RustError::InvariantViolation(_) => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// A single book mutation.
#[pyclass]
#[derive(Clone)]
pub struct BookCommand {
    #[pyo3(get)]
    pub row: u64,
    /// "BID" or "ASK".
    #[pyo3(get)]
    pub side: String,
    #[pyo3(get)]
    pub price: f64,
    #[pyo3(get)]
    pub qty: u64,
    #[pyo3(get)]
    pub status: String,
    #[pyo3(get)]
    pub aggressor: bool,
}

#[pymethods]
impl BookCommand {
    fn __repr__(&self) -> String {
        format!(
            "BookCommand(row={}, side={}, price={}, qty={}, status={}, aggressor={})",
            self.row, self.side, self.price, self.qty, self.status, self.aggressor
        )
    }
}

impl From<&RustBookCommand> for BookCommand {
    fn from(c: &RustBookCommand) -> Self {
        BookCommand {
            row: c.row,
            side: c.side.as_str().to_string(),
            price: c.price,
            qty: c.qty,
            status: format!("{:?}", c.status),
            aggressor: c.aggressor,
        }
    }
}

/// Cumulative metrics snapshotted when a time bucket closed.
#[pyclass]
#[derive(Clone)]
pub struct Bucket {
    #[pyo3(get)]
    pub index: u32,
    #[pyo3(get)]
    pub start_seconds: u32,
    #[pyo3(get)]
    pub ofi: f64,
    #[pyo3(get)]
    pub qty_traded_bid: u64,
    #[pyo3(get)]
    pub qty_traded_ask: u64,
    #[pyo3(get)]
    pub mid_price: Option<f64>,
}

#[pymethods]
impl Bucket {
    fn __repr__(&self) -> String {
        format!(
            "Bucket(index={}, ofi={:.1}, traded_bid={}, traded_ask={}, mid={:?})",
            self.index, self.ofi, self.qty_traded_bid, self.qty_traded_ask, self.mid_price
        )
    }
}

impl From<&RustBucket> for Bucket {
    fn from(b: &RustBucket) -> Self {
        Bucket {
            index: b.index,
            start_seconds: b.start_seconds,
            ofi: b.ofi,
            qty_traded_bid: b.qty_traded_bid,
            qty_traded_ask: b.qty_traded_ask,
            mid_price: b.mid_price,
        }
    }
}

// ============================================================================
// Replay Engine
// ============================================================================

/// Level-I replay engine.
///
/// `step()` returns the applied commands, or `None` when a session ended or
/// the replay is exhausted; check `exhausted` to tell them apart.
#[pyclass(name = "ReplayEngine", unsendable)]
pub struct PyReplayEngine {
    inner: ReplayEngine<Box<dyn SessionSource>>,
    exhausted: bool,
}

#[pymethods]
impl PyReplayEngine {
    /// Open a zip archive, or a directory of session CSV files.
    #[new]
    #[pyo3(signature = (path, config_json=None, start_session=None))]
    fn new(path: &str, config_json: Option<&str>, start_session: Option<usize>) -> PyResult<Self> {
        let mut config = match config_json {
            Some(json) => ReplayConfig::from_json_str(json).map_err(to_py_err)?,
            None => ReplayConfig::default(),
        };
        if let Some(start) = start_session {
            config.engine.start_session = start;
        }

        let source: Box<dyn SessionSource> = if Path::new(path).is_dir() {
            Box::new(DirectorySource::open(path, config.feed.clone()).map_err(to_py_err)?)
        } else {
            Box::new(ZipArchiveSource::open(path, config.feed.clone()).map_err(to_py_err)?)
        };

        let inner = ReplayEngine::new(config, source).map_err(to_py_err)?;
        Ok(PyReplayEngine {
            inner,
            exhausted: false,
        })
    }

    /// Advance by one record.
    #[pyo3(signature = (verbose=false))]
    fn step(&mut self, verbose: bool) -> PyResult<Option<Vec<BookCommand>>> {
        match self.inner.step(verbose).map_err(to_py_err)? {
            StepResult::Emitted(commands) => Ok(Some(commands.iter().map(Into::into).collect())),
            StepResult::SessionEnded => Ok(None),
            StepResult::ReplayExhausted => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Clear the session counters; a no-op right after a reset or rollover.
    fn reset_session(&mut self) -> bool {
        self.inner.reset_session()
    }

    fn current_session_id(&self) -> String {
        self.inner.current_session_id()
    }

    #[getter]
    fn exhausted(&self) -> bool {
        self.exhausted
    }

    #[getter]
    fn session_index(&self) -> usize {
        self.inner.session_index()
    }

    #[getter]
    fn row_cursor(&self) -> u64 {
        self.inner.row_cursor()
    }

    #[getter]
    fn cumulative_ofi(&self) -> f64 {
        self.inner.cumulative_ofi()
    }

    #[getter]
    fn qty_traded_at_bid(&self) -> u64 {
        self.inner.qty_traded_at_bid()
    }

    #[getter]
    fn qty_traded_at_ask(&self) -> u64 {
        self.inner.qty_traded_at_ask()
    }

    /// Best bid as (price, qty).
    #[getter]
    fn best_bid(&self) -> Option<(f64, u64)> {
        self.inner.best_bid().map(|q| (q.price, q.qty))
    }

    /// Best ask as (price, qty).
    #[getter]
    fn best_ask(&self) -> Option<(f64, u64)> {
        self.inner.best_ask().map(|q| (q.price, q.qty))
    }

    #[getter]
    fn last_bucket(&self) -> Option<Bucket> {
        self.inner.last_bucket().map(Into::into)
    }

    /// Closed buckets of the current session.
    fn buckets(&self) -> Vec<Bucket> {
        self.inner.buckets().iter().map(Into::into).collect()
    }

    /// Run statistics as (steps, records, commands, corrections, sessions_completed).
    fn stats(&self) -> (u64, u64, u64, u64, u64) {
        let s = self.inner.stats();
        (s.steps, s.records, s.commands, s.corrections, s.sessions_completed)
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// lobsim - Level-I limit order book replay for Python.
#[pymodule]
fn lobsim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<BookCommand>()?;
    m.add_class::<Bucket>()?;
    m.add_class::<PyReplayEngine>()?;
    Ok(())
}
