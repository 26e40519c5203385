//! Glue between the durable selection store and a mounted view.
//!
//! The store and `ViewState` stay separate containers. Edits flow from the
//! view to the store through the debouncer; store changes flow back through
//! `on_store_changed`, which drops any pending local edit and marks the
//! incoming value as already propagated so it is never written back.

use std::collections::VecDeque;
use std::time::Instant;

use chrono::NaiveDate;

use crate::actions::RuntimeAction;
use crate::actions::ViewAction;
use crate::config::ViewConfig;
use crate::datasets::DatasetRegistry;
use crate::debounce::Debouncer;
use crate::persistence::SelectionStore;
use crate::reducer::reduce;
use crate::reducer::ViewEffect;
use crate::state::DurableSelection;
use crate::state::LogEntry;
use crate::state::LogLevel;
use crate::state::LogSource;
use crate::state::ViewState;

pub struct ViewSession<S: SelectionStore> {
    store: S,
    state: ViewState,
    persist: Debouncer<DurableSelection>,
    default_dataset: Option<String>,
}

impl<S: SelectionStore> ViewSession<S> {
    pub fn new(store: S, config: &ViewConfig) -> Self {
        Self {
            store,
            state: ViewState::new(
                config.allowed_visualizations.clone(),
                config.month_granularity,
            ),
            persist: Debouncer::new(config.debounce()),
            default_dataset: config.default_dataset.clone(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.persist.deadline()
    }

    /// Bootstraps the view from the store. Later calls do nothing.
    pub fn mount(&mut self, today: NaiveDate, now: Instant) -> std::io::Result<Vec<ViewEffect>> {
        if self.state.is_bootstrapped() {
            return Ok(Vec::new());
        }
        let stored = self.store.get()?;
        if let Some(selection) = stored.as_ref() {
            self.persist.mark_flushed(selection.clone());
        }
        let dataset_id = stored
            .as_ref()
            .and_then(|selection| selection.dataset_id.clone())
            .or_else(|| self.default_dataset.clone());
        let metadata = dataset_id
            .as_deref()
            .and_then(DatasetRegistry::capabilities_for);
        Ok(self.dispatch(
            RuntimeAction::Bootstrap {
                stored,
                metadata,
                today,
            },
            now,
        ))
    }

    /// Runs the reducer and settles internal effects. Effects the host must
    /// carry out are returned, with at most one trailing `RequestRender`.
    pub fn dispatch(&mut self, action: impl Into<ViewAction>, now: Instant) -> Vec<ViewEffect> {
        let mut queue: VecDeque<ViewAction> = VecDeque::from([action.into()]);
        let mut outward = Vec::new();
        let mut render = false;

        while let Some(action) = queue.pop_front() {
            for effect in reduce(&mut self.state, action) {
                match effect {
                    ViewEffect::PersistSelection(selection) => {
                        self.persist.schedule(selection, now);
                    }
                    ViewEffect::LoadMetadata(dataset_id) => {
                        let metadata = DatasetRegistry::capabilities_for(&dataset_id);
                        if metadata.is_none() {
                            tracing::warn!(dataset = %dataset_id, "no metadata for dataset");
                        }
                        queue.push_back(RuntimeAction::SetDatasetMetadata(metadata).into());
                    }
                    ViewEffect::RequestRender => render = true,
                    other => outward.push(other),
                }
            }
        }

        if render {
            outward.push(ViewEffect::RequestRender);
        }
        outward
    }

    /// Writes a due selection to the store and lets the view react to it.
    pub fn tick(&mut self, now: Instant) -> std::io::Result<Vec<ViewEffect>> {
        match self.persist.poll(now) {
            Some(selection) => self.commit(selection, now),
            None => Ok(Vec::new()),
        }
    }

    /// Writes any pending selection immediately.
    pub fn flush(&mut self, now: Instant) -> std::io::Result<Vec<ViewEffect>> {
        match self.persist.flush_now() {
            Some(selection) => self.commit(selection, now),
            None => Ok(Vec::new()),
        }
    }

    /// Applies a selection that changed in the store outside this view.
    /// The incoming value replaces the durable fields, so a local edit still
    /// waiting on the debouncer is dropped rather than written over it.
    pub fn on_store_changed(&mut self, selection: DurableSelection, now: Instant) -> Vec<ViewEffect> {
        if self.persist.is_pending() {
            tracing::debug!("pending local edit superseded by store change");
        }
        self.persist.cancel();
        self.persist.mark_flushed(selection.clone());
        self.dispatch(RuntimeAction::SyncFromStore(selection), now)
    }

    fn commit(
        &mut self,
        selection: DurableSelection,
        now: Instant,
    ) -> std::io::Result<Vec<ViewEffect>> {
        if let Err(err) = self.store.set(&selection) {
            self.dispatch(
                RuntimeAction::AppendLog(store_log(LogLevel::Error, format!("write failed: {err}"))),
                now,
            );
            return Err(err);
        }
        let message = format!(
            "committed selection for {}",
            selection.dataset_id.as_deref().unwrap_or("<none>")
        );
        self.dispatch(RuntimeAction::AppendLog(store_log(LogLevel::Info, message)), now);
        Ok(self.dispatch(RuntimeAction::SelectionCommitted, now))
    }
}

fn store_log(level: LogLevel, message: String) -> LogEntry {
    LogEntry {
        seq: 0,
        level,
        source: LogSource::Store,
        context: Some("selection".to_string()),
        message,
    }
}
