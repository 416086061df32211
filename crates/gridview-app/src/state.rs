// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::debounce::Debounced;
use crate::ids::RecordId;
use crate::model::{ColumnSpec, Dataset, Record};
use crate::perf::{FILTER_BUDGET, PerfMonitor, SELECT_ALL_BUDGET, SORT_BUDGET};
use crate::pipeline::{FacetFilter, PipelineConfig, SortSpec, ViewParameters};
use crate::pipeline::{filter_indices, sort_indices};
use crate::viewport::{Viewport, ViewportWindow, compute_window};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCommand {
    Search(String),
    FlushSearch,
    ToggleSort(String),
    ClearSort,
    ToggleRow { id: RecordId, checked: bool },
    ToggleAll(bool),
    ClearSelection,
    SetFacet { field: String, value: Option<String> },
    Scroll(u64),
    ScrollBy(i64),
    Reveal(usize),
    Resize(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    SearchEdited(String),
    SearchSettled(String),
    SequenceRebuilt { len: usize },
    SortChanged(Option<SortSpec>),
    SelectionChanged { selected: usize },
    Scrolled(u64),
    Resized(u32),
}

/// One mounted table view: source records, view parameters, selection and
/// scroll position. The derived sequence is rebuilt whenever parameters change;
/// the viewport window is recomputed from it on every call to [`GridState::window`].
#[derive(Debug)]
pub struct GridState<R> {
    name: String,
    columns: Vec<ColumnSpec>,
    records: Vec<R>,
    config: PipelineConfig,
    params: ViewParameters,
    search: Debounced<String>,
    selection: HashSet<RecordId>,
    derived: Vec<usize>,
    viewport: Viewport,
    scroll_top: u64,
    perf: PerfMonitor,
}

impl<R: Record> GridState<R> {
    pub fn new(dataset: Dataset<R>, viewport: Viewport, debounce: Duration) -> Self {
        let config = PipelineConfig {
            searchable_fields: dataset.searchable_fields(),
        };
        let mut state = Self {
            name: dataset.name,
            columns: dataset.columns,
            records: dataset.records,
            config,
            params: ViewParameters::default(),
            search: Debounced::new(String::new(), debounce),
            selection: HashSet::new(),
            derived: Vec::new(),
            viewport,
            scroll_top: 0,
            perf: PerfMonitor::new("grid"),
        };
        state.rebuild();
        state
    }

    pub fn dispatch(&mut self, command: GridCommand) -> Vec<GridEvent> {
        self.dispatch_at(command, Instant::now())
    }

    pub fn dispatch_at(&mut self, command: GridCommand, now: Instant) -> Vec<GridEvent> {
        match command {
            GridCommand::Search(text) => {
                self.search.set_value(text.clone(), now);
                vec![GridEvent::SearchEdited(text)]
            }
            GridCommand::FlushSearch => match self.search.flush().cloned() {
                Some(settled) => self.apply_settled_search(settled),
                None => Vec::new(),
            },
            GridCommand::ToggleSort(column) => self.toggle_sort(column),
            GridCommand::ClearSort => {
                if self.params.sort.take().is_none() {
                    return Vec::new();
                }
                let mut events = vec![GridEvent::SortChanged(None)];
                events.extend(self.rebuild());
                events
            }
            GridCommand::ToggleRow { id, checked } => {
                let changed = if checked {
                    self.selection.insert(id)
                } else {
                    self.selection.remove(&id)
                };
                if changed {
                    vec![self.selection_event()]
                } else {
                    Vec::new()
                }
            }
            GridCommand::ToggleAll(checked) => {
                if checked {
                    let records = &self.records;
                    let derived = &self.derived;
                    self.selection = self.perf.measure("select-all", SELECT_ALL_BUDGET, || {
                        derived.iter().map(|index| records[*index].id()).collect()
                    });
                } else {
                    self.selection.clear();
                }
                vec![self.selection_event()]
            }
            GridCommand::ClearSelection => {
                if self.selection.is_empty() {
                    return Vec::new();
                }
                self.selection.clear();
                vec![self.selection_event()]
            }
            GridCommand::SetFacet { field, value } => {
                let before = self.params.facets.clone();
                self.params.facets.retain(|facet| facet.field != field);
                if let Some(value) = value {
                    self.params.facets.push(FacetFilter { field, value });
                }
                if self.params.facets == before {
                    return Vec::new();
                }
                self.rebuild()
            }
            GridCommand::Scroll(scroll_top) => self.scroll_to(scroll_top),
            GridCommand::ScrollBy(delta) => {
                let target = if delta.is_negative() {
                    self.scroll_top.saturating_sub(delta.unsigned_abs())
                } else {
                    self.scroll_top.saturating_add(delta.unsigned_abs())
                };
                self.scroll_to(target)
            }
            GridCommand::Reveal(index) => {
                let target =
                    self.viewport
                        .scroll_to_reveal(self.derived.len(), self.scroll_top, index);
                self.scroll_to(target)
            }
            GridCommand::Resize(container_height) => {
                if self.viewport.container_height == container_height {
                    return Vec::new();
                }
                self.viewport.container_height = container_height;
                let mut events = vec![GridEvent::Resized(container_height)];
                events.extend(self.clamp_scroll());
                events
            }
        }
    }

    /// Commits a settled search once its quiet period has passed.
    pub fn tick(&mut self, now: Instant) -> Vec<GridEvent> {
        match self.search.poll(now).cloned() {
            Some(settled) => self.apply_settled_search(settled),
            None => Vec::new(),
        }
    }

    /// Drops any pending search commit; call when the view goes away.
    pub fn teardown(&mut self) {
        self.search.cancel();
    }

    pub fn replace_records(&mut self, records: Vec<R>) -> Vec<GridEvent> {
        self.records = records;
        self.rebuild()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn params(&self) -> &ViewParameters {
        &self.params
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.params.sort.as_ref()
    }

    pub fn facet(&self, field: &str) -> Option<&str> {
        self.params
            .facets
            .iter()
            .find(|facet| facet.field == field)
            .map(|facet| facet.value.as_str())
    }

    pub fn search_input(&self) -> &str {
        self.search.immediate()
    }

    pub fn settled_search(&self) -> &str {
        self.search.settled()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.search.next_deadline()
    }

    pub fn derived_len(&self) -> usize {
        self.derived.len()
    }

    pub fn derived_indices(&self) -> &[usize] {
        &self.derived
    }

    pub fn derived_records(&self) -> Vec<&R> {
        self.derived
            .iter()
            .map(|index| &self.records[*index])
            .collect()
    }

    /// Record at `position` in the derived sequence.
    pub fn record_at(&self, position: usize) -> Option<&R> {
        self.derived
            .get(position)
            .and_then(|index| self.records.get(*index))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    pub fn window(&self) -> ViewportWindow {
        compute_window(self.derived.len(), &self.viewport, self.scroll_top)
    }

    /// The rows to materialize, paired with their position in the derived
    /// sequence.
    pub fn visible_rows(&self) -> Vec<(usize, &R)> {
        let window = self.window();
        window
            .slice(&self.derived)
            .iter()
            .enumerate()
            .map(|(offset, index)| (window.start_index + offset, &self.records[*index]))
            .collect()
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selection.contains(id)
    }

    pub fn selection(&self) -> &HashSet<RecordId> {
        &self.selection
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Derived from current state on every call so a refilter can never leave
    /// a stale flag behind.
    pub fn is_all_selected(&self) -> bool {
        !self.derived.is_empty() && self.selection.len() == self.derived.len()
    }

    /// Stricter than [`Self::is_all_selected`]: every derived row must itself
    /// be in the selection, not just a selection of the same size.
    pub fn all_derived_selected(&self) -> bool {
        !self.derived.is_empty()
            && self
                .derived
                .iter()
                .all(|index| self.selection.contains(&self.records[*index].id()))
    }

    /// Selected records in source order, including ones filtered out of view.
    pub fn selected_records(&self) -> Vec<&R> {
        self.records
            .iter()
            .filter(|record| self.selection.contains(&record.id()))
            .collect()
    }

    pub fn perf(&self) -> &PerfMonitor {
        &self.perf
    }

    fn toggle_sort(&mut self, column: String) -> Vec<GridEvent> {
        if self.column(&column).is_some_and(|spec| !spec.sortable) {
            tracing::debug!(column = %column, "ignoring sort on unsortable column");
            return Vec::new();
        }
        let next = match self.params.sort.take() {
            Some(current) if current.column == column => SortSpec {
                direction: current.direction.flipped(),
                ..current
            },
            _ => SortSpec::asc(&column),
        };
        self.params.sort = Some(next.clone());
        let mut events = vec![GridEvent::SortChanged(Some(next))];
        events.extend(self.rebuild());
        events
    }

    fn apply_settled_search(&mut self, settled: String) -> Vec<GridEvent> {
        tracing::debug!(term = %settled, "search settled");
        self.params.search_term = settled.clone();
        let mut events = vec![GridEvent::SearchSettled(settled)];
        events.extend(self.rebuild());
        events
    }

    fn rebuild(&mut self) -> Vec<GridEvent> {
        let records = &self.records;
        let params = &self.params;
        let config = &self.config;
        let mut derived = self.perf.measure("filter", FILTER_BUDGET, || {
            filter_indices(records, params, config)
        });
        if let Some(sort) = &params.sort {
            self.perf.measure("sort", SORT_BUDGET, || {
                sort_indices(records, &mut derived, sort);
            });
        }
        self.derived = derived;

        let mut events = vec![GridEvent::SequenceRebuilt {
            len: self.derived.len(),
        }];
        events.extend(self.clamp_scroll());
        events
    }

    fn scroll_to(&mut self, scroll_top: u64) -> Vec<GridEvent> {
        let clamped = self
            .viewport
            .clamp_scroll_top(self.derived.len(), scroll_top);
        if clamped == self.scroll_top {
            return Vec::new();
        }
        self.scroll_top = clamped;
        vec![GridEvent::Scrolled(clamped)]
    }

    fn clamp_scroll(&mut self) -> Vec<GridEvent> {
        self.scroll_to(self.scroll_top)
    }

    fn selection_event(&self) -> GridEvent {
        GridEvent::SelectionChanged {
            selected: self.selection.len(),
        }
    }
}
