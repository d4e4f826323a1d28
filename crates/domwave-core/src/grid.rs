#![forbid(unsafe_code)]

//! Grid mutation applier.
//!
//! A grid is a container element holding one row node per row index, each
//! holding one cell node per column index. [`GridApplier::apply`] walks a
//! batch strictly in order and turns every record into its own DOM calls:
//!
//! - **Insert** appends the fragment to the row, creating the row node on
//!   first use. New rows always go to the end of the container, whatever
//!   their numeric index.
//! - **Update** inserts the fragment right after the old cell and only then
//!   detaches the old cell.
//! - **Remove** detaches the cell. Rows are never pruned.
//!
//! Missing cells are silent no-ops. There is no rollback: when a host call
//! fails, earlier records stay applied and the error names the failing one.
//!
//! # Index
//!
//! [`GridIndex`] maps (row, column) to node handles so records resolve
//! without building selector strings. It is bound to one container and
//! rebuilt from the class tokens in the live tree whenever the container
//! changes or an indexed node turns out to have been detached behind the
//! applier's back. A rebuild resolves duplicates to the first node in
//! document order, the same node a class selector would find.
//!
//! A row's cells are always read from its live children the same way: an
//! element with a column class token takes that slot, and an element without
//! one takes the slot of its position among the row's elements when no token
//! claimed it. After every record the touched row is read again, so a cached
//! index never disagrees with one rebuilt from scratch. A row node added to
//! the container outside the applier is adopted on first use instead of
//! getting a duplicate.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::addressing::{class_token, find_index};
use crate::config::{ConfigError, GridConfig};
use crate::host::{GridHost, HostError, InsertPosition};
#[cfg(feature = "tracing")]
use crate::logging::{debug, trace, warn};
use crate::mutation::GridMutation;
use crate::wire::{WireError, decode_batch};
#[cfg(not(feature = "tracing"))]
use crate::{debug, trace, warn};

/// Failure applying a batch.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid container not found: {selector:?}")]
    ContainerNotFound { selector: String },
    #[error("grid mutation #{index} ({kind}) failed: {source}")]
    Host {
        index: usize,
        kind: &'static str,
        #[source]
        source: HostError,
    },
    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Debug, Clone)]
struct RowEntry<N> {
    node: N,
    cells: BTreeMap<u32, N>,
}

/// Owned (row, column) → node map for one container.
#[derive(Debug, Clone)]
pub struct GridIndex<N> {
    container: Option<N>,
    rows: BTreeMap<u32, RowEntry<N>>,
    rebuilds: u64,
}

impl<N> Default for GridIndex<N> {
    fn default() -> Self {
        Self {
            container: None,
            rows: BTreeMap::new(),
            rebuilds: 0,
        }
    }
}

impl<N: Clone + PartialEq> GridIndex<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Container the index currently describes.
    #[must_use]
    pub fn container(&self) -> Option<&N> {
        self.container.as_ref()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|row| row.cells.len()).sum()
    }

    #[must_use]
    pub fn row_node(&self, row: u32) -> Option<&N> {
        self.rows.get(&row).map(|entry| &entry.node)
    }

    #[must_use]
    pub fn cell_node(&self, row: u32, column: u32) -> Option<&N> {
        self.rows.get(&row)?.cells.get(&column)
    }

    /// Number of times the index was rebuilt from the live tree.
    #[must_use]
    pub const fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Forget everything, including the bound container.
    pub fn clear(&mut self) {
        self.container = None;
        self.rows.clear();
    }

    /// Bind to `container`, rebuilding when it differs from the current one.
    pub fn bind<H>(&mut self, host: &H, container: N, config: &GridConfig)
    where
        H: GridHost<Node = N>,
    {
        if self.container.as_ref() != Some(&container) {
            self.container = Some(container);
            self.rebuild(host, config);
        }
    }

    /// Re-read rows and cells from the bound container's children.
    pub fn rebuild<H>(&mut self, host: &H, config: &GridConfig)
    where
        H: GridHost<Node = N>,
    {
        self.rows.clear();
        self.rebuilds += 1;
        let Some(container) = self.container.clone() else {
            return;
        };
        for child in host.children(&container) {
            let classes = host.class_names(&child);
            let Some(row) = find_index(
                &config.row_class_prefix,
                classes.iter().map(String::as_str),
            ) else {
                continue;
            };
            if self.rows.contains_key(&row) {
                continue;
            }
            let cells = scan_cells(host, &child, config);
            self.rows.insert(row, RowEntry { node: child, cells });
        }
        trace!(
            rows = self.rows.len(),
            cells = self.cell_count(),
            "grid index rebuilt"
        );
    }

    /// Row node for `row` if it is still attached to the container.
    ///
    /// A row the index does not know is looked up among the container's
    /// children before giving up.
    fn live_row<H>(&mut self, host: &H, row: u32, config: &GridConfig) -> Option<N>
    where
        H: GridHost<Node = N>,
    {
        let Some(entry) = self.rows.get(&row) else {
            return self.adopt_row(host, row, config);
        };
        if host.parent(&entry.node).as_ref() == self.container.as_ref() {
            return Some(entry.node.clone());
        }
        warn!(row, "indexed row node was detached externally; rebuilding");
        self.rebuild(host, config);
        self.rows.get(&row).map(|entry| entry.node.clone())
    }

    /// Index the first container child carrying the `row` token, if any.
    fn adopt_row<H>(&mut self, host: &H, row: u32, config: &GridConfig) -> Option<N>
    where
        H: GridHost<Node = N>,
    {
        let container = self.container.clone()?;
        let node = host.children(&container).into_iter().find(|child| {
            let classes = host.class_names(child);
            find_index(
                &config.row_class_prefix,
                classes.iter().map(String::as_str),
            ) == Some(row)
        })?;
        debug!(row, "adopting row node added outside the applier");
        let cells = scan_cells(host, &node, config);
        self.rows.insert(
            row,
            RowEntry {
                node: node.clone(),
                cells,
            },
        );
        Some(node)
    }

    /// Cell node for (`row`, `column`) if it is still attached to its row.
    fn live_cell<H>(&mut self, host: &H, row: u32, column: u32, config: &GridConfig) -> Option<N>
    where
        H: GridHost<Node = N>,
    {
        let row_node = self.live_row(host, row, config)?;
        let Some(cell) = self.cell_node(row, column).cloned() else {
            // Cells may have been added to the row behind the index's back.
            self.reindex_row(host, row, config);
            return self.cell_node(row, column).cloned();
        };
        if host.parent(&cell).as_ref() == Some(&row_node) {
            return Some(cell);
        }
        warn!(row, column, "indexed cell node was detached externally; rebuilding");
        self.rebuild(host, config);
        self.cell_node(row, column).cloned()
    }

    fn insert_row(&mut self, row: u32, node: N) {
        self.rows.insert(
            row,
            RowEntry {
                node,
                cells: BTreeMap::new(),
            },
        );
    }

    /// Re-read one row's cells from its live children.
    fn reindex_row<H>(&mut self, host: &H, row: u32, config: &GridConfig)
    where
        H: GridHost<Node = N>,
    {
        if let Some(entry) = self.rows.get_mut(&row) {
            entry.cells = scan_cells(host, &entry.node, config);
        }
    }

    fn is_indexed(&self, row: u32, node: &N) -> bool {
        self.rows
            .get(&row)
            .is_some_and(|entry| entry.cells.values().any(|cell| cell == node))
    }
}

/// Cells of `row_node` by column.
///
/// Column tokens claim their slots first, the first node in document order
/// winning. Elements without a token then take the slot of their position
/// among the row's elements when it is still vacant.
fn scan_cells<H>(host: &H, row_node: &H::Node, config: &GridConfig) -> BTreeMap<u32, H::Node>
where
    H: GridHost,
{
    let mut cells = BTreeMap::new();
    let mut untokened = Vec::new();
    for (position, cell) in host.children(row_node).into_iter().enumerate() {
        let classes = host.class_names(&cell);
        match find_index(
            &config.column_class_prefix,
            classes.iter().map(String::as_str),
        ) {
            Some(column) => {
                cells.entry(column).or_insert(cell);
            }
            None => untokened.push((position, cell)),
        }
    }
    for (position, cell) in untokened {
        if let Ok(column) = u32::try_from(position) {
            cells.entry(column).or_insert(cell);
        }
    }
    cells
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ApplyTally {
    inserted: usize,
    updated: usize,
    removed: usize,
    skipped: usize,
}

/// Applies grid batches to a container, caching the node index across calls.
#[derive(Debug, Clone)]
pub struct GridApplier<N> {
    config: GridConfig,
    index: GridIndex<N>,
}

impl<N> Default for GridApplier<N> {
    fn default() -> Self {
        Self {
            config: GridConfig::default(),
            index: GridIndex::default(),
        }
    }
}

impl<N: Clone + PartialEq> GridApplier<N> {
    /// Create an applier after validating `config`.
    pub fn new(config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            index: GridIndex::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub const fn index(&self) -> &GridIndex<N> {
        &self.index
    }

    /// Drop the cached index; the next batch rebuilds it from the tree.
    pub fn reset(&mut self) {
        self.index.clear();
    }

    /// Decode a JSON batch and apply it.
    ///
    /// Nothing is applied when the JSON is malformed.
    pub fn apply_json<H>(
        &mut self,
        host: &mut H,
        container_selector: &str,
        batch_json: &str,
    ) -> Result<(), GridError>
    where
        H: GridHost<Node = N>,
    {
        let mutations = decode_batch(batch_json)?;
        self.apply(host, container_selector, &mutations)
    }

    /// Apply `mutations` in order to the container `container_selector`
    /// resolves to.
    ///
    /// Fails with [`GridError::ContainerNotFound`] before touching anything
    /// when the selector matches no element.
    pub fn apply<H>(
        &mut self,
        host: &mut H,
        container_selector: &str,
        mutations: &[GridMutation],
    ) -> Result<(), GridError>
    where
        H: GridHost<Node = N>,
    {
        let container =
            host.resolve(container_selector)
                .ok_or_else(|| GridError::ContainerNotFound {
                    selector: container_selector.to_owned(),
                })?;
        self.index.bind(host, container.clone(), &self.config);

        let mut tally = ApplyTally::default();
        for (index, mutation) in mutations.iter().enumerate() {
            trace!(
                index,
                kind = mutation.kind(),
                row = mutation.row(),
                column = ?mutation.column(),
                "applying grid mutation"
            );
            self.apply_one(host, &container, mutation, &mut tally)
                .map_err(|source| GridError::Host {
                    index,
                    kind: mutation.kind(),
                    source,
                })?;
        }
        debug!(
            container = container_selector,
            inserted = tally.inserted,
            updated = tally.updated,
            removed = tally.removed,
            skipped = tally.skipped,
            "grid batch applied"
        );
        Ok(())
    }

    fn apply_one<H>(
        &mut self,
        host: &mut H,
        container: &N,
        mutation: &GridMutation,
        tally: &mut ApplyTally,
    ) -> Result<(), HostError>
    where
        H: GridHost<Node = N>,
    {
        match mutation {
            GridMutation::Insert { row, markup } => {
                self.insert(host, container, *row, markup)?;
                tally.inserted += 1;
            }
            GridMutation::Update {
                row,
                column,
                markup,
            } => {
                if self.update(host, *row, *column, markup)? {
                    tally.updated += 1;
                } else {
                    tally.skipped += 1;
                }
            }
            GridMutation::Remove { row, column } => {
                if self.remove(host, *row, *column)? {
                    tally.removed += 1;
                } else {
                    tally.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn insert<H>(
        &mut self,
        host: &mut H,
        container: &N,
        row: u32,
        markup: &str,
    ) -> Result<(), HostError>
    where
        H: GridHost<Node = N>,
    {
        let row_node = match self.index.live_row(host, row, &self.config) {
            Some(node) => node,
            None => {
                let class = class_token(&self.config.row_class_prefix, row);
                let node = host.create_element(&self.config.row_tag, &class)?;
                host.append_child(container, &node)?;
                self.index.insert_row(row, node.clone());
                node
            }
        };
        let created = host.insert_markup(&row_node, InsertPosition::BeforeEnd, markup)?;
        self.index.reindex_row(host, row, &self.config);
        self.warn_unindexed(row, &created);
        Ok(())
    }

    fn update<H>(
        &mut self,
        host: &mut H,
        row: u32,
        column: u32,
        markup: &str,
    ) -> Result<bool, HostError>
    where
        H: GridHost<Node = N>,
    {
        let Some(old) = self.index.live_cell(host, row, column, &self.config) else {
            trace!(row, column, "update target missing; skipped");
            return Ok(false);
        };
        let created = host.insert_markup(&old, InsertPosition::AfterEnd, markup)?;
        host.detach(&old)?;
        self.index.reindex_row(host, row, &self.config);
        self.warn_unindexed(row, &created);
        Ok(true)
    }

    fn remove<H>(&mut self, host: &mut H, row: u32, column: u32) -> Result<bool, HostError>
    where
        H: GridHost<Node = N>,
    {
        let Some(old) = self.index.live_cell(host, row, column, &self.config) else {
            trace!(row, column, "remove target missing; skipped");
            return Ok(false);
        };
        host.detach(&old)?;
        self.index.reindex_row(host, row, &self.config);
        Ok(true)
    }

    /// Log every freshly inserted element that lost its slot to an earlier
    /// node.
    fn warn_unindexed(&self, row: u32, created: &[N]) {
        let unindexed = created
            .iter()
            .filter(|node| !self.index.is_indexed(row, node))
            .count();
        if unindexed > 0 {
            warn!(
                row,
                unindexed, "cell already present; inserted node left unindexed"
            );
        }
    }
}

/// Apply `mutations` with the default [`GridConfig`] and a fresh index.
pub fn apply_batch<H>(
    host: &mut H,
    container_selector: &str,
    mutations: &[GridMutation],
) -> Result<(), GridError>
where
    H: GridHost,
{
    GridApplier::default().apply(host, container_selector, mutations)
}
