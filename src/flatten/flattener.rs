use crate::flatten::table::Table;
use crate::flatten::types::{
    CellKind, EmptyListPolicy, EmptyObjectPolicy, FlattenConfig, RecordBatch,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::trace;

/// Turns a batch of nested records into a single flat table
///
/// Nested objects become dotted columns (`f.g`), nested lists become
/// additional rows. The work runs as a fixed-point iteration: each pass
/// classifies only the columns the previous pass produced, expands the
/// uniformly-object ones, then explodes the uniformly-list ones.
pub struct Flattener {
    config: FlattenConfig,
}

/// Columns selected for one pass, in table order
#[derive(Debug, Default)]
struct PassPlan {
    objects: Vec<String>,
    lists: Vec<String>,
}

impl PassPlan {
    fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.lists.is_empty()
    }
}

impl Flattener {
    pub fn new(config: FlattenConfig) -> Self {
        Flattener { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Flatten a record batch; never fails
    pub fn flatten(&self, batch: RecordBatch) -> Table {
        self.flatten_table(Table::from_records(batch))
    }

    /// Flatten an already materialized table
    pub fn flatten_table(&self, mut table: Table) -> Table {
        let mut working: Vec<String> = table.columns().to_vec();
        let mut pass = 0usize;

        loop {
            let plan = self.plan_pass(&table, &working);
            if plan.is_empty() {
                break;
            }
            pass += 1;

            let mut touched: Vec<String> = Vec::new();
            for column in &plan.objects {
                if self.column_kind(&table, column) == Some(CellKind::Object) {
                    touched.extend(self.expand_object_column(&mut table, column));
                }
            }
            for column in &plan.lists {
                if self.column_kind(&table, column) == Some(CellKind::List) {
                    self.explode_list_column(&mut table, column);
                    touched.push(column.clone());
                }
            }

            trace!(
                pass,
                expanded = plan.objects.len(),
                exploded = plan.lists.len(),
                rows = table.num_rows(),
                columns = table.num_columns(),
                "flatten pass"
            );

            let mut seen = std::collections::HashSet::new();
            touched.retain(|c| table.contains_column(c) && seen.insert(c.clone()));
            working = touched;
        }

        table
    }

    /// Classify the working set against the current table
    fn plan_pass(&self, table: &Table, working: &[String]) -> PassPlan {
        let mut plan = PassPlan::default();
        for column in table.columns() {
            if !working.contains(column) {
                continue;
            }
            match self.column_kind(table, column) {
                Some(CellKind::Object) => plan.objects.push(column.clone()),
                Some(CellKind::List) => plan.lists.push(column.clone()),
                _ => {}
            }
        }
        plan
    }

    /// The kind shared by every cell of a column, if it is uniformly
    /// object or uniformly list
    ///
    /// Nulls count as a different kind, so a column mixing objects and
    /// missing values is left alone. A table without rows has no
    /// uniform columns.
    fn column_kind(&self, table: &Table, column: &str) -> Option<CellKind> {
        if table.is_empty() || self.config.is_scalar_field(column) {
            return None;
        }
        let mut cells = table.column(column)?;
        let first = CellKind::of(cells.next()?);
        if !matches!(first, CellKind::Object | CellKind::List) {
            return None;
        }
        cells.all(|v| CellKind::of(v) == first).then_some(first)
    }

    /// Replace an object column with one column per leaf path
    ///
    /// Each cell is flattened on its own down to non-object values, so a
    /// sub-object that is null in some rows still yields its leaf columns
    /// next to a `c.k` column holding the nulls. Empty sub-objects leave
    /// nothing; lists stay as values for a later pass to explode.
    /// Returns the names of the columns created.
    fn expand_object_column(&self, table: &mut Table, column: &str) -> Vec<String> {
        let Some(cells) = table.remove_column(column) else {
            return vec![];
        };
        let num_rows = cells.len();

        let mut keys: Vec<String> = Vec::new();
        let mut key_positions: HashMap<String, usize> = HashMap::new();
        let mut expanded: Vec<Vec<Value>> = Vec::new();

        for (row, cell) in cells.into_iter().enumerate() {
            let Value::Object(inner) = cell else {
                continue;
            };
            let mut leaves = Vec::new();
            self.collect_leaves(None, inner, &mut leaves);
            for (key, value) in leaves {
                let pos = *key_positions.entry(key.clone()).or_insert_with(|| {
                    keys.push(key);
                    expanded.push(vec![Value::Null; num_rows]);
                    expanded.len() - 1
                });
                expanded[pos][row] = value;
            }
        }

        if keys.is_empty() {
            if self.config.empty_objects == EmptyObjectPolicy::KeepNull {
                table.push_column(column.to_string(), vec![Value::Null; num_rows]);
            }
            return vec![];
        }

        let mut created = Vec::with_capacity(keys.len());
        for (key, values) in keys.into_iter().zip(expanded) {
            let name = format!("{}{}{}", column, self.config.separator, key);
            table.push_column(name.clone(), values);
            created.push(name);
        }
        created
    }

    /// Flatten one object into `(path, value)` pairs, depth first
    fn collect_leaves(
        &self,
        prefix: Option<&str>,
        object: Map<String, Value>,
        leaves: &mut Vec<(String, Value)>,
    ) {
        for (key, value) in object {
            let path = match prefix {
                Some(p) => format!("{}{}{}", p, self.config.separator, key),
                None => key,
            };
            match value {
                Value::Object(inner) => self.collect_leaves(Some(&path), inner, leaves),
                other => leaves.push((path, other)),
            }
        }
    }

    /// Replace each row with one row per element of its list cell
    ///
    /// The exploded column moves to the end of the column order.
    fn explode_list_column(&self, table: &mut Table, column: &str) {
        let Some(idx) = table.column_index(column) else {
            return;
        };
        let rows = table.take_rows();
        let mut out = Vec::with_capacity(rows.len());

        for mut row in rows {
            let items = match std::mem::take(&mut row[idx]) {
                Value::Array(items) => items,
                other => {
                    row[idx] = other;
                    out.push(row);
                    continue;
                }
            };

            if items.is_empty() {
                if self.config.empty_lists == EmptyListPolicy::KeepNull {
                    out.push(row);
                }
                continue;
            }

            let mut items = items.into_iter().peekable();
            while let Some(item) = items.next() {
                if items.peek().is_some() {
                    let mut copy = row.clone();
                    copy[idx] = item;
                    out.push(copy);
                } else {
                    row[idx] = item;
                    out.push(row);
                    break;
                }
            }
        }

        table.set_rows(out);
        table.move_column_to_end(idx);
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Flattener::new(FlattenConfig::default())
    }
}

/// Flatten a batch with the default configuration
pub fn flatten(batch: RecordBatch) -> Table {
    Flattener::default().flatten(batch)
}
