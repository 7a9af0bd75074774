use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::schema::Table;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FkGraphSummary {
    pub nodes: usize,
    /// Distinct referencer/referenced pairs, self-references excluded.
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    /// Full names in emission order.
    pub order: Vec<String>,
    /// Tables emitted while they still had unsatisfied dependencies.
    pub cycle_breaks: Vec<String>,
    /// Tables with at least one foreign key onto themselves.
    pub self_references: Vec<String>,
}

impl FkGraphReport {
    pub fn has_cycle(&self) -> bool {
        !self.cycle_breaks.is_empty()
    }
}

/// Tables in emission order plus the report describing how it was reached.
#[derive(Debug, Clone)]
pub struct OrderedTables {
    pub tables: Vec<Table>,
    pub report: FkGraphReport,
}

/// Order tables so that referenced tables come before the tables referencing them.
///
/// The remaining table with the fewest unsatisfied dependencies is emitted
/// next, ties going to the smallest case-insensitive `(schema, name)`. On an
/// acyclic graph that is a smallest-first topological sort; inside a cycle it
/// picks a deterministic table to break it, so the result is always total.
/// Precedence is only guaranteed for tables outside cycles.
pub fn order_tables(mut tables: Vec<Table>) -> OrderedTables {
    tables.sort_by(|left, right| left.cmp_identity(right));

    let index: HashMap<(String, String), usize> = tables
        .iter()
        .enumerate()
        .map(|(idx, table)| (table.key(), idx))
        .collect();

    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut self_references = Vec::new();

    for (idx, table) in tables.iter().enumerate() {
        let mut references_self = false;
        for fk in table.columns.iter().filter_map(|column| column.foreign_key()) {
            match index.get(&fk.table_key()) {
                Some(&target) if target == idx => references_self = true,
                Some(&target) => {
                    edges.insert((target, idx));
                }
                None => {}
            }
        }
        if references_self {
            self_references.push(table.full_name());
        }
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];
    let mut unsatisfied: Vec<usize> = vec![0; tables.len()];
    for &(referenced, referencer) in &edges {
        dependents[referenced].push(referencer);
        unsatisfied[referencer] += 1;
    }

    let mut remaining: BTreeSet<(usize, usize)> = unsatisfied
        .iter()
        .enumerate()
        .map(|(idx, count)| (*count, idx))
        .collect();
    let mut emitted = vec![false; tables.len()];
    let mut order = Vec::with_capacity(tables.len());
    let mut cycle_breaks = Vec::new();

    while let Some((count, idx)) = remaining.pop_first() {
        if count > 0 {
            cycle_breaks.push(tables[idx].full_name());
        }
        emitted[idx] = true;
        order.push(idx);

        for &dependent in &dependents[idx] {
            if emitted[dependent] {
                continue;
            }
            remaining.remove(&(unsatisfied[dependent], dependent));
            unsatisfied[dependent] -= 1;
            remaining.insert((unsatisfied[dependent], dependent));
        }
    }

    let summary = FkGraphSummary {
        nodes: tables.len(),
        edges: edges.len(),
    };

    let mut slots: Vec<Option<Table>> = tables.into_iter().map(Some).collect();
    let tables: Vec<Table> = order
        .iter()
        .filter_map(|idx| slots[*idx].take())
        .collect();

    OrderedTables {
        report: FkGraphReport {
            summary,
            order: tables.iter().map(Table::full_name).collect(),
            cycle_breaks,
            self_references,
        },
        tables,
    }
}
