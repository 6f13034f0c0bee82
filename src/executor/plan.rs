//! Evaluation plans for stratadb
//!
//! A plan is a small tree of relational operators evaluated against
//! one heap table:
//!
//! - `TableScan` yields every handle in the relation
//! - `Select` keeps the handles whose row matches a conjunction of
//!   column = literal equalities
//! - `Project` / `ProjectAll` turn handles into rows
//!
//! Plans terminate in one of two forms: `pipeline` produces the
//! surviving handles (DELETE), `evaluate` produces projected rows
//! (SELECT).

use crate::error::Result;
use crate::storage::{Handle, HeapTable, Identifier, Row};

/// A node in an evaluation plan
#[derive(Debug, Clone)]
pub enum EvalPlan {
    /// Scan every handle in the relation
    TableScan,
    /// Keep handles whose row equals the predicate on every key
    Select {
        predicate: Row,
        input: Box<EvalPlan>,
    },
    /// Project each handle onto the requested columns
    Project {
        columns: Vec<Identifier>,
        input: Box<EvalPlan>,
    },
    /// Project each handle onto all of the relation's columns
    ProjectAll { input: Box<EvalPlan> },
}

impl EvalPlan {
    /// Wrap this plan in a selection
    pub fn select(self, predicate: Row) -> EvalPlan {
        EvalPlan::Select {
            predicate,
            input: Box::new(self),
        }
    }

    /// Wrap this plan in a projection
    pub fn project(self, columns: Vec<Identifier>) -> EvalPlan {
        EvalPlan::Project {
            columns,
            input: Box::new(self),
        }
    }

    /// Wrap this plan in a project-everything node
    pub fn project_all(self) -> EvalPlan {
        EvalPlan::ProjectAll {
            input: Box::new(self),
        }
    }

    /// Rewrite the plan so selections sit directly above the scan.
    ///
    /// The single rule: `Select(pred, Project(cols, p))` becomes
    /// `Project(cols, Select(pred, p))`. This is semantics-preserving
    /// because the predicate only references columns of the underlying
    /// relation, never projection output.
    pub fn optimize(self) -> EvalPlan {
        match self {
            EvalPlan::Select { predicate, input } => match *input {
                EvalPlan::Project { columns, input } => EvalPlan::Project {
                    columns,
                    input: Box::new(
                        EvalPlan::Select {
                            predicate,
                            input,
                        }
                        .optimize(),
                    ),
                },
                EvalPlan::ProjectAll { input } => EvalPlan::ProjectAll {
                    input: Box::new(
                        EvalPlan::Select {
                            predicate,
                            input,
                        }
                        .optimize(),
                    ),
                },
                other => EvalPlan::Select {
                    predicate,
                    input: Box::new(other.optimize()),
                },
            },
            EvalPlan::Project { columns, input } => EvalPlan::Project {
                columns,
                input: Box::new(input.optimize()),
            },
            EvalPlan::ProjectAll { input } => EvalPlan::ProjectAll {
                input: Box::new(input.optimize()),
            },
            EvalPlan::TableScan => EvalPlan::TableScan,
        }
    }

    /// Evaluate down to the surviving handles
    pub fn pipeline(&self, relation: &mut HeapTable) -> Result<Vec<Handle>> {
        match self {
            EvalPlan::TableScan => relation.select(),
            EvalPlan::Select { predicate, input } => {
                let mut kept = Vec::new();
                for handle in input.pipeline(relation)? {
                    let row = relation.project(handle)?;
                    if row_matches(&row, predicate) {
                        kept.push(handle);
                    }
                }
                Ok(kept)
            }
            // Projection does not change which handles survive.
            EvalPlan::Project { input, .. } | EvalPlan::ProjectAll { input } => {
                input.pipeline(relation)
            }
        }
    }

    /// Evaluate down to projected rows
    pub fn evaluate(&self, relation: &mut HeapTable) -> Result<Vec<Row>> {
        match self {
            EvalPlan::Project { columns, input } => input
                .pipeline(relation)?
                .into_iter()
                .map(|h| relation.project_columns(h, columns))
                .collect(),
            _ => self
                .pipeline(relation)?
                .into_iter()
                .map(|h| relation.project(h))
                .collect(),
        }
    }
}

/// True when the row equals the predicate on every predicate key.
/// Equality is per value variant; a missing key fails the row.
fn row_matches(row: &Row, predicate: &Row) -> bool {
    predicate
        .iter()
        .all(|(column, value)| row.get(column) == Some(value))
}

/// Handles of the relation's rows matching a conjunction of
/// column = literal equalities
pub fn select_handles(relation: &mut HeapTable, predicate: &Row) -> Result<Vec<Handle>> {
    EvalPlan::TableScan
        .select(predicate.clone())
        .optimize()
        .pipeline(relation)
}
