//! Row-span planning: a per-column run-length state machine.
//!
//! Each table column carries an ordered list of span instructions; each
//! instruction is either a positive integer (as text) or the literal
//! `"all"`. Walking the rows top to bottom, the planner decides for every
//! (column, row) whether a fresh cell is emitted and how many physical
//! rows it covers, or whether the row is still covered by a span issued
//! above it.
//!
//! Invariant: over a full pass the emitted spans of one column sum to
//! exactly the row count; no row is covered twice or left unassigned.

use std::collections::VecDeque;

/// Decision for one (column, row) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanDecision {
    /// The slot is covered by a span emitted on an earlier row; skip it.
    Covered,
    /// Emit a fresh cell spanning this many rows (at least 1).
    Emit(usize),
}

/// Mutable per-column span state. Allocate one per column at the start of
/// a table pass and discard it at the end; sharing an instance across
/// passes corrupts the span accounting.
#[derive(Debug, Clone)]
pub struct SpanPlanner {
    instructions: VecDeque<String>,
    remaining: usize,
}

impl SpanPlanner {
    pub fn new(instructions: &[String]) -> Self {
        Self {
            instructions: instructions.iter().cloned().collect(),
            remaining: 0,
        }
    }

    /// Advance the state machine by one row.
    ///
    /// `total_rows` is the table's row count, `row` the zero-based index
    /// of the row being bound. An instruction is consumed when its span is
    /// issued; a malformed instruction issues a span of 1 and is dropped.
    pub fn next(&mut self, total_rows: usize, row: usize) -> SpanDecision {
        if self.remaining > 0 {
            self.remaining -= 1;
            return SpanDecision::Covered;
        }

        let span = self.head_span(total_rows, row);
        self.instructions.pop_front();
        if span > 1 {
            self.remaining = span - 1;
        }
        SpanDecision::Emit(span)
    }

    /// Effective span of the head instruction, computed before popping.
    fn head_span(&self, total_rows: usize, row: usize) -> usize {
        let Some(head) = self.instructions.front() else {
            return 1;
        };
        let head = head.trim();

        if let Ok(n) = head.parse::<usize>() {
            if n > 0 {
                // Never overrun the bottom of the table.
                return n.min(total_rows - row);
            }
            return 1;
        }

        if head.eq_ignore_ascii_case("all") {
            // Reserve room for the integer instructions still queued
            // after this one.
            let reserved: usize = self
                .instructions
                .iter()
                .skip(1)
                .filter_map(|s| s.trim().parse::<usize>().ok())
                .sum();
            return (total_rows - row).saturating_sub(reserved).max(1);
        }

        1
    }
}
