use crate::core::identifier::Identifier;
use crate::core::interval::{parse_range, TimeRange};
use crate::utils::error::{AllocError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Classroom name used for students that did not fit anywhere.
pub const UNALLOCATED: &str = "Unallocated";

/// Faculty cell value for a room nobody could be assigned to.
pub const NOT_ASSIGNED: &str = "Not Assigned";

/// In-memory table exchanged with the boundary adapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Column positions for `names`, or `MissingColumns` listing every absent one.
    pub fn require_columns(&self, table_name: &str, names: &[&str]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(AllocError::MissingColumns {
                table: table_name.to_string(),
                columns: missing,
            });
        }
        Ok(indices)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub name: String,
    pub capacity: u32,
}

impl Classroom {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRange {
    pub classroom: String,
    pub start_id: Identifier,
    pub end_id: Identifier,
    pub count: u64,
}

impl SeatRange {
    pub fn is_unallocated(&self) -> bool {
        self.classroom == UNALLOCATED
    }
}

/// One row of a faculty member's regular timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub faculty: String,
    pub day: String,
    pub time: String,
    /// `None` when `time` could not be parsed; such rows never block a duty.
    pub window: Option<TimeRange>,
}

impl BusyInterval {
    pub fn new(
        faculty: impl Into<String>,
        day: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        let time = time.into().trim().to_string();
        let window = parse_range(&time);
        Self {
            faculty: faculty.into(),
            day: day.into().trim().to_string(),
            time,
            window,
        }
    }
}

/// Faculty roster plus busy intervals grouped by `(faculty, day)`.
///
/// The roster keeps first-appearance order; the duty scheduler uses it as the
/// tie-break between eligible candidates.
#[derive(Debug, Clone, Default)]
pub struct FacultyTimetable {
    roster: Vec<String>,
    known: HashSet<String>,
    busy: HashMap<(String, String), Vec<BusyInterval>>,
}

impl FacultyTimetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_intervals(intervals: impl IntoIterator<Item = BusyInterval>) -> Self {
        let mut timetable = Self::new();
        for interval in intervals {
            timetable.push(interval);
        }
        timetable
    }

    /// Adds a faculty member without any busy interval.
    pub fn add_faculty(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.known.insert(name.clone()) {
            self.roster.push(name);
        }
    }

    pub fn push(&mut self, interval: BusyInterval) {
        self.add_faculty(interval.faculty.clone());
        self.busy
            .entry((interval.faculty.clone(), interval.day.clone()))
            .or_default()
            .push(interval);
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn busy_on(&self, faculty: &str, day: &str) -> &[BusyInterval] {
        self.busy
            .get(&(faculty.to_string(), day.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any busy interval on `day` overlaps `slot`.
    ///
    /// An unparseable slot or busy time counts as free.
    pub fn is_busy(&self, faculty: &str, day: &str, slot: Option<TimeRange>) -> bool {
        let Some(slot) = slot else {
            return false;
        };
        self.busy_on(faculty, day)
            .iter()
            .filter_map(|b| b.window)
            .any(|window| window.overlaps(&slot))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSlot {
    pub date: NaiveDate,
    pub day: String,
    pub time: String,
    pub subject: String,
}

impl ExamSlot {
    pub fn new(
        date: NaiveDate,
        day: impl Into<String>,
        time: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            date,
            day: day.into().trim().to_string(),
            time: time.into().trim().to_string(),
            subject: subject.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duty {
    Assigned(String),
    NotAssigned,
}

impl Duty {
    pub fn faculty(&self) -> Option<&str> {
        match self {
            Duty::Assigned(name) => Some(name),
            Duty::NotAssigned => None,
        }
    }
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duty::Assigned(name) => f.write_str(name),
            Duty::NotAssigned => f.write_str(NOT_ASSIGNED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyAssignment {
    pub date: NaiveDate,
    pub day: String,
    pub time: String,
    pub subject: String,
    pub classroom: String,
    pub duty: Duty,
}

/// Inputs of a seat allocation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequest {
    pub students: u64,
    pub start_usn: String,
    /// Classroom table (`Classroom`, `Capacity`).
    pub classrooms: String,
}

/// Inputs of a duty scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyRequest {
    pub exam_timetable: String,
    pub faculty_timetable: String,
    /// Seat allocation result to read classrooms from; defaults to the one
    /// the seat phase wrote under the output path.
    pub allocation: Option<String>,
}

/// What a pipeline's transform stage hands to its load stage.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: Table,
    /// File stem the table is saved under, e.g. `classroom_allocation`.
    pub artifact: String,
    /// Unplaced students (seating) or unfilled rooms (duties).
    pub shortfall: u64,
}
