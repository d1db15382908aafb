//! Delimited-text codec for [`Table`] and the typed views of the four tables
//! the allocator reads and writes.

use crate::domain::model::{
    BusyInterval, Classroom, DutyAssignment, ExamSlot, FacultyTimetable, SeatRange, Table,
    UNALLOCATED,
};
use crate::utils::error::{AllocError, Result};
use chrono::{NaiveDate, NaiveDateTime};

pub mod columns {
    pub const CLASSROOM: &str = "Classroom";
    pub const CAPACITY: &str = "Capacity";
    pub const STARTING_USN: &str = "Starting USN";
    pub const ENDING_USN: &str = "Ending USN";
    pub const TOTAL_STUDENTS: &str = "Total Students";
    pub const DATE: &str = "Date";
    pub const DAY: &str = "Day";
    pub const TIME: &str = "Time";
    pub const SUBJECT: &str = "Subject";
    pub const FACULTY: &str = "Faculty";
}

/// Output rendering of exam dates.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

const DATE_INPUT_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl Table {
    pub fn from_delimited(bytes: &[u8], delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();
        let mut rows = Vec::new();

        for record in reader.records() {
            let record = record?;
            // 試算表匯出常帶空白列，直接略過
            if record.iter().all(str::is_empty) {
                continue;
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            // 欄位不足的列補空字串，讓索引一定取得到
            row.resize(width.max(row.len()), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        Self::from_delimited(bytes, b',')
    }

    /// Picks the delimiter from the file extension (`.tsv` is tab, anything else comma).
    pub fn from_path_bytes(path: &str, bytes: &[u8]) -> Result<Self> {
        if path.to_ascii_lowercase().ends_with(".tsv") {
            Self::from_delimited(bytes, b'\t')
        } else {
            Self::from_csv(bytes)
        }
    }

    pub fn to_delimited(&self, delimiter: u8) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| AllocError::IoError(e.into_error()))
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        self.to_delimited(b',')
    }

    pub fn to_tsv(&self) -> Result<Vec<u8>> {
        self.to_delimited(b'\t')
    }

    /// Array of `{header: cell}` objects.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, cell)| (h.clone(), serde_json::Value::String(cell.clone())))
                    .collect()
            })
            .collect();
        Ok(serde_json::to_vec_pretty(&records)?)
    }

    pub fn encode(&self, format: &str) -> Result<Vec<u8>> {
        match format {
            "csv" => self.to_csv(),
            "tsv" => self.to_tsv(),
            "json" => self.to_json(),
            other => Err(AllocError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported format".to_string(),
            }),
        }
    }
}

fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Whole non-negative number; spreadsheet exports like `30.0` are accepted.
fn parse_capacity(text: &str, line: usize) -> Result<u32> {
    if let Ok(value) = text.parse::<u32>() {
        return Ok(value);
    }
    match text.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) => {
            Ok(value as u32)
        }
        _ => Err(AllocError::invalid_format(
            format!("{} (row {})", columns::CAPACITY, line),
            text,
            "expected a non-negative whole number",
        )),
    }
}

/// Accepts ISO dates, `DD-MM-YYYY`, `DD/MM/YYYY` and spreadsheet datetime exports.
pub fn parse_exam_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_INPUT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| AllocError::invalid_format(columns::DATE, text, "unrecognised date"))
}

pub fn decode_classrooms(table: &Table) -> Result<Vec<Classroom>> {
    let idx = table.require_columns("classroom table", &[columns::CLASSROOM, columns::CAPACITY])?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            // 行號從 2 起算 (第 1 行是標題)
            let capacity = parse_capacity(cell(row, idx[1]), i + 2)?;
            Ok(Classroom::new(cell(row, idx[0]), capacity))
        })
        .collect()
}

pub fn decode_exam_slots(table: &Table) -> Result<Vec<ExamSlot>> {
    let idx = table.require_columns(
        "exam timetable",
        &[columns::DATE, columns::DAY, columns::TIME, columns::SUBJECT],
    )?;

    table
        .rows
        .iter()
        .map(|row| {
            Ok(ExamSlot::new(
                parse_exam_date(cell(row, idx[0]))?,
                cell(row, idx[1]),
                cell(row, idx[2]),
                cell(row, idx[3]),
            ))
        })
        .collect()
}

pub fn decode_faculty_timetable(table: &Table) -> Result<FacultyTimetable> {
    let idx = table.require_columns(
        "faculty timetable",
        &[columns::FACULTY, columns::DAY, columns::TIME],
    )?;

    let mut timetable = FacultyTimetable::new();
    for (i, row) in table.rows.iter().enumerate() {
        let faculty = cell(row, idx[0]);
        if faculty.is_empty() {
            tracing::warn!("Faculty timetable row {} has no faculty name, skipped", i + 2);
            continue;
        }

        let interval = BusyInterval::new(faculty, cell(row, idx[1]), cell(row, idx[2]));
        if interval.window.is_none() {
            tracing::warn!(
                "Busy time '{}' for {} on {} is unparseable; treated as free",
                interval.time,
                interval.faculty,
                interval.day
            );
        }
        timetable.push(interval);
    }
    Ok(timetable)
}

/// Classroom names from a seat allocation result, `Unallocated` excluded.
pub fn decode_allocated_classrooms(table: &Table) -> Result<Vec<String>> {
    let idx = table.require_columns("classroom allocation", &[columns::CLASSROOM])?;

    Ok(table
        .rows
        .iter()
        .map(|row| cell(row, idx[0]))
        .filter(|name| !name.is_empty() && *name != UNALLOCATED)
        .map(str::to_string)
        .collect())
}

pub fn encode_seat_ranges(ranges: &[SeatRange]) -> Table {
    let mut table = Table::new(&[
        columns::CLASSROOM,
        columns::STARTING_USN,
        columns::ENDING_USN,
        columns::TOTAL_STUDENTS,
    ]);
    for range in ranges {
        table.push_row(vec![
            range.classroom.clone(),
            range.start_id.to_string(),
            range.end_id.to_string(),
            range.count.to_string(),
        ]);
    }
    table
}

pub fn encode_duty_assignments(assignments: &[DutyAssignment]) -> Table {
    let mut table = Table::new(&[
        columns::DATE,
        columns::DAY,
        columns::TIME,
        columns::SUBJECT,
        columns::CLASSROOM,
        columns::FACULTY,
    ]);
    for a in assignments {
        table.push_row(vec![
            a.date.format(DATE_FORMAT).to_string(),
            a.day.clone(),
            a.time.clone(),
            a.subject.clone(),
            a.classroom.clone(),
            a.duty.to_string(),
        ]);
    }
    table
}
