//! Invigilation duty scheduling.
//!
//! Every (exam slot, classroom) pair gets one faculty member, chosen greedily
//! from the roster. A candidate is skipped when they are busy at an
//! overlapping time that day, have reached the duty quota, or are already
//! invigilating at that date and time.
//!
//! All counters live inside a single [`DutyScheduler::schedule`] call, so one
//! scheduler can serve any number of runs.

use crate::core::interval::parse_range;
use crate::domain::model::{Duty, DutyAssignment, ExamSlot, FacultyTimetable, UNALLOCATED};
use crate::utils::error::AllocError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_DUTIES: u32 = 3;

/// How to pick among several eligible faculty members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// First eligible member in roster order.
    #[default]
    RosterOrder,
    /// Fewest duties so far; roster order breaks ties.
    LeastLoaded,
}

impl FromStr for SelectionPolicy {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "roster-order" => Ok(Self::RosterOrder),
            "least-loaded" => Ok(Self::LeastLoaded),
            other => Err(AllocError::InvalidConfigValueError {
                field: "selection".to_string(),
                value: other.to_string(),
                reason: "expected roster-order or least-loaded".to_string(),
            }),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RosterOrder => f.write_str("roster-order"),
            Self::LeastLoaded => f.write_str("least-loaded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyPolicy {
    /// Maximum duties one faculty member receives in a run.
    pub max_duties: u32,
    pub selection: SelectionPolicy,
}

impl Default for DutyPolicy {
    fn default() -> Self {
        Self {
            max_duties: DEFAULT_MAX_DUTIES,
            selection: SelectionPolicy::RosterOrder,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DutySchedule {
    pub assignments: Vec<DutyAssignment>,
    /// Duties per faculty member, in roster order.
    pub duty_counts: Vec<(String, u32)>,
}

impl DutySchedule {
    /// Rows that ended up without a faculty member.
    pub fn unassigned(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.duty == Duty::NotAssigned)
            .count()
    }
}

#[derive(Default)]
struct RunState<'a> {
    counts: HashMap<&'a str, u32>,
    committed: HashSet<(&'a str, NaiveDate, &'a str)>,
}

#[derive(Debug, Clone, Default)]
pub struct DutyScheduler {
    policy: DutyPolicy,
}

impl DutyScheduler {
    pub fn new(policy: DutyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DutyPolicy {
        self.policy
    }

    /// One row per slot and classroom: slots in input order outside,
    /// classrooms in input order inside. `Unallocated` rooms are ignored.
    pub fn schedule(
        &self,
        classrooms: &[String],
        slots: &[ExamSlot],
        timetable: &FacultyTimetable,
    ) -> DutySchedule {
        let rooms: Vec<&str> = classrooms
            .iter()
            .map(String::as_str)
            .filter(|room| *room != UNALLOCATED)
            .collect();
        let roster = timetable.roster();

        // 每次排程都重新計數，不沿用上一輪的狀態
        let mut state = RunState::default();
        for faculty in roster {
            state.counts.insert(faculty.as_str(), 0);
        }

        let mut assignments = Vec::with_capacity(slots.len() * rooms.len());

        for slot in slots {
            // 時間解析失敗時 window 為 None，is_busy 一律視為有空
            let window = parse_range(&slot.time);
            if window.is_none() {
                tracing::warn!(
                    "Exam slot {} {} has unparseable time '{}'; busy timetable ignored for it",
                    slot.date,
                    slot.subject,
                    slot.time
                );
            }

            let mut used_this_slot: HashSet<&str> = HashSet::new();

            for room in &rooms {
                // 有課、額滿或這個時段已排過的人都跳過
                let mut eligible = roster.iter().map(String::as_str).filter(|faculty| {
                    !timetable.is_busy(faculty, &slot.day, window)
                        && state.counts.get(faculty).copied().unwrap_or(0) < self.policy.max_duties
                        && !state
                            .committed
                            .contains(&(*faculty, slot.date, slot.time.as_str()))
                        && !used_this_slot.contains(faculty)
                });

                let chosen = match self.policy.selection {
                    SelectionPolicy::RosterOrder => eligible.next(),
                    // min_by_key 遇到平手回傳第一個，也就是名單順序
                    SelectionPolicy::LeastLoaded => eligible
                        .min_by_key(|faculty| state.counts.get(faculty).copied().unwrap_or(0)),
                };

                let duty = match chosen {
                    Some(faculty) => {
                        *state.counts.entry(faculty).or_insert(0) += 1;
                        state
                            .committed
                            .insert((faculty, slot.date, slot.time.as_str()));
                        used_this_slot.insert(faculty);
                        tracing::debug!(
                            "{} {} {} -> {}",
                            slot.date,
                            slot.time,
                            room,
                            faculty
                        );
                        Duty::Assigned(faculty.to_string())
                    }
                    None => {
                        tracing::warn!(
                            "No eligible faculty for {} on {} {}",
                            room,
                            slot.date,
                            slot.time
                        );
                        Duty::NotAssigned
                    }
                };

                assignments.push(DutyAssignment {
                    date: slot.date,
                    day: slot.day.clone(),
                    time: slot.time.clone(),
                    subject: slot.subject.clone(),
                    classroom: room.to_string(),
                    duty,
                });
            }
        }

        let duty_counts = roster
            .iter()
            .map(|f| (f.clone(), state.counts.get(f.as_str()).copied().unwrap_or(0)))
            .collect();

        DutySchedule {
            assignments,
            duty_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BusyInterval, NOT_ASSIGNED};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn slot(d: u32, day: &str, time: &str, subject: &str) -> ExamSlot {
        ExamSlot::new(date(d), day, time, subject)
    }

    fn rooms(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn free_roster(names: &[&str]) -> FacultyTimetable {
        let mut timetable = FacultyTimetable::new();
        for name in names {
            timetable.add_faculty(*name);
        }
        timetable
    }

    fn faculty_column(schedule: &DutySchedule) -> Vec<String> {
        schedule
            .assignments
            .iter()
            .map(|a| a.duty.to_string())
            .collect()
    }

    #[test]
    fn test_busy_for_whole_slot_is_not_assigned() {
        let timetable = FacultyTimetable::from_intervals([BusyInterval::new(
            "Dr. Rao",
            "Monday",
            "09:00-12:00",
        )]);
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101"]),
            &[slot(6, "Monday", "09:30-11:30", "Maths")],
            &timetable,
        );

        assert_eq!(faculty_column(&schedule), vec![NOT_ASSIGNED]);
        assert_eq!(schedule.unassigned(), 1);
    }

    #[test]
    fn test_two_rooms_get_distinct_faculty() {
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101", "102"]),
            &[slot(6, "Monday", "09:30-11:30", "Maths")],
            &free_roster(&["Dr. Rao", "Dr. Iyer"]),
        );

        assert_eq!(faculty_column(&schedule), vec!["Dr. Rao", "Dr. Iyer"]);
    }

    #[test]
    fn test_busy_on_other_day_is_still_eligible() {
        let timetable = FacultyTimetable::from_intervals([BusyInterval::new(
            "Dr. Rao",
            "Tuesday",
            "09:00-12:00",
        )]);
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101"]),
            &[slot(6, "Monday", "09:30-11:30", "Maths")],
            &timetable,
        );

        assert_eq!(faculty_column(&schedule), vec!["Dr. Rao"]);
    }

    #[test]
    fn test_adjacent_busy_interval_does_not_block() {
        let timetable = FacultyTimetable::from_intervals([BusyInterval::new(
            "Dr. Rao",
            "Monday",
            "08:00-09:30",
        )]);
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101"]),
            &[slot(6, "Monday", "09:30-11:30", "Maths")],
            &timetable,
        );

        assert_eq!(faculty_column(&schedule), vec!["Dr. Rao"]);
    }

    #[test]
    fn test_quota_caps_duties_per_faculty() {
        let slots: Vec<_> = (1..=5)
            .map(|d| slot(d, "Monday", "09:30-11:30", "Maths"))
            .collect();
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101"]),
            &slots,
            &free_roster(&["Dr. Rao", "Dr. Iyer"]),
        );

        assert_eq!(
            faculty_column(&schedule),
            vec!["Dr. Rao", "Dr. Rao", "Dr. Rao", "Dr. Iyer", "Dr. Iyer"]
        );
        assert_eq!(
            schedule.duty_counts,
            vec![("Dr. Rao".to_string(), 3), ("Dr. Iyer".to_string(), 2)]
        );
    }

    #[test]
    fn test_custom_quota_is_respected() {
        let policy = DutyPolicy {
            max_duties: 1,
            ..DutyPolicy::default()
        };
        let slots: Vec<_> = (1..=3)
            .map(|d| slot(d, "Monday", "09:30-11:30", "Maths"))
            .collect();
        let schedule = DutyScheduler::new(policy).schedule(
            &rooms(&["101"]),
            &slots,
            &free_roster(&["Dr. Rao", "Dr. Iyer"]),
        );

        assert_eq!(
            faculty_column(&schedule),
            vec!["Dr. Rao", "Dr. Iyer", NOT_ASSIGNED]
        );
    }

    #[test]
    fn test_same_date_and_time_rows_never_share_faculty() {
        // 同一時段兩科考試（不同科目）不能派同一位老師
        let slots = vec![
            slot(6, "Monday", "09:30-11:30", "Maths"),
            slot(6, "Monday", "09:30-11:30", "Physics"),
        ];
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101"]),
            &slots,
            &free_roster(&["Dr. Rao", "Dr. Iyer"]),
        );

        assert_eq!(faculty_column(&schedule), vec!["Dr. Rao", "Dr. Iyer"]);
    }

    #[test]
    fn test_unallocated_room_is_skipped() {
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101", UNALLOCATED]),
            &[slot(6, "Monday", "09:30-11:30", "Maths")],
            &free_roster(&["Dr. Rao", "Dr. Iyer"]),
        );

        assert_eq!(schedule.assignments.len(), 1);
        assert_eq!(schedule.assignments[0].classroom, "101");
    }

    #[test]
    fn test_output_order_is_slot_major() {
        let slots = vec![
            slot(7, "Tuesday", "14:00-16:00", "Chemistry"),
            slot(6, "Monday", "09:30-11:30", "Maths"),
        ];
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["B", "A"]),
            &slots,
            &free_roster(&["F1", "F2", "F3", "F4"]),
        );

        let order: Vec<_> = schedule
            .assignments
            .iter()
            .map(|a| (a.subject.as_str(), a.classroom.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("Chemistry", "B"), ("Chemistry", "A"), ("Maths", "B"), ("Maths", "A")]
        );
    }

    #[test]
    fn test_least_loaded_spreads_duties() {
        let policy = DutyPolicy {
            selection: SelectionPolicy::LeastLoaded,
            ..DutyPolicy::default()
        };
        let slots: Vec<_> = (1..=4)
            .map(|d| slot(d, "Monday", "09:30-11:30", "Maths"))
            .collect();
        let schedule = DutyScheduler::new(policy).schedule(
            &rooms(&["101"]),
            &slots,
            &free_roster(&["F1", "F2"]),
        );

        assert_eq!(faculty_column(&schedule), vec!["F1", "F2", "F1", "F2"]);
    }

    #[test]
    fn test_unparseable_busy_time_fails_open() {
        // 課表時間格式錯誤時不擋人：這是刻意保留的寬鬆行為
        let timetable = FacultyTimetable::from_intervals([BusyInterval::new(
            "Dr. Rao",
            "Monday",
            "all day",
        )]);
        let schedule = DutyScheduler::default().schedule(
            &rooms(&["101"]),
            &[slot(6, "Monday", "09:30-11:30", "Maths")],
            &timetable,
        );

        assert_eq!(faculty_column(&schedule), vec!["Dr. Rao"]);
    }

    #[test]
    fn test_invariants_hold_on_busy_schedule() {
        let mut timetable = FacultyTimetable::new();
        for (i, name) in ["F1", "F2", "F3", "F4", "F5", "F6"].iter().enumerate() {
            timetable.add_faculty(*name);
            if i % 2 == 0 {
                timetable.push(BusyInterval::new(*name, "Monday", "10:00-11:00"));
            }
        }
        let slots = vec![
            slot(6, "Monday", "09:30-11:30", "Maths"),
            slot(6, "Monday", "14:00-16:00", "Physics"),
            slot(7, "Tuesday", "09:30-11:30", "Chemistry"),
            slot(7, "Tuesday", "09:30-11:30", "Biology"),
            slot(8, "Wednesday", "09:30-11:30", "English"),
        ];
        let schedule =
            DutyScheduler::default().schedule(&rooms(&["101", "102", "103"]), &slots, &timetable);

        assert_eq!(schedule.assignments.len(), slots.len() * 3);

        let mut counts: HashMap<&str, u32> = HashMap::new();
        let mut seen = HashSet::new();
        for a in &schedule.assignments {
            if let Some(f) = a.duty.faculty() {
                *counts.entry(f).or_default() += 1;
                assert!(
                    seen.insert((f, a.date, a.time.as_str())),
                    "{f} double-booked on {} {}",
                    a.date,
                    a.time
                );
            }
        }
        assert!(counts.values().all(|c| *c <= DEFAULT_MAX_DUTIES));
    }

    #[test]
    fn test_runs_do_not_share_state() {
        let scheduler = DutyScheduler::default();
        let timetable = free_roster(&["F1"]);
        let slots: Vec<_> = (1..=3)
            .map(|d| slot(d, "Monday", "09:30-11:30", "Maths"))
            .collect();

        let first = scheduler.schedule(&rooms(&["101"]), &slots, &timetable);
        let second = scheduler.schedule(&rooms(&["101"]), &slots, &timetable);
        assert_eq!(first, second);
        assert_eq!(second.unassigned(), 0);
    }

    #[test]
    fn test_selection_policy_from_str() {
        assert_eq!(
            "least-loaded".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::LeastLoaded
        );
        assert_eq!(
            "roster-order".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::RosterOrder
        );
        assert!("random".parse::<SelectionPolicy>().is_err());
    }
}
