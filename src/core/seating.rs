//! Seat allocation: packs a block of consecutive student identifiers into
//! classrooms, largest room first.

use crate::core::identifier::Identifier;
use crate::domain::model::{Classroom, SeatRange, UNALLOCATED};
use crate::utils::error::Result;

/// Splits `num_students` identifiers starting at `start_id` across `classrooms`.
///
/// Rooms are filled in descending capacity order (ties keep input order) and
/// each receives one contiguous range. Rooms left over once everyone is seated,
/// and rooms with zero capacity, get no range. Students that do not fit are
/// returned as a final [`UNALLOCATED`] range.
///
/// `start_id` is validated even when there is nobody to seat; on error no
/// partial allocation is returned.
pub fn allocate_seats(
    num_students: u64,
    start_id: &str,
    classrooms: &[Classroom],
) -> Result<Vec<SeatRange>> {
    let mut cursor = Identifier::parse(start_id)?;

    // sort_by 是穩定排序，同容量的教室保持原順序
    let mut ordered: Vec<&Classroom> = classrooms.iter().collect();
    ordered.sort_by(|a, b| b.capacity.cmp(&a.capacity));

    let mut ranges = Vec::new();
    let mut remaining = num_students;

    for room in ordered {
        if remaining == 0 {
            break;
        }

        let assigned = remaining.min(u64::from(room.capacity));
        // 容量為 0 的教室不佔任何學號
        if assigned == 0 {
            continue;
        }

        // 區間含頭含尾，下一間從 end_id 的下一號開始
        let end_id = cursor.next(assigned - 1)?;
        let next_cursor = end_id.next(1)?;
        tracing::debug!(
            "Room {} <- {}..{} ({} students)",
            room.name,
            cursor,
            end_id,
            assigned
        );

        ranges.push(SeatRange {
            classroom: room.name.clone(),
            start_id: cursor,
            end_id,
            count: assigned,
        });

        remaining -= assigned;
        cursor = next_cursor;
    }

    // 座位不夠：剩下的學生集中在一筆 Unallocated
    if remaining > 0 {
        let end_id = cursor.next(remaining - 1)?;
        tracing::warn!(
            "Total capacity is short by {} students; {}..{} left unallocated",
            remaining,
            cursor,
            end_id
        );
        ranges.push(SeatRange {
            classroom: UNALLOCATED.to_string(),
            start_id: cursor,
            end_id,
            count: remaining,
        });
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AllocError;

    fn rooms(layout: &[(&str, u32)]) -> Vec<Classroom> {
        layout
            .iter()
            .map(|(name, capacity)| Classroom::new(*name, *capacity))
            .collect()
    }

    fn row(range: &SeatRange) -> (String, String, String, u64) {
        (
            range.classroom.clone(),
            range.start_id.to_string(),
            range.end_id.to_string(),
            range.count,
        )
    }

    #[test]
    fn test_two_equal_rooms_fill_in_input_order() {
        let ranges =
            allocate_seats(50, "1MS20CS001", &rooms(&[("RoomA", 30), ("RoomB", 30)])).unwrap();

        let rows: Vec<_> = ranges.iter().map(row).collect();
        assert_eq!(
            rows,
            vec![
                ("RoomA".into(), "1MS20CS001".into(), "1MS20CS030".into(), 30),
                ("RoomB".into(), "1MS20CS031".into(), "1MS20CS050".into(), 20),
            ]
        );
    }

    #[test]
    fn test_shortfall_goes_to_unallocated() {
        let ranges = allocate_seats(15, "1MS20CS001", &rooms(&[("RoomA", 10)])).unwrap();

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].count, 10);
        assert!(ranges[1].is_unallocated());
        assert_eq!(ranges[1].count, 5);
        assert_eq!(ranges[1].start_id.to_string(), "1MS20CS011");
        assert_eq!(ranges[1].end_id.to_string(), "1MS20CS015");
    }

    #[test]
    fn test_largest_room_is_filled_first() {
        let ranges = allocate_seats(
            40,
            "CS001",
            &rooms(&[("Small", 10), ("Large", 35), ("Medium", 20)]),
        )
        .unwrap();

        let names: Vec<_> = ranges.iter().map(|r| r.classroom.as_str()).collect();
        assert_eq!(names, vec!["Large", "Medium"]);
        assert_eq!(ranges[0].count, 35);
        assert_eq!(ranges[1].count, 5);
    }

    #[test]
    fn test_zero_students_yields_nothing() {
        let ranges = allocate_seats(0, "1MS20CS001", &rooms(&[("RoomA", 30)])).unwrap();
        assert!(ranges.is_empty());

        let ranges = allocate_seats(0, "1MS20CS001", &[]).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_zero_capacity_rooms_are_skipped() {
        let ranges =
            allocate_seats(12, "A001", &rooms(&[("Closed", 0), ("Open", 10)])).unwrap();

        let names: Vec<_> = ranges.iter().map(|r| r.classroom.as_str()).collect();
        assert_eq!(names, vec!["Open", UNALLOCATED]);
        assert_eq!(ranges[1].start_id.to_string(), "A011");
    }

    #[test]
    fn test_no_classrooms_means_everyone_unallocated() {
        let ranges = allocate_seats(7, "X001", &[]).unwrap();
        assert_eq!(ranges.len(), 1);
        assert!(ranges[0].is_unallocated());
        assert_eq!(ranges[0].end_id.to_string(), "X007");
    }

    #[test]
    fn test_invalid_start_id_fails_without_output() {
        let err = allocate_seats(10, "NOT-A-USN", &rooms(&[("RoomA", 30)])).unwrap_err();
        assert!(matches!(err, AllocError::InvalidFormat { .. }));

        assert!(allocate_seats(0, "", &[]).is_err());
    }

    #[test]
    fn test_counts_sum_and_ranges_are_contiguous() {
        let capacities = [
            vec![],
            vec![1],
            vec![5, 5, 5],
            vec![30, 12, 0, 45, 12],
            vec![100],
        ];
        for caps in &capacities {
            let classrooms: Vec<_> = caps
                .iter()
                .enumerate()
                .map(|(i, c)| Classroom::new(format!("R{i}"), *c))
                .collect();

            for num_students in [0u64, 1, 9, 15, 60, 104, 250] {
                let ranges = allocate_seats(num_students, "1MS20CS001", &classrooms).unwrap();

                let total: u64 = ranges.iter().map(|r| r.count).sum();
                assert_eq!(total, num_students, "caps {caps:?}, students {num_students}");

                for pair in ranges.windows(2) {
                    assert_eq!(pair[1].start_id, pair[0].end_id.next(1).unwrap());
                }
                for range in &ranges {
                    assert_eq!(range.end_id, range.start_id.next(range.count - 1).unwrap());
                }
                assert!(ranges.iter().filter(|r| r.is_unallocated()).count() <= 1);
            }
        }
    }
}
