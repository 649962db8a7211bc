//! Day indexer: maps a calendar date to a (table, row) coordinate in the
//! week-paginated plan document.

use chrono::NaiveDate;

/// Each plan table holds one header row plus one ISO week of data rows.
pub const ROWS_PER_TABLE: u32 = 7;

/// A (table, row) coordinate in the plan document.
///
/// `row` is the row index within the table, where row 0 is the header —
/// data rows are 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySlot {
    pub table: usize,
    pub row: usize,
}

/// 1-based day number since the tracking start date.
///
/// `None` if `today` precedes `start`.
pub fn day_number(today: NaiveDate, start: NaiveDate) -> Option<u32> {
    if today < start {
        return None;
    }
    Some((today - start).num_days() as u32 + 1)
}

/// Locate the plan coordinate for a calendar date.
///
/// Pure arithmetic: day 1 maps to (table 0, row 1), day 7 to (table 0,
/// row 7), day 8 to (table 1, row 1). Whether the table actually exists is
/// the caller's concern.
pub fn locate(today: NaiveDate, start: NaiveDate) -> Option<DaySlot> {
    let day = day_number(today, start)?;
    let idx = day - 1;
    Some(DaySlot {
        table: (idx / ROWS_PER_TABLE) as usize,
        row: (idx % ROWS_PER_TABLE) as usize + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_before_start_is_none() {
        let start = d(2026, 1, 12);
        assert_eq!(day_number(d(2026, 1, 11), start), None);
        assert_eq!(locate(d(2025, 12, 31), start), None);
    }

    #[test]
    fn test_first_day_is_table_zero_row_one() {
        let start = d(2026, 1, 12);
        assert_eq!(day_number(start, start), Some(1));
        assert_eq!(locate(start, start), Some(DaySlot { table: 0, row: 1 }));
    }

    #[test]
    fn test_week_boundary() {
        let start = d(2026, 1, 12);
        // Day 7 fills table 0, day 8 opens table 1.
        assert_eq!(
            locate(d(2026, 1, 18), start),
            Some(DaySlot { table: 0, row: 7 })
        );
        assert_eq!(
            locate(d(2026, 1, 19), start),
            Some(DaySlot { table: 1, row: 1 })
        );
    }

    #[test]
    fn test_row_always_in_range() {
        let start = d(2026, 1, 12);
        for offset in 0..120 {
            let today = start + chrono::Duration::days(offset);
            let slot = locate(today, start).unwrap();
            assert!((1..=7).contains(&slot.row), "row {} out of range", slot.row);
        }
    }

    #[test]
    fn test_seven_days_advance_table_by_one() {
        let start = d(2026, 1, 12);
        for offset in 0..60 {
            let today = start + chrono::Duration::days(offset);
            let later = today + chrono::Duration::days(7);
            let a = locate(today, start).unwrap();
            let b = locate(later, start).unwrap();
            assert_eq!(b.table, a.table + 1);
            assert_eq!(b.row, a.row);
        }
    }

    #[test]
    fn test_monotonic_in_today() {
        let start = d(2026, 1, 12);
        let mut prev = locate(start, start).unwrap();
        for offset in 1..60 {
            let slot = locate(start + chrono::Duration::days(offset), start).unwrap();
            assert!(
                (slot.table, slot.row) > (prev.table, prev.row),
                "slot order regressed at offset {offset}"
            );
            prev = slot;
        }
    }
}
