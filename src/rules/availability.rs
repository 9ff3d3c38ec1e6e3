//! Equipment availability checks over half-open time ranges

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// Why a range could not be built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range end must be after its start")]
    Empty,
    #[error("range end is out of the supported calendar")]
    OutOfBounds,
}

/// Half-open range `[from, to)`; always non-empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange<T> {
    from: T,
    to: T,
}

impl<T: Ord + Copy> TimeRange<T> {
    /// Build a range, rejecting zero-length and inverted ones
    pub fn new(from: T, to: T) -> Result<Self, RangeError> {
        if to <= from {
            return Err(RangeError::Empty);
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> T {
        self.from
    }

    pub fn to(&self) -> T {
        self.to
    }

    pub fn overlaps(&self, other: &TimeRange<T>) -> bool {
        self.from < other.to && self.to > other.from
    }

    pub fn contains(&self, instant: T) -> bool {
        self.from <= instant && instant < self.to
    }
}

impl TimeRange<NaiveDate> {
    /// Range covering the calendar days `start..=end`
    pub fn from_inclusive_days(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        let after_end = end.checked_add_days(Days::new(1)).ok_or(RangeError::OutOfBounds)?;
        Self::new(start, after_end)
    }
}

/// A record that reserves one equipment unit for a time range
pub trait Binding<T> {
    fn binding_id(&self) -> &str;
    fn equipment_id(&self) -> Option<&str>;
    fn is_active(&self) -> bool;
    /// `None` when the stored range is missing or malformed
    fn range(&self) -> Option<TimeRange<T>>;
}

fn conflicts_with<T, B>(equipment_id: &str, candidate: &TimeRange<T>, binding: &B) -> bool
where
    T: Ord + Copy,
    B: Binding<T>,
{
    binding.is_active()
        && binding.equipment_id() == Some(equipment_id)
        && binding
            .range()
            .map(|range| range.overlaps(candidate))
            .unwrap_or(false)
}

/// Active bindings of `equipment_id` that overlap `candidate`
pub fn find_conflicts<'a, T, B, I>(
    equipment_id: &str,
    candidate: &TimeRange<T>,
    existing: I,
) -> Vec<&'a B>
where
    T: Ord + Copy,
    B: Binding<T> + 'a,
    I: IntoIterator<Item = &'a B>,
{
    existing
        .into_iter()
        .filter(|binding| conflicts_with(equipment_id, candidate, *binding))
        .collect()
}

/// True when no active binding of `equipment_id` overlaps `candidate`
pub fn is_equipment_available<'a, T, B, I>(
    equipment_id: &str,
    candidate: &TimeRange<T>,
    existing: I,
) -> bool
where
    T: Ord + Copy,
    B: Binding<T> + 'a,
    I: IntoIterator<Item = &'a B>,
{
    !existing
        .into_iter()
        .any(|binding| conflicts_with(equipment_id, candidate, binding))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slot {
        id: &'static str,
        equipment: &'static str,
        active: bool,
        range: (NaiveDate, NaiveDate),
    }

    impl Binding<NaiveDate> for Slot {
        fn binding_id(&self) -> &str {
            self.id
        }

        fn equipment_id(&self) -> Option<&str> {
            Some(self.equipment)
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn range(&self) -> Option<TimeRange<NaiveDate>> {
            TimeRange::from_inclusive_days(self.range.0, self.range.1).ok()
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn slot(id: &'static str, equipment: &'static str, active: bool, from: u32, to: u32) -> Slot {
        Slot { id, equipment, active, range: (day(from), day(to)) }
    }

    #[test]
    fn test_new_rejects_empty_and_inverted() {
        assert_eq!(TimeRange::new(5, 5), Err(RangeError::Empty));
        assert_eq!(TimeRange::new(6, 5), Err(RangeError::Empty));
        assert!(TimeRange::new(5, 6).is_ok());
    }

    #[test]
    fn test_half_open_overlap() {
        let a = TimeRange::new(0, 10).unwrap();
        assert!(a.overlaps(&TimeRange::new(9, 12).unwrap()));
        assert!(a.overlaps(&TimeRange::new(2, 3).unwrap()));
        assert!(!a.overlaps(&TimeRange::new(10, 12).unwrap()));
        assert!(!a.overlaps(&TimeRange::new(-5, 0).unwrap()));
        assert!(a.contains(0));
        assert!(!a.contains(10));
    }

    #[test]
    fn test_inclusive_days_single_day() {
        let range = TimeRange::from_inclusive_days(day(3), day(3)).unwrap();
        assert_eq!(range.from(), day(3));
        assert_eq!(range.to(), day(4));
        assert_eq!(
            TimeRange::from_inclusive_days(day(4), day(3)),
            Err(RangeError::Empty)
        );
    }

    #[test]
    fn test_identical_range_is_unavailable() {
        let existing = [slot("b1", "E1", true, 1, 5)];
        let candidate = TimeRange::from_inclusive_days(day(1), day(5)).unwrap();
        assert!(!is_equipment_available("E1", &candidate, &existing));
    }

    #[test]
    fn test_ranges_before_and_after_are_available() {
        let existing = [slot("b1", "E1", true, 10, 15)];
        let before = TimeRange::from_inclusive_days(day(1), day(9)).unwrap();
        let after = TimeRange::from_inclusive_days(day(16), day(20)).unwrap();
        assert!(is_equipment_available("E1", &before, &existing));
        assert!(is_equipment_available("E1", &after, &existing));
    }

    #[test]
    fn test_inactive_and_other_equipment_ignored() {
        let existing = [
            slot("b1", "E1", false, 1, 5),
            slot("b2", "E2", true, 1, 5),
        ];
        let candidate = TimeRange::from_inclusive_days(day(3), day(4)).unwrap();
        assert!(is_equipment_available("E1", &candidate, &existing));
        assert!(!is_equipment_available("E2", &candidate, &existing));
    }

    #[test]
    fn test_find_conflicts_names_blocking_bindings() {
        let existing = [
            slot("b1", "E1", true, 1, 5),
            slot("b2", "E1", true, 8, 9),
            slot("b3", "E1", true, 4, 4),
        ];
        let candidate = TimeRange::from_inclusive_days(day(3), day(4)).unwrap();
        let ids: Vec<&str> = find_conflicts("E1", &candidate, &existing)
            .into_iter()
            .map(|b| b.binding_id())
            .collect();
        assert_eq!(ids, vec!["b1", "b3"]);
    }
}
