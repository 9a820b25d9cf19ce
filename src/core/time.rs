//! Shift calendar for the simulation
//!
//! The simulation clock counts working minutes only; the calendar converts
//! the configured shift pattern into the single global deadline and the
//! day/minute mapping echoed in results for Gantt rendering.

use serde::{Deserialize, Serialize};

/// Converts a shift pattern (hours per day, days per month) into simulated
/// minutes.
///
/// # Example
/// ```
/// use assembly_simulator_core::core::time::ShiftCalendar;
///
/// let cal = ShiftCalendar::new(8, 22);
/// assert_eq!(cal.minutes_per_day(), 480.0);
/// assert_eq!(cal.total_minutes(), 10_560.0);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShiftCalendar {
    work_hours_per_day: u32,
    work_days_per_month: u32,
}

/// Time metadata echoed in every result so downstream Gantt consumers can
/// map simulated minutes back onto working days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMapping {
    pub minutes_per_day: f64,
    pub total_days: u32,
    pub total_minutes: f64,
    pub work_hours_per_day: u32,
}

impl ShiftCalendar {
    pub fn new(work_hours_per_day: u32, work_days_per_month: u32) -> Self {
        Self {
            work_hours_per_day,
            work_days_per_month,
        }
    }

    /// Working minutes in one day.
    pub fn minutes_per_day(&self) -> f64 {
        f64::from(self.work_hours_per_day) * 60.0
    }

    /// The global simulation deadline in minutes.
    pub fn total_minutes(&self) -> f64 {
        self.minutes_per_day() * f64::from(self.work_days_per_month)
    }

    /// 1-indexed working day containing minute `t`.
    pub fn day_of(&self, t: f64) -> u32 {
        (t / self.minutes_per_day()) as u32 + 1
    }

    pub fn time_mapping(&self) -> TimeMapping {
        TimeMapping {
            minutes_per_day: self.minutes_per_day(),
            total_days: self.work_days_per_month,
            total_minutes: self.total_minutes(),
            work_hours_per_day: self.work_hours_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_minutes() {
        let cal = ShiftCalendar::new(8, 22);
        assert_eq!(cal.total_minutes(), 8.0 * 60.0 * 22.0);
    }

    #[test]
    fn test_day_of() {
        let cal = ShiftCalendar::new(8, 22);
        assert_eq!(cal.day_of(0.0), 1);
        assert_eq!(cal.day_of(479.9), 1);
        assert_eq!(cal.day_of(480.0), 2);
        assert_eq!(cal.day_of(1000.0), 3);
    }

    #[test]
    fn test_time_mapping_echo() {
        let cal = ShiftCalendar::new(10, 20);
        let mapping = cal.time_mapping();
        assert_eq!(mapping.minutes_per_day, 600.0);
        assert_eq!(mapping.total_days, 20);
        assert_eq!(mapping.total_minutes, 12_000.0);
        assert_eq!(mapping.work_hours_per_day, 10);
    }
}
