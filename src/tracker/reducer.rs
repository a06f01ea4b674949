//! The timer state machine. [transition] is the only way tracker state changes.

use chrono::NaiveDate;
use tracing::trace;

use super::state::{Department, TimerRecord, TrackerState};

/// Size of one manual adjustment step, in minutes.
const ADJUSTMENT_MINUTES: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Adopts `snapshot`, or starts over with nothing recorded when there is none. `today` is only
    /// used for the latter.
    Initialize {
        snapshot: Option<TrackerState>,
        today: NaiveDate,
    },
    /// Credits one second to the department on the current date.
    Increment(Department),
    /// Starts the department, stopping whatever else runs; stops it if it was running.
    Toggle(Department),
    /// Snaps the department's time to the nearest quarter hour and moves it one quarter up or
    /// down.
    AdjustTime(Department, Direction),
    ChangeDate(NaiveDate),
}

/// Applies `action` to `state`. Never fails: unknown departments simply get their own records.
pub fn transition(mut state: TrackerState, action: Action) -> TrackerState {
    trace!("Applying {action:?}");
    match action {
        Action::Initialize { snapshot, today } => {
            return snapshot.unwrap_or_else(|| TrackerState::fresh(today));
        }
        Action::Increment(department) => {
            let record = record_mut(&mut state, department);
            record.time = record.time.saturating_add(1);
        }
        Action::Toggle(department) => {
            let day = state.timers.entry(state.current_date).or_default();
            for (other, record) in day.iter_mut() {
                if *other != department {
                    record.is_active = false;
                }
            }
            let record = day.entry(department).or_default();
            record.is_active = !record.is_active;
        }
        Action::AdjustTime(department, direction) => {
            let record = record_mut(&mut state, department);
            record.time = adjusted_time(record.time, direction);
        }
        Action::ChangeDate(date) => {
            state.current_date = date;
        }
    }
    state
}

fn record_mut(state: &mut TrackerState, department: Department) -> &mut TimerRecord {
    state
        .timers
        .entry(state.current_date)
        .or_default()
        .entry(department)
        .or_default()
}

/// Drops seconds, rounds to the closest quarter hour (halves go up) and moves one quarter in
/// `direction`, never below zero. Whatever was below the quarter is lost every time.
pub fn adjusted_time(seconds: u64, direction: Direction) -> u64 {
    let minutes = seconds / 60;
    let rounded = (minutes + ADJUSTMENT_MINUTES / 2) / ADJUSTMENT_MINUTES * ADJUSTMENT_MINUTES;
    let adjusted = match direction {
        Direction::Up => rounded + ADJUSTMENT_MINUTES,
        Direction::Down => rounded.saturating_sub(ADJUSTMENT_MINUTES),
    };
    adjusted * 60
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{adjusted_time, transition, Action, Direction};
    use crate::{
        config::Departments,
        tracker::state::{Department, TimerRecord, TrackerState},
    };

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn dept(name: &str) -> Department {
        Department::from(name)
    }

    fn active_count(state: &TrackerState) -> usize {
        state.active_departments().count()
    }

    fn with_time(department: &str, time: u64) -> TrackerState {
        let mut state = TrackerState::fresh(date(1));
        state.timers.entry(date(1)).or_default().insert(
            dept(department),
            TimerRecord {
                is_active: false,
                time,
            },
        );
        state
    }

    #[test]
    fn toggles_keep_at_most_one_timer_running() {
        let departments = Departments::default();
        let mut state = TrackerState::fresh(date(1));
        // Walk through every department a few times in an uneven pattern.
        let sequence = (0..40).map(|i| (i * 7) % departments.len() + 1);
        for key in sequence {
            let department = departments.by_function_key(key).unwrap().clone();
            state = transition(state, Action::Toggle(department));
            assert!(active_count(&state) <= 1);
        }
    }

    #[test]
    fn toggle_starts_one_and_stops_the_rest() {
        let mut state = TrackerState::fresh(date(1));
        state = transition(state, Action::Toggle(dept("DCE")));
        state = transition(state, Action::Toggle(dept("CVCC")));

        assert!(state.record(&dept("CVCC")).is_active);
        assert!(!state.record(&dept("DCE")).is_active);
        assert_eq!(
            state.active_departments().cloned().collect::<Vec<_>>(),
            vec![dept("CVCC")]
        );
    }

    #[test]
    fn double_toggle_restores_target_and_leaves_others_stopped() {
        let mut state = TrackerState::fresh(date(1));
        state = transition(state, Action::Toggle(dept("DCE")));

        let toggled_once = transition(state.clone(), Action::Toggle(dept("ACCESS")));
        let toggled_twice = transition(toggled_once, Action::Toggle(dept("ACCESS")));

        assert!(!toggled_twice.record(&dept("ACCESS")).is_active);
        assert_eq!(active_count(&toggled_twice), 0);

        let stopped = transition(state, Action::Toggle(dept("DCE")));
        assert_eq!(active_count(&stopped), 0);
    }

    #[test]
    fn toggle_only_touches_current_date() {
        let mut state = TrackerState::fresh(date(1));
        state = transition(state, Action::Toggle(dept("DCE")));
        state = transition(state, Action::ChangeDate(date(2)));
        state = transition(state, Action::Toggle(dept("CVCC")));

        assert!(state.timers[&date(1)][&dept("DCE")].is_active);
        assert!(state.timers[&date(2)][&dept("CVCC")].is_active);
    }

    #[test]
    fn increment_adds_one_second_regardless_of_activity() {
        let mut state = with_time("DCE", 10);
        for expected in 11..=15 {
            state = transition(state, Action::Increment(dept("DCE")));
            assert_eq!(state.record(&dept("DCE")).time, expected);
        }
        assert!(!state.record(&dept("DCE")).is_active);

        state = transition(state, Action::Toggle(dept("DCE")));
        state = transition(state, Action::Increment(dept("DCE")));
        assert_eq!(
            state.record(&dept("DCE")),
            TimerRecord {
                is_active: true,
                time: 16
            }
        );
    }

    #[test]
    fn increment_without_record_creates_inactive_one() {
        let state = transition(
            TrackerState::fresh(date(3)),
            Action::Increment(dept("Arts & Music")),
        );
        assert_eq!(
            state.timers[&date(3)][&dept("Arts & Music")],
            TimerRecord {
                is_active: false,
                time: 1
            }
        );
    }

    #[test]
    fn unknown_departments_get_their_own_entries() {
        let state = transition(TrackerState::fresh(date(1)), Action::Toggle(dept("Typo")));
        assert!(state.record(&dept("Typo")).is_active);
    }

    #[test]
    fn adjust_up_from_under_a_minute() {
        let state = transition(with_time("DCE", 37), Action::AdjustTime(dept("DCE"), Direction::Up));
        assert_eq!(state.record(&dept("DCE")).time, 900);
    }

    #[test]
    fn adjust_down_is_clamped_at_zero() {
        let state = transition(
            with_time("DCE", 1000),
            Action::AdjustTime(dept("DCE"), Direction::Down),
        );
        assert_eq!(state.record(&dept("DCE")).time, 0);

        let state = transition(state, Action::AdjustTime(dept("DCE"), Direction::Down));
        assert_eq!(state.record(&dept("DCE")).time, 0);
    }

    #[test]
    fn adjust_rounds_half_quarters_up() {
        // 7 minutes rounds down, 8 minutes rounds up.
        assert_eq!(adjusted_time(7 * 60 + 59, Direction::Up), 15 * 60);
        assert_eq!(adjusted_time(8 * 60, Direction::Up), 30 * 60);
        assert_eq!(adjusted_time(8 * 60, Direction::Down), 0);
        assert_eq!(adjusted_time(2 * 3600 + 22 * 60, Direction::Down), (2 * 60) * 60);
    }

    #[test]
    fn adjust_loses_remainder_every_time() {
        let mut state = with_time("DCE", 20 * 60 + 30);
        state = transition(state, Action::AdjustTime(dept("DCE"), Direction::Up));
        assert_eq!(state.record(&dept("DCE")).time, 30 * 60);
        state = transition(state, Action::AdjustTime(dept("DCE"), Direction::Down));
        // 20:30 can't be reached again.
        assert_eq!(state.record(&dept("DCE")).time, 15 * 60);
    }

    #[test]
    fn adjust_keeps_activity() {
        let mut state = transition(TrackerState::fresh(date(1)), Action::Toggle(dept("DCE")));
        state = transition(state, Action::AdjustTime(dept("DCE"), Direction::Up));
        assert_eq!(
            state.record(&dept("DCE")),
            TimerRecord {
                is_active: true,
                time: 900
            }
        );
    }

    #[test]
    fn change_date_leaves_timers_alone() {
        let state = with_time("DCE", 5);
        let timers = state.timers.clone();
        let state = transition(state, Action::ChangeDate(date(2)));
        assert_eq!(state.current_date, date(2));
        assert_eq!(state.timers, timers);
        assert!(state.current_day().is_none());
    }

    #[test]
    fn initialize_adopts_snapshot_or_starts_fresh() {
        let snapshot = with_time("DCE", 5);
        let adopted = transition(
            TrackerState::fresh(date(9)),
            Action::Initialize {
                snapshot: Some(snapshot.clone()),
                today: date(9),
            },
        );
        assert_eq!(adopted, snapshot);

        let fresh = transition(
            snapshot,
            Action::Initialize {
                snapshot: None,
                today: date(9),
            },
        );
        assert_eq!(fresh, TrackerState::fresh(date(9)));
    }
}
