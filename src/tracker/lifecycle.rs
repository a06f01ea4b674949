//! Rules applied around the reducer when the tracker starts and whenever the current date moves.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::Departments;

use super::{
    reducer::{transition, Action},
    state::{DayTimers, TimerRecord, TrackerState},
};

/// A day with every configured department present, zeroed and stopped.
pub fn empty_day(departments: &Departments) -> DayTimers {
    departments
        .iter()
        .map(|department| (department.clone(), TimerRecord::default()))
        .collect()
}

/// Makes sure `timers[current_date]` exists. An existing day is left untouched, even when it
/// misses some configured departments: those read as zero anyway.
pub fn ensure_current_day(mut state: TrackerState, departments: &Departments) -> TrackerState {
    if !state.timers.contains_key(&state.current_date) {
        debug!("Creating timers for {}", state.current_date);
        state
            .timers
            .insert(state.current_date, empty_day(departments));
    }
    state
}

/// Builds the starting state. Whatever date the snapshot was saved on, the tracker always opens on
/// `today`.
pub fn initialize(
    snapshot: Option<TrackerState>,
    today: NaiveDate,
    departments: &Departments,
) -> TrackerState {
    match &snapshot {
        Some(v) => info!(
            "Restoring state saved on {} with {} recorded days",
            v.current_date,
            v.timers.len()
        ),
        None => info!("Starting with empty state"),
    }
    let state = transition(TrackerState::fresh(today), Action::Initialize { snapshot, today });
    let state = transition(state, Action::ChangeDate(today));
    ensure_current_day(state, departments)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ensure_current_day, initialize};
    use crate::{
        config::Departments,
        tracker::{
            reducer::{transition, Action},
            state::{Department, TimerRecord, TrackerState},
        },
    };

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn assert_zeroed_day(state: &TrackerState, date: NaiveDate, departments: &Departments) {
        let day = &state.timers[&date];
        assert_eq!(day.len(), departments.len());
        for department in departments.iter() {
            assert_eq!(day[department], TimerRecord::default());
        }
    }

    #[test]
    fn restored_state_opens_on_today() {
        let departments = Departments::default();
        let mut saved = TrackerState::fresh(date(1, 1));
        saved.timers.entry(date(1, 1)).or_default().insert(
            Department::from("DCE"),
            TimerRecord {
                is_active: true,
                time: 120,
            },
        );

        let state = initialize(Some(saved.clone()), date(1, 5), &departments);

        assert_eq!(state.current_date, date(1, 5));
        assert_eq!(state.timers[&date(1, 1)], saved.timers[&date(1, 1)]);
        assert_zeroed_day(&state, date(1, 5), &departments);
    }

    #[test]
    fn restored_state_keeps_existing_today() {
        let departments = Departments::default();
        let mut saved = TrackerState::fresh(date(1, 1));
        saved.timers.entry(date(1, 5)).or_default().insert(
            Department::from("DCE"),
            TimerRecord {
                is_active: false,
                time: 60,
            },
        );

        let state = initialize(Some(saved.clone()), date(1, 5), &departments);

        assert_eq!(state.timers, saved.timers);
    }

    #[test]
    fn first_run_creates_today() {
        let departments = Departments::default();
        let state = initialize(None, date(2, 29), &departments);
        assert_eq!(state.current_date, date(2, 29));
        assert_eq!(state.timers.len(), 1);
        assert_zeroed_day(&state, date(2, 29), &departments);
    }

    #[test]
    fn changing_to_an_unseen_date_creates_it() {
        let departments = Departments::default();
        let mut state = initialize(None, date(1, 1), &departments);
        state = transition(state, Action::Toggle(Department::from("DCE")));

        state = transition(state, Action::ChangeDate(date(1, 2)));
        state = ensure_current_day(state, &departments);

        assert_zeroed_day(&state, date(1, 2), &departments);
        assert!(state.timers[&date(1, 1)][&Department::from("DCE")].is_active);
    }
}
