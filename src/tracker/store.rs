use chrono::{NaiveDate, Timelike};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::{
    config::{Departments, TrackerConfig},
    storage::saver::SaveHandle,
    utils::clock::Clock,
};

use super::{
    event::{Navigation, TrackerEvent},
    lifecycle::{ensure_current_day, initialize},
    reducer::{transition, Action},
    state::TrackerState,
    tick::tick_actions,
};

/// Owner of the tracker state. Every change goes through [transition], and the state left by each
/// handled event is handed to the save queue.
pub struct TrackerStore {
    state: TrackerState,
    departments: Departments,
    timezone: Tz,
    /// Civil date the clock reported last. Differs from `state.current_date` while the user looks
    /// at another day.
    observed_today: NaiveDate,
    time_provider: Box<dyn Clock>,
    saves: SaveHandle,
}

impl TrackerStore {
    pub fn new(
        snapshot: Option<TrackerState>,
        config: &TrackerConfig,
        time_provider: Box<dyn Clock>,
        saves: SaveHandle,
    ) -> Self {
        let today = time_provider.civil_date(config.timezone);
        let state = initialize(snapshot, today, &config.departments);
        saves.schedule(&state);
        Self {
            state,
            departments: config.departments.clone(),
            timezone: config.timezone,
            observed_today: today,
            time_provider,
            saves,
        }
    }

    pub fn snapshot(&self) -> &TrackerState {
        &self.state
    }

    pub fn departments(&self) -> &Departments {
        &self.departments
    }

    /// Applies one event from the tracker queue and schedules a save of the result.
    pub fn handle(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Elapsed(seconds) => self.credit(seconds),
            TrackerEvent::Toggle(department) => {
                info!("Toggling {department}");
                self.apply(Action::Toggle(department))
            }
            TrackerEvent::Adjust(department, direction) => {
                info!("Adjusting {department} {direction:?}");
                self.apply(Action::AdjustTime(department, direction))
            }
            TrackerEvent::Navigate(navigation) => self.navigate(navigation),
            TrackerEvent::Refresh => return,
        }
        self.saves.schedule(&self.state);
    }

    /// Credits `seconds` to whatever is running. When the clock crossed midnight since the last
    /// credit, the seconds before midnight stay on the previous current date and the rest go to
    /// the new day, where the running timer moves.
    fn credit(&mut self, seconds: u64) {
        let now = self.time_provider.time().with_timezone(&self.timezone);
        let today = now.date_naive();
        let mut remaining = seconds;
        if today != self.observed_today {
            let since_midnight = u64::from(now.time().num_seconds_from_midnight());
            let before_midnight = seconds.saturating_sub(since_midnight);
            self.credit_running(before_midnight);
            remaining -= before_midnight;
            self.roll_over(today);
        }
        self.credit_running(remaining);
    }

    fn credit_running(&mut self, seconds: u64) {
        for action in tick_actions(&self.state, seconds) {
            self.apply(action);
        }
    }

    fn navigate(&mut self, navigation: Navigation) {
        let current = self.state.current_date;
        let target = match navigation {
            Navigation::Previous => current.pred_opt(),
            Navigation::Next => current.succ_opt(),
            Navigation::Today => Some(self.time_provider.civil_date(self.timezone)),
        };
        match target {
            Some(date) => self.change_date(date),
            None => warn!("Can't navigate {navigation:?} from {current}"),
        }
    }

    /// Sends the final state to the save queue and lets go of it.
    pub fn close(self) {
        info!("Closing tracker on {}", self.state.current_date);
        self.saves.flush(self.state);
    }

    fn change_date(&mut self, date: NaiveDate) {
        debug!("Changing date to {date}");
        self.apply(Action::ChangeDate(date));
        let departments = &self.departments;
        let state = std::mem::replace(&mut self.state, TrackerState::fresh(date));
        self.state = ensure_current_day(state, departments);
    }

    /// Follows the clock into `today`. The department running on the previous current date
    /// keeps running, but from now on on the new day.
    fn roll_over(&mut self, today: NaiveDate) {
        info!("Date changed from {} to {today}", self.observed_today);
        self.observed_today = today;

        let running = self.state.active_departments().cloned().collect::<Vec<_>>();
        for department in &running {
            self.apply(Action::Toggle(department.clone()));
        }
        self.change_date(today);
        for department in running {
            if !self.state.record(&department).is_active {
                self.apply(Action::Toggle(department));
            }
        }
    }

    fn apply(&mut self, action: Action) {
        let placeholder = TrackerState::fresh(self.state.current_date);
        let state = std::mem::replace(&mut self.state, placeholder);
        self.state = transition(state, action);
    }
}
