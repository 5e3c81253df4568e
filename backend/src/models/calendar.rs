//! Weekly business-hours calendar for a single store.

use chrono::Weekday;

use super::store::{BusinessHoursRule, StoreId};

/// Per-store weekly open/close rules.
///
/// A store without any rules is open every day, all day. A store with at
/// least one rule is closed on every weekday that has no rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessHoursCalendar {
    store_id: StoreId,
    rules: [Option<BusinessHoursRule>; 7],
    always_open: bool,
}

impl BusinessHoursCalendar {
    /// Build a calendar from the rules stored for one store.
    ///
    /// Rules for other stores are ignored. When two rules share a weekday the
    /// later one wins.
    pub fn new(store_id: StoreId, rules: impl IntoIterator<Item = BusinessHoursRule>) -> Self {
        let mut slots: [Option<BusinessHoursRule>; 7] = Default::default();
        let mut any = false;
        for rule in rules.into_iter().filter(|r| r.store_id == store_id) {
            let idx = rule.weekday.num_days_from_monday() as usize;
            slots[idx] = Some(rule);
            any = true;
        }

        if !any {
            return Self::always_open(store_id);
        }

        Self {
            store_id,
            rules: slots,
            always_open: false,
        }
    }

    /// Calendar open 24/7.
    pub fn always_open(store_id: StoreId) -> Self {
        let rules = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .map(|day| Some(BusinessHoursRule::full_day(store_id.clone(), day)));

        Self {
            store_id,
            rules,
            always_open: true,
        }
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    /// True when the store had no rules and defaulted to 24/7.
    pub fn is_always_open(&self) -> bool {
        self.always_open
    }

    /// Rule for `weekday`, or `None` when the store is closed that day.
    pub fn rule_for(&self, weekday: Weekday) -> Option<&BusinessHoursRule> {
        self.rules[weekday.num_days_from_monday() as usize].as_ref()
    }
}
