//! Pure cooldown evaluation for maintenance actions.

use crate::domain::{ActionKind, Asset};
use chrono::{Duration, NaiveDate};

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// The action may be performed today.
    Ready,
    /// The action was performed recently and is blocked until
    /// `next_eligible`.
    Waiting {
        performed_on: NaiveDate,
        next_eligible: NaiveDate,
    },
}

/// Decides whether `action` is currently permitted on `asset`.
///
/// An asset with no recorded last-performed date is always ready.
/// Otherwise the action becomes eligible again exactly the configured
/// number of days after the last approved performance; the boundary day
/// itself is eligible.
pub fn evaluate(asset: &Asset, action: ActionKind, today: NaiveDate) -> Cooldown {
    let Some(performed_on) = asset.last_performed(action) else {
        return Cooldown::Ready;
    };
    let next_eligible = performed_on + Duration::days(i64::from(asset.interval_days(action)));
    if today >= next_eligible {
        Cooldown::Ready
    } else {
        Cooldown::Waiting {
            performed_on,
            next_eligible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn asset(water_interval_days: u32, last_water: Option<NaiveDate>) -> Asset {
        Asset {
            species: "Oak".to_string(),
            description: "Front yard oak".to_string(),
            planted_on: "2025-04-12".to_string(),
            planter: "Dilnoza (volunteer)".to_string(),
            water_interval_days,
            clean_interval_days: 7,
            last_water,
            last_clean: None,
            water_count: 0,
            clean_count: 0,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    #[test]
    fn never_performed_is_always_ready() {
        let asset = asset(3, None);
        assert_eq!(evaluate(&asset, ActionKind::Water, day(1)), Cooldown::Ready);
    }

    #[test]
    fn boundary_day_is_eligible() {
        let asset = asset(3, Some(day(1)));
        assert_eq!(evaluate(&asset, ActionKind::Water, day(4)), Cooldown::Ready);
    }

    #[test]
    fn day_before_boundary_is_blocked() {
        let asset = asset(3, Some(day(1)));
        assert_eq!(
            evaluate(&asset, ActionKind::Water, day(3)),
            Cooldown::Waiting {
                performed_on: day(1),
                next_eligible: day(4),
            }
        );
    }

    #[test]
    fn actions_have_independent_cooldowns() {
        let mut asset = asset(3, Some(day(1)));
        asset.last_clean = None;
        assert_eq!(evaluate(&asset, ActionKind::Clean, day(2)), Cooldown::Ready);
    }

    proptest! {
        #[test]
        fn ready_iff_interval_elapsed(interval in 1u32..365, elapsed in 0i64..800) {
            let performed_on = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
            let today = performed_on + Duration::days(elapsed);
            let asset = asset(interval, Some(performed_on));
            let ready = matches!(evaluate(&asset, ActionKind::Water, today), Cooldown::Ready);
            prop_assert_eq!(ready, elapsed >= i64::from(interval));
        }
    }
}
