//! Labor-rule constants per route type and season.

use chrono::{Datelike, Duration, NaiveDate};

use crate::route::RouteType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// April to October inclusive.
    Summer,
    Winter,
}

impl Season {
    pub fn for_date(date: NaiveDate) -> Self {
        match date.month() {
            4..=10 => Season::Summer,
            _ => Season::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkTimeLimits {
    pub max_work_minutes: i64,
    pub breaks_minutes: i64,
}

impl WorkTimeLimits {
    pub fn for_route(route_type: RouteType, season: Season) -> Self {
        let (max_work_minutes, breaks_minutes) = match (route_type, season) {
            (RouteType::RegularRoute, Season::Summer) => (510, 60),
            (RouteType::RegularRoute, Season::Winter) => (480, 60),
            (RouteType::ShortRoute, Season::Summer) => (300, 15),
            (RouteType::ShortRoute, Season::Winter) => (270, 15),
            (RouteType::ExtendedRoute, Season::Summer) => (570, 60),
            (RouteType::ExtendedRoute, Season::Winter) => (540, 60),
        };

        Self {
            max_work_minutes,
            breaks_minutes,
        }
    }

    pub fn max_work_time(&self) -> Duration {
        Duration::minutes(self.max_work_minutes)
    }

    /// Longest allowed shift: work time plus the breaks taken during it.
    pub fn max_shift_time(&self) -> Duration {
        Duration::minutes(self.max_work_minutes + self.breaks_minutes)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(3, Season::Winter)]
    #[case(4, Season::Summer)]
    #[case(7, Season::Summer)]
    #[case(10, Season::Summer)]
    #[case(11, Season::Winter)]
    #[case(1, Season::Winter)]
    fn test_season_boundaries(#[case] month: u32, #[case] expected: Season) {
        let date = NaiveDate::from_ymd_opt(2024, month, 15).expect("valid date");
        assert_eq!(Season::for_date(date), expected);
    }

    #[test]
    fn test_summer_allows_longer_days() {
        for route_type in [RouteType::RegularRoute, RouteType::ShortRoute, RouteType::ExtendedRoute] {
            let summer = WorkTimeLimits::for_route(route_type, Season::Summer);
            let winter = WorkTimeLimits::for_route(route_type, Season::Winter);
            assert!(summer.max_work_minutes > winter.max_work_minutes);
            assert_eq!(summer.breaks_minutes, winter.breaks_minutes);
        }
    }

    #[test]
    fn test_max_shift_includes_breaks() {
        let limits = WorkTimeLimits::for_route(RouteType::RegularRoute, Season::Summer);
        assert_eq!(limits.max_shift_time(), Duration::minutes(570));
    }
}
