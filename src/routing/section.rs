//! API sections mounted under `/api`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiSection {
    Health,
    Stats,
    Notifications,
    Badges,
    Questions,
    Flashcard,
    Qcm,
    Streak,
    Planner,
}

impl ApiSection {
    pub const ALL: [ApiSection; 9] = [
        ApiSection::Health,
        ApiSection::Stats,
        ApiSection::Notifications,
        ApiSection::Badges,
        ApiSection::Questions,
        ApiSection::Flashcard,
        ApiSection::Qcm,
        ApiSection::Streak,
        ApiSection::Planner,
    ];

    /// Key used in the service descriptor.
    pub fn name(self) -> &'static str {
        match self {
            ApiSection::Health => "health",
            ApiSection::Stats => "stats",
            ApiSection::Notifications => "notifications",
            ApiSection::Badges => "badges",
            ApiSection::Questions => "questions",
            ApiSection::Flashcard => "flashcard",
            ApiSection::Qcm => "qcm",
            ApiSection::Streak => "streak",
            ApiSection::Planner => "planner",
        }
    }

    /// Mount point, e.g. `/api/qcm`.
    pub fn prefix(self) -> &'static str {
        match self {
            ApiSection::Health => "/api/health",
            ApiSection::Stats => "/api/stats",
            ApiSection::Notifications => "/api/notifications",
            ApiSection::Badges => "/api/badges",
            ApiSection::Questions => "/api/questions",
            ApiSection::Flashcard => "/api/flashcard",
            ApiSection::Qcm => "/api/qcm",
            ApiSection::Streak => "/api/streak",
            ApiSection::Planner => "/api/planner",
        }
    }
}

impl fmt::Display for ApiSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_api_slash_name() {
        for section in ApiSection::ALL {
            assert_eq!(section.prefix(), format!("/api/{}", section.name()));
        }
    }
}
