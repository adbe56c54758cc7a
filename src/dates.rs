use crate::models::{Campaign, Round};
use crate::survey::SurveyType;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    /// Set when the survey dates were missing and the round's own dates
    /// were used instead.
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoundDates {
    pub start: Option<ResolvedDate>,
    pub end: Option<ResolvedDate>,
}

pub fn resolve_round_dates(campaign: &Campaign, round_number: u32, survey: SurveyType) -> RoundDates {
    let Some(round) = campaign.round(round_number) else {
        warn!(
            campaign = %campaign.id,
            "round {round_number} not found, no survey dates"
        );
        return RoundDates::default();
    };
    let (survey_start, survey_end) = survey_dates(round, survey);
    RoundDates {
        start: pick(survey_start, round.started_at),
        end: pick(survey_end, round.ended_at),
    }
}

fn survey_dates(round: &Round, survey: SurveyType) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match survey {
        SurveyType::Lqas => (round.lqas_started_at, round.lqas_ended_at),
        SurveyType::Im(_) => (round.im_started_at, round.im_ended_at),
    }
}

fn pick(preferred: Option<NaiveDate>, fallback: Option<NaiveDate>) -> Option<ResolvedDate> {
    match (preferred, fallback) {
        (Some(date), _) => Some(ResolvedDate {
            date,
            is_default: false,
        }),
        (None, Some(date)) => Some(ResolvedDate {
            date,
            is_default: true,
        }),
        (None, None) => None,
    }
}
