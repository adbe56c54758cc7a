use crate::models::RoundDistrictData;
use crate::survey::SurveyType;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    /// IM only: between 90% and 95% marked.
    Warning,
    /// LQAS graduated fail tiers.
    Moderate,
    Poor,
    Fail,
    /// In scope, but the survey returned nothing usable.
    NoData,
    NotInScope,
}

impl Status {
    pub fn from_lqas_token(token: &str) -> Status {
        match token.trim().to_ascii_lowercase().as_str() {
            "1lqasok" => Status::Pass,
            "2lqasmoderate" => Status::Moderate,
            "3lqaspoor" => Status::Poor,
            "3lqasfail" => Status::Fail,
            "inscope" => Status::NoData,
            other => {
                warn!("unknown lqas status token {other:?}");
                Status::NoData
            }
        }
    }
}

// marked/checked >= 0.95 passes, > 0.90 warns, in integers
pub fn classify_im(checked: u64, marked: u64) -> Status {
    if checked == 0 {
        return Status::NoData;
    }
    let marked = u128::from(marked) * 100;
    let checked = u128::from(checked);
    if marked >= checked * 95 {
        Status::Pass
    } else if marked > checked * 90 {
        Status::Warning
    } else {
        Status::Fail
    }
}

pub trait Classifier {
    fn classify(&self, record: &RoundDistrictData) -> Status;
}

impl Classifier for SurveyType {
    fn classify(&self, record: &RoundDistrictData) -> Status {
        match self {
            SurveyType::Im(_) => classify_im(record.total_child_checked, record.total_child_fmd),
            SurveyType::Lqas => record
                .status
                .as_deref()
                .map(Status::from_lqas_token)
                .unwrap_or(Status::NoData),
        }
    }
}
