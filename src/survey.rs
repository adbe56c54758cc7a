use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImKind {
    Global,
    Ihh,
    Ohh,
}

impl ImKind {
    pub fn slug(self) -> &'static str {
        match self {
            ImKind::Global => "imGlobal",
            ImKind::Ihh => "imIHH",
            ImKind::Ohh => "imOHH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurveyType {
    Lqas,
    Im(ImKind),
}

impl SurveyType {
    pub fn slug(self) -> &'static str {
        match self {
            SurveyType::Lqas => "lqas",
            SurveyType::Im(kind) => kind.slug(),
        }
    }

    /// Category sent to the options endpoints.
    pub fn category(self) -> &'static str {
        match self {
            SurveyType::Lqas => "lqas",
            SurveyType::Im(_) => "im",
        }
    }
}

impl FromStr for SurveyType {
    type Err = UnknownSurveyType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lqas" => Ok(SurveyType::Lqas),
            "imglobal" => Ok(SurveyType::Im(ImKind::Global)),
            "imihh" => Ok(SurveyType::Im(ImKind::Ihh)),
            "imohh" => Ok(SurveyType::Im(ImKind::Ohh)),
            _ => Err(UnknownSurveyType(value.to_string())),
        }
    }
}

impl fmt::Display for SurveyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Serialize for SurveyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSurveyType(pub String);

impl fmt::Display for UnknownSurveyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown survey type: {:?}", self.0)
    }
}

impl std::error::Error for UnknownSurveyType {}
