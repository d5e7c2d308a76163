use serde::{Deserialize, Serialize};

/// Completion status of a tracked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Done,
    #[default]
    Outstanding,
}

impl Status {
    /// Parse a status value from imported data.
    /// Only "done" (any case) counts as done; anything else is outstanding.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("done") {
            Self::Done
        } else {
            Self::Outstanding
        }
    }

    /// Capitalized label used in exports and listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Done => "Done",
            Self::Outstanding => "Outstanding",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Done => Self::Outstanding,
            Self::Outstanding => Self::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Status filter applied when viewing a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Done,
    Outstanding,
}

impl Filter {
    pub fn matches(&self, status: Status) -> bool {
        match self {
            Filter::All => true,
            Filter::Done => status == Status::Done,
            Filter::Outstanding => status == Status::Outstanding,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "all" => Some(Filter::All),
            "done" => Some(Filter::Done),
            "outstanding" => Some(Filter::Outstanding),
            _ => None,
        }
    }
}

/// Where a moved item lands relative to its drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}
