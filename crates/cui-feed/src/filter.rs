//! Tab to backend filter mapping

use std::fmt;
use std::str::FromStr;

use cui_api::FilterSpec;

/// A named view over the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Tasks,
    History,
    Archive,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Tasks, Tab::History, Tab::Archive];

    pub fn id(&self) -> &'static str {
        match self {
            Tab::Tasks => "tasks",
            Tab::History => "history",
            Tab::Archive => "archive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Tasks => "Tasks",
            Tab::History => "History",
            Tab::Archive => "Archive",
        }
    }

    pub fn filter(&self) -> FilterSpec {
        match self {
            Tab::Tasks => FilterSpec {
                archived: Some(false),
                has_continuation: Some(false),
            },
            Tab::History => FilterSpec {
                archived: None,
                has_continuation: Some(true),
            },
            Tab::Archive => FilterSpec {
                archived: Some(true),
                has_continuation: Some(false),
            },
        }
    }

    pub fn next(&self) -> Tab {
        match self {
            Tab::Tasks => Tab::History,
            Tab::History => Tab::Archive,
            Tab::Archive => Tab::Tasks,
        }
    }

    pub fn previous(&self) -> Tab {
        match self {
            Tab::Tasks => Tab::Archive,
            Tab::History => Tab::Tasks,
            Tab::Archive => Tab::History,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" => Ok(Tab::Tasks),
            "history" => Ok(Tab::History),
            "archive" => Ok(Tab::Archive),
            other => Err(format!("unknown tab: {}", other)),
        }
    }
}

/// Resolve a tab name to its filter. Unknown names resolve to no restriction.
pub fn resolve(tab: &str) -> FilterSpec {
    tab.parse::<Tab>()
        .map(|t| t.filter())
        .unwrap_or(FilterSpec::ALL)
}
