//! Custom widgets for the TUI

pub mod spinner;
pub mod task_list;
pub mod task_tabs;

pub use spinner::Spinner;
pub use task_list::{TaskList, TaskListState};
pub use task_tabs::TaskTabs;
