pub mod sorter;

pub use sorter::{run_on_task, sort_on_task, sort_sequence, sort_with_mode, SortMode};
