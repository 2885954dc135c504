//! Title extraction from media directory and file names.
//!
//! Both extractors are pure: they never fail, they only decline to answer.
//! A `None` means the name did not match the expected convention.

pub mod episode;
pub mod path;
pub mod season;

pub use episode::{episode_title, DEFAULT_MAX_TITLE_LEN};
pub use path::{containing_dir_name, file_name, parent_dir, separator};
pub use season::season_title;
