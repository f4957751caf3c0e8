mod suffix;

pub use suffix::{match_suffix, THIRD_LEVEL_SUFFIX};
