pub mod time_util;
pub mod units;
