pub mod calendar;
pub mod compose;
pub mod model;
pub mod snowflake;
pub mod util;
pub mod views;
