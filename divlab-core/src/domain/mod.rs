//! Domain types for DivLab

pub mod bar;
pub mod interval;
pub mod series;

pub use bar::Bar;
pub use interval::{Interval, IntervalError, Period};
pub use series::PriceSeries;
