mod recorder;
mod time_series;

pub use recorder::Recorder;
pub use time_series::TimeSeriesComponent;
