/// コアシステムモジュール
pub mod app_controller;
pub mod config_validation;
pub mod connection;
pub mod report;
pub mod reset_reason;
pub mod sampling;
pub mod schedule;

pub use app_controller::AppController;
pub use connection::{
    ConnectionManager, ConnectionOutcome, ConnectionState, LinkControl, LinkEvent, RetryBudget,
};
pub use report::{Delivery, HttpTransport, ReportEvent, Reporter, TransportError};
pub use reset_reason::ResetReason;
pub use sampling::{sample_battery, SampleChannel, SampleReading, SamplingError, VoltageSampler};
pub use schedule::{Clock, ScheduleClock};
