pub use commands::{CancelReadingCmd, CreateReadingCmd, EditReadingCmd, TransitionCmd};
pub use error::EngineError;
pub use ops::{Actor, Engine, EngineBuilder};
pub use readers::{ReaderProfile, ReaderStatus};
pub use readings::{
    Dispute, DisputeStatus, Reading, ReadingOption, ReadingStatus, SessionKind, TimeSpan,
};
pub use schedule::{Interval, WeeklySchedule};

mod commands;
mod error;
mod ops;
pub mod readers;
pub mod readings;
mod schedule;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
