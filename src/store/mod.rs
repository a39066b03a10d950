pub mod daily;

pub use daily::DailySnapshotStore;
