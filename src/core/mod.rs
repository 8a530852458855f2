pub mod checkin;
pub mod companion;
pub mod directory;
pub mod journal;
pub mod offline;
pub mod recovery;
pub mod remote;
pub mod scoring;
pub mod session;
pub mod task;
