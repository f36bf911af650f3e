pub mod access;
pub mod storage;
pub mod transaction;
