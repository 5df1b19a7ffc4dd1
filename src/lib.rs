pub mod api;
pub mod aws;
pub mod cli;
pub mod diagram;
pub mod engine;
pub mod error;
pub mod identity;
pub mod lambda;
pub mod notify;
pub mod secrets;
pub mod storage;
