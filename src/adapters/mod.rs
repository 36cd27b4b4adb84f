// Adapters layer: concrete implementations of the domain ports.

pub mod ledger;
pub mod predictor;
pub mod storage;
