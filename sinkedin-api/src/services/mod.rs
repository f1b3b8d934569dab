pub mod compose;
pub mod counters;
pub mod reads;
pub mod toggle;
