pub mod accumulator;
pub mod conversation;
pub mod event;
pub mod turn;
