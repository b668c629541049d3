//! Core engine: the balance → route → approve → bridge → wait loop.

pub mod allowance;
pub mod amount;
pub mod attempt;
pub mod availability;
pub mod receiver;
pub mod rounds;
pub mod transfer;
