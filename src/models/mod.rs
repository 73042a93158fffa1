pub mod attempt;
pub mod user;
