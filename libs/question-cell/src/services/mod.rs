pub mod bank;
mod malaria;

pub use bank::QuestionBank;
