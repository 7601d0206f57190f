// Business domains
pub mod matching;
pub mod member;
