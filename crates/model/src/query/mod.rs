pub mod param;
pub mod sort;
pub mod term;
