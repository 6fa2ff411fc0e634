pub mod select;
pub mod terms;
