pub mod candidate;
pub mod loudness;
pub mod track;
