pub mod audio;
pub mod generation;
