pub mod audio;
pub mod synthesis;
