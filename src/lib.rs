pub mod midi;
pub mod music;
pub mod pipeline;
pub mod preview;
pub mod raw;
pub mod validate;

// Utility modules
pub mod line_map;
