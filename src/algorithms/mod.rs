// Grid algorithms shared by the segmentation, buffering and graph layers.
pub mod flood_fill;
pub mod line;
pub mod wall_buffer;
