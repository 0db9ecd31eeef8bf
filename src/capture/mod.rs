// # Capture Module
//
// Invokes the external GStreamer pipeline against a negotiated PipeWire
// stream and decides which produced artifact counts as "the frame".

pub mod frames;

pub use frames::FrameCapture;
