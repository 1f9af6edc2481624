//! Device backends
//!
//! [`wgpu`] drives a real GPU; [`recording`] logs every call instead.
//! [`programs`] holds the built-in program descriptors both compile.

pub mod programs;
pub mod recording;
pub mod wgpu;

pub use self::recording::{
    Command, CommandLog, RecordingCompiler, RecordingDevice, RecordingProgram,
};
pub use self::wgpu::{validate_wgsl, WgpuDevice, WgpuProgram, WgpuShaderCompiler};
