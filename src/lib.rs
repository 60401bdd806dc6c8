//! catrock — compiles a small text music language into timed MIDI events and
//! plays them.

pub mod config;
pub mod dsl;
pub mod io;
pub mod play;
pub mod score;
