//! Terminal plumbing: size probing, escape-sequence output and the
//! raw-mode session guard.

mod output;
mod session;
mod size;

pub use output::{OutputBuffer, CLEAR_AND_HOME, CLEAR_TO_EOL, MOUSE_OFF, MOUSE_ON};
pub use session::TerminalSession;
pub use size::{
    parse_stty, DirectProbe, EnvProbe, FixedProbe, Size, SizeProbe, SizeProber, SttyDevice,
    SttyProbe, TputProbe,
};
