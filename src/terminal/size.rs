//! Terminal size probing.
//!
//! No single query works everywhere: the ioctl path fails under piped
//! stdio, `stty` needs a tty on stdin, and some containers expose only
//! `LINES`/`COLUMNS`. [`SizeProber`] walks an ordered chain of probes and
//! takes the first answer, falling back to the last size it saw so a
//! total failure never crashes the render loop.

use std::fmt;
use std::fs::File;
use std::process::{Command, Stdio};

/// Terminal dimensions.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Number of rows.
    pub rows: u16,
    /// Number of columns.
    pub cols: u16,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Classic 80x24 terminal.
    pub const DEFAULT: Self = Self::new(24, 80);

    /// Whether either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Size({}x{})", self.cols, self.rows)
    }
}

/// One way of finding out the terminal size.
pub trait SizeProbe: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Query the size, or `None` if this probe cannot tell.
    fn probe(&self) -> Option<Size>;
}

/// Direct ioctl query through crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectProbe;

impl SizeProbe for DirectProbe {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn probe(&self) -> Option<Size> {
        crossterm::terminal::size()
            .ok()
            .map(|(cols, rows)| Size::new(rows, cols))
    }
}

/// A fixed size, used for the explicit override and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub Option<Size>);

impl SizeProbe for FixedProbe {
    fn name(&self) -> &'static str {
        "override"
    }

    fn probe(&self) -> Option<Size> {
        self.0
    }
}

/// Which device `stty` reads the size from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttyDevice {
    /// The process's stdout.
    Stdout,
    /// The controlling terminal, `/dev/tty`.
    Tty,
}

/// `stty size` against stdout or the controlling tty.
#[derive(Debug, Clone, Copy)]
pub struct SttyProbe(pub SttyDevice);

impl SizeProbe for SttyProbe {
    fn name(&self) -> &'static str {
        match self.0 {
            SttyDevice::Stdout => "stty-stdout",
            SttyDevice::Tty => "stty-tty",
        }
    }

    fn probe(&self) -> Option<Size> {
        let path = match self.0 {
            SttyDevice::Stdout => "/dev/stdout",
            SttyDevice::Tty => "/dev/tty",
        };
        let device = File::open(path).ok()?;
        let output = Command::new("stty")
            .arg("size")
            .stdin(device)
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_stty(&String::from_utf8_lossy(&output.stdout))
    }
}

/// `tput lines` / `tput cols`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TputProbe;

impl TputProbe {
    fn query(cap: &str) -> Option<u16> {
        let output = Command::new("tput")
            .arg(cap)
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }
}

impl SizeProbe for TputProbe {
    fn name(&self) -> &'static str {
        "tput"
    }

    fn probe(&self) -> Option<Size> {
        let rows = Self::query("lines")?;
        let cols = Self::query("cols")?;
        Some(Size::new(rows, cols))
    }
}

/// `LINES` and `COLUMNS` from the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvProbe;

impl SizeProbe for EnvProbe {
    fn name(&self) -> &'static str {
        "env"
    }

    fn probe(&self) -> Option<Size> {
        let rows = std::env::var("LINES").ok()?.trim().parse().ok()?;
        let cols = std::env::var("COLUMNS").ok()?.trim().parse().ok()?;
        Some(Size::new(rows, cols))
    }
}

/// Parse the `"<rows> <cols>"` line printed by `stty size`.
pub fn parse_stty(text: &str) -> Option<Size> {
    let mut parts = text.split_whitespace();
    let rows = parts.next()?.parse().ok()?;
    let cols = parts.next()?.parse().ok()?;
    Some(Size::new(rows, cols))
}

/// Ordered probe chain with a last-known-good fallback.
pub struct SizeProber {
    probes: Vec<Box<dyn SizeProbe>>,
    last_known: Size,
    last_source: &'static str,
}

impl SizeProber {
    /// Build a prober from an explicit chain.
    pub fn new(probes: Vec<Box<dyn SizeProbe>>) -> Self {
        Self {
            probes,
            last_known: Size::DEFAULT,
            last_source: "default",
        }
    }

    /// The standard chain: direct query, override, `stty` on stdout,
    /// `stty` on the tty, `tput`, then `LINES`/`COLUMNS`.
    pub fn standard(forced: Option<Size>) -> Self {
        Self::new(vec![
            Box::new(DirectProbe),
            Box::new(FixedProbe(forced)),
            Box::new(SttyProbe(SttyDevice::Stdout)),
            Box::new(SttyProbe(SttyDevice::Tty)),
            Box::new(TputProbe),
            Box::new(EnvProbe),
        ])
    }

    /// A prober that always reports `size`.
    pub fn fixed(size: Size) -> Self {
        Self::new(vec![Box::new(FixedProbe(Some(size)))])
    }

    /// Walk the chain and return the first usable answer.
    pub fn resolve(&mut self) -> Size {
        for probe in &self.probes {
            match probe.probe() {
                Some(size) if !size.is_empty() => {
                    if size != self.last_known || probe.name() != self.last_source {
                        tracing::debug!(probe = probe.name(), ?size, "terminal size resolved");
                    }
                    self.last_known = size;
                    self.last_source = probe.name();
                    return size;
                }
                _ => {}
            }
        }
        tracing::trace!(size = ?self.last_known, "all size probes failed, keeping last known");
        self.last_known
    }

    /// The most recently resolved size.
    pub const fn last_known(&self) -> Size {
        self.last_known
    }

    /// Replace the probe chain, keeping the last known size.
    pub fn set_probes(&mut self, probes: Vec<Box<dyn SizeProbe>>) {
        self.probes = probes;
    }
}

impl fmt::Debug for SizeProber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.probes.iter().map(|p| p.name()).collect();
        f.debug_struct("SizeProber")
            .field("probes", &names)
            .field("last_known", &self.last_known)
            .finish()
    }
}
