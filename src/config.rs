use crate::color::NonStandardPolicy;

/// Run options threaded from the CLI into [`crate::load`]: codel size, how
/// to treat non-standard colors, and logging verbosity.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub codel_size: u32,
    pub nonstandard: NonStandardPolicy,
    pub trace: bool,
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            codel_size: 1,
            nonstandard: NonStandardPolicy::White,
            trace: false,
            debug: false,
        }
    }
}

impl Options {
    /// The `log::LevelFilter` this configuration implies; `--trace` wins
    /// over `--debug`, matching the precedence `pieti --trace --debug`
    /// would intuitively expect (most verbose flag present wins).
    pub fn log_level(&self) -> log::LevelFilter {
        if self.trace {
            log::LevelFilter::Trace
        } else if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}
