use num_bigint::BigInt;
use std::error;
use std::fmt;

/// Failure constructing a [`crate::PietCode`] from an image file: missing or
/// unreadable file, or a decode/dimension problem caught at load time.
#[derive(Debug)]
pub enum LoadError {
    Image(image::ImageError),
    ZeroCodelSize,
    BadDimensions { width: u32, height: u32, codel_size: u32 },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Image(e) => write!(f, "failed to decode image: {e}"),
            LoadError::ZeroCodelSize => write!(f, "codel size must be non-zero"),
            LoadError::BadDimensions { width, height, codel_size } => write!(
                f,
                "image dimensions {width}x{height} are not a multiple of codel size {codel_size}"
            ),
        }
    }
}

impl error::Error for LoadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            LoadError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        LoadError::Image(e)
    }
}

/// A skipped-instruction condition: stack underflow, division by zero,
/// overflow, and EOF on input are all silent no-ops. Every variant is traced
/// via `log::debug!` at the call site and never propagated out of
/// `PietVM::step`.
#[derive(Debug)]
pub enum ExecutionError {
    NotEnoughStack(usize, usize),
    IntegerOverflow,
    DivisionByZero,
    Io(std::io::Error),
    EncodeError(BigInt),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ExecutionError::*;

        match self {
            NotEnoughStack(requested, stack_len) => {
                write!(f, "insufficient stack length ({stack_len}); expected at least {requested}")
            }
            IntegerOverflow => write!(f, "integer overflow"),
            Io(e) => write!(f, "IO error: {e}"),
            DivisionByZero => write!(f, "division by zero"),
            EncodeError(num) => write!(f, "can't encode integer '{num}' as character"),
        }
    }
}

impl error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ExecutionError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(e: std::io::Error) -> Self {
        ExecutionError::Io(e)
    }
}
