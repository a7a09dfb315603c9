use std::collections::TryReserveError;

use crate::geometry::InvalidGeometry;

#[derive(Debug)]
pub enum Error {
    Geometry(InvalidGeometry),
    Allocation(TryReserveError),
    Trace(String),
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Geometry(e) => f.write_fmt(format_args!("invalid cache geometry: {e}")),
            Error::Allocation(e) => f.write_fmt(format_args!("failed to allocate cache lines: {e}")),
            Error::Trace(e) => f.write_fmt(format_args!("failed to parse address trace: {e}")),
            Error::Io(e) => f.write_fmt(format_args!("failed to read address trace: {e}")),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Geometry(e) => Some(e),
            Error::Allocation(e) => Some(e),
            Error::Trace(_) => None,
            Error::Io(e) => Some(e),
        }
    }
}

impl From<InvalidGeometry> for Error {
    fn from(e: InvalidGeometry) -> Self {
        Error::Geometry(e)
    }
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Error::Allocation(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
