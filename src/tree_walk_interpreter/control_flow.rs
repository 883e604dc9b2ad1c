use super::ExecutionErrorKind;

/// What ends a run early and hands control back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostSignal {
    /// `openfile`: the host asks for a path and runs that file.
    RequestFilePath,
    /// `bussin`: end the process successfully.
    Exit,
}

/// Anything that stops evaluation early and climbs back to `interpret`.
#[derive(Debug)]
pub(super) enum Unwind {
    Error(ExecutionErrorKind),
    Signal(HostSignal),
}

impl From<ExecutionErrorKind> for Unwind {
    fn from(kind: ExecutionErrorKind) -> Self {
        Unwind::Error(kind)
    }
}
