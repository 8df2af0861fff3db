//! The session lifecycle state machine.

/// The lifecycle state of one capture session.
///
/// Transitions are strictly ordered, with one loop-back edge:
///
/// ```text
/// Unattached → Attaching → Capturing → Stopping → Removed
///                  │
///                  └──→ Unattached   (attach failed)
/// ```
///
/// - **Unattached**: the process is known but has no session. This is
///   the state reported for any process id the table has no entry for.
/// - **Attaching**: a table entry exists and the capture backend has
///   been asked to start streaming.
/// - **Capturing**: the backend delivered a stream; the pump task is
///   decoding it.
/// - **Stopping**: teardown began; the control half has been taken and
///   the pump is being awaited.
/// - **Removed**: teardown finished and the entry is gone. Like
///   `Unattached`, never stored; the distinction only matters in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unattached,
    Attaching,
    Capturing,
    Stopping,
    Removed,
}

impl SessionState {
    /// The next state in the forward order, or `None` from `Removed`.
    ///
    /// The failure edge (`Attaching → Unattached`) is not part of the
    /// forward order; the table expresses it by dropping the entry.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unattached => Some(Self::Attaching),
            Self::Attaching => Some(Self::Capturing),
            Self::Capturing => Some(Self::Stopping),
            Self::Stopping => Some(Self::Removed),
            Self::Removed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is a valid forward step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// `true` while the session has a running pump (`Capturing`).
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    /// `true` for the states a table entry can actually hold.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Attaching | Self::Capturing | Self::Stopping)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unattached => "unattached",
            Self::Attaching => "attaching",
            Self::Capturing => "capturing",
            Self::Stopping => "stopping",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}
