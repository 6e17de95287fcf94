/// Coarse lifecycle of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No base image has been loaded yet.
    #[default]
    Empty,
    /// An image is loaded and no generation request is outstanding.
    Ready,
    /// A generation request is in flight; new requests and image loads are refused.
    Generating,
}

impl SessionPhase {
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Generating)
    }
}
