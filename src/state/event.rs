#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoadImage,
    BeginRequest,
    ResolveRequest,
}
