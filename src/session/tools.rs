#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Retouch,
    Crop,
    Manual,
    FilterAdjust,
    StylisticFilter,
    Restore,
}

impl ToolMode {
    pub const ALL: [ToolMode; 6] = [
        Self::Retouch,
        Self::Crop,
        Self::Manual,
        Self::FilterAdjust,
        Self::StylisticFilter,
        Self::Restore,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Retouch => "Retouch",
            Self::Crop => "Crop",
            Self::Manual => "Manual",
            Self::FilterAdjust => "Adjust",
            Self::StylisticFilter => "Filters",
            Self::Restore => "Restore",
        }
    }

    /// Restore compares against the original, so it needs at least one edit.
    pub const fn requires_edits(self) -> bool {
        matches!(self, Self::Restore)
    }
}
