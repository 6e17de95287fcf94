//! Edit session controller.
//!
//! Owns the history, the transient tool state and the single in-flight
//! generation slot. Every failure below this layer ends up in one
//! user-visible error slot; preconditions that do not hold make an action
//! decline without touching any state.

mod display;
mod tools;

pub use display::DisplayCache;
pub use tools::ToolMode;

use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use image::RgbaImage;

use crate::compositor::{BrushState, MaskCompositor};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::generation::{
    self, GenerationError, GenerationRequest, GenerationResult, GenerativeService, PropAsset,
    RequestKind,
};
use crate::geometry::{DisplayPoint, DisplayRect, DisplaySize, NaturalPoint};
use crate::history::{History, HistoryAction};
use crate::mapper::{self, CanvasScale};
use crate::pipeline::{self, AdjustmentField, AdjustmentVector};
use crate::snapshot::ImageSnapshot;
use crate::state::{SessionEvent, SessionPhase, StateMachine};
use crate::storage::SnapshotStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// A precondition did not hold; nothing changed.
    Declined,
    /// The action failed and [`EditSession::error`] holds the message.
    Failed,
}

/// A crop rectangle drawn over the crop widget's rendering of the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    pub rect: DisplayRect,
    pub displayed_size: DisplaySize,
}

struct InFlightRequest {
    kind: RequestKind,
    receiver: mpsc::Receiver<GenerationResult<ImageSnapshot>>,
}

struct RestoreSession {
    compositor: MaskCompositor,
    scale: CanvasScale,
    last_point: Option<DisplayPoint>,
}

fn declined(reason: &'static str) -> ActionOutcome {
    tracing::debug!(reason, "action declined");
    ActionOutcome::Declined
}

pub struct EditSession {
    history: History,
    phase: StateMachine,
    service: Arc<dyn GenerativeService>,
    in_flight: Option<InFlightRequest>,
    tool: ToolMode,
    brush: BrushState,
    crop: Option<CropSelection>,
    hotspot: Option<NaturalPoint>,
    props: Vec<PropAsset>,
    adjustments: AdjustmentVector,
    comparing: bool,
    restore: Option<RestoreSession>,
    display: DisplayCache,
    error: Option<String>,
}

impl EditSession {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self::with_config(service, &AppConfig::default())
    }

    pub fn with_config(service: Arc<dyn GenerativeService>, config: &AppConfig) -> Self {
        Self {
            history: History::new(),
            phase: StateMachine::new(),
            service,
            in_flight: None,
            tool: ToolMode::default(),
            brush: config.brush(),
            crop: None,
            hotspot: None,
            props: Vec::new(),
            adjustments: AdjustmentVector::ZERO,
            comparing: false,
            restore: None,
            display: DisplayCache::default(),
            error: None,
        }
    }

    fn fail(&mut self, err: impl Into<AppError>) -> ActionOutcome {
        let message = err.into().user_message();
        tracing::warn!(%message, "action failed");
        self.error = Some(message);
        ActionOutcome::Failed
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<&ImageSnapshot> {
        self.history.current()
    }

    pub fn original(&self) -> Option<&ImageSnapshot> {
        self.history.original()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.state()
    }

    pub fn is_busy(&self) -> bool {
        self.phase.state().is_busy()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn brush(&self) -> BrushState {
        self.brush
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush.set_size(size);
    }

    pub fn set_brush_opacity(&mut self, opacity: u8) {
        self.brush.set_opacity(opacity);
    }

    // Base image lifecycle.

    pub fn load_image(&mut self, bytes: &[u8]) -> ActionOutcome {
        if !self.phase.can_transition(SessionEvent::LoadImage) {
            return declined("generation in progress");
        }
        match ImageSnapshot::from_encoded(bytes) {
            Ok(snapshot) => self.install_base_image(snapshot),
            Err(err) => self.fail(err),
        }
    }

    pub fn load_data_url(&mut self, data_url: &str) -> ActionOutcome {
        if !self.phase.can_transition(SessionEvent::LoadImage) {
            return declined("generation in progress");
        }
        match ImageSnapshot::from_data_url(data_url) {
            Ok(snapshot) => self.install_base_image(snapshot),
            Err(err) => self.fail(err),
        }
    }

    fn install_base_image(&mut self, snapshot: ImageSnapshot) -> ActionOutcome {
        if let Err(err) = self.phase.transition(SessionEvent::LoadImage) {
            return self.fail(err);
        }
        let size = snapshot.size();
        tracing::info!(
            snapshot = %snapshot.id(),
            width = size.width,
            height = size.height,
            "base image loaded"
        );
        self.history.load(snapshot);
        self.hotspot = None;
        self.props.clear();
        self.crop = None;
        self.restore = None;
        self.comparing = false;
        self.adjustments.reset_all();
        self.display.clear();
        self.error = None;
        if self.tool.requires_edits() {
            self.tool = ToolMode::Retouch;
        }
        ActionOutcome::Applied
    }

    fn commit_snapshot(&mut self, snapshot: ImageSnapshot) -> ActionOutcome {
        tracing::info!(snapshot = %snapshot.id(), "snapshot appended");
        self.history.append(snapshot);
        self.after_history_change();
        ActionOutcome::Applied
    }

    fn after_history_change(&mut self) {
        self.crop = None;
        if self.restore.take().is_some() {
            let _ = self.begin_restore_session();
        }
    }

    // Tool modes.

    pub fn can_use_tool(&self, mode: ToolMode) -> bool {
        !mode.requires_edits() || self.history.has_edits()
    }

    pub fn set_tool(&mut self, mode: ToolMode) -> ActionOutcome {
        if mode == self.tool && (mode != ToolMode::Restore || self.restore.is_some()) {
            return ActionOutcome::Applied;
        }
        if !self.can_use_tool(mode) {
            return declined("tool needs at least one edit");
        }
        if self.tool == ToolMode::Crop {
            self.crop = None;
        }
        if self.restore.take().is_some() {
            tracing::debug!("restore session discarded");
        }
        self.tool = mode;
        if mode == ToolMode::Restore {
            return self.begin_restore_session();
        }
        ActionOutcome::Applied
    }

    // History navigation.

    pub fn undo(&mut self) -> ActionOutcome {
        self.navigate(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> ActionOutcome {
        self.navigate(HistoryAction::Redo)
    }

    pub fn reset_to_original(&mut self) -> ActionOutcome {
        self.navigate(HistoryAction::ResetToOriginal)
    }

    fn navigate(&mut self, action: HistoryAction) -> ActionOutcome {
        if self.is_busy() {
            return declined("generation in progress");
        }
        if !self.history.navigate(action) {
            return declined(action.unavailable_message());
        }
        self.after_history_change();
        ActionOutcome::Applied
    }

    // Compare.

    pub fn press_compare(&mut self) -> ActionOutcome {
        if self.history.original().is_none() {
            return declined("no image loaded");
        }
        self.comparing = true;
        ActionOutcome::Applied
    }

    pub fn release_compare(&mut self) {
        self.comparing = false;
    }

    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    /// The snapshot to show: the original while compare is held, otherwise the current one.
    pub fn displayed(&self) -> Option<&ImageSnapshot> {
        if self.comparing {
            self.history.original()
        } else {
            self.history.current()
        }
    }

    pub fn display_pixels(&mut self) -> Option<Arc<RgbaImage>> {
        let snapshot = self.displayed()?.clone();
        match self.display.pixels_for(&snapshot) {
            Ok(pixels) => Some(pixels),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    // Hotspot and props for localized edits.

    pub fn set_hotspot(&mut self, pointer: DisplayPoint, client: DisplaySize) -> ActionOutcome {
        if self.tool != ToolMode::Retouch {
            return declined("hotspot needs retouch mode");
        }
        let Some(current) = self.history.current() else {
            return declined("no image loaded");
        };
        match mapper::pointer_to_natural(current.size(), client, pointer) {
            Some(point) => {
                tracing::debug!(x = point.x, y = point.y, "hotspot set");
                self.hotspot = Some(point);
                ActionOutcome::Applied
            }
            None => declined("pointer outside image"),
        }
    }

    pub fn hotspot(&self) -> Option<NaturalPoint> {
        self.hotspot
    }

    pub fn clear_hotspot(&mut self) {
        self.hotspot = None;
    }

    /// Where to draw the hotspot marker inside an element of size `client`.
    pub fn hotspot_marker(&self, client: DisplaySize) -> Option<DisplayPoint> {
        let hotspot = self.hotspot?;
        let current = self.history.current()?;
        mapper::natural_to_display(current.size(), client, hotspot)
    }

    pub fn add_prop(&mut self, bytes: &[u8]) -> ActionOutcome {
        if self.is_busy() {
            return declined("generation in progress");
        }
        match ImageSnapshot::from_encoded(bytes) {
            Ok(image) => {
                self.props.push(PropAsset { image });
                ActionOutcome::Applied
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn remove_prop(&mut self, index: usize) -> bool {
        if self.is_busy() || index >= self.props.len() {
            return false;
        }
        self.props.remove(index);
        true
    }

    pub fn props(&self) -> &[PropAsset] {
        &self.props
    }

    // Generation requests.

    pub fn request_retouch(&mut self, directive: &str) -> ActionOutcome {
        let Some(hotspot) = self.hotspot else {
            return declined("no hotspot selected");
        };
        let Some((image, directive)) = self.request_inputs(directive) else {
            return declined("request preconditions not met");
        };
        self.start_request(GenerationRequest::Retouch {
            image,
            directive,
            hotspot,
            references: self.props.clone(),
        })
    }

    pub fn request_filter(&mut self, directive: &str) -> ActionOutcome {
        let Some((image, directive)) = self.request_inputs(directive) else {
            return declined("request preconditions not met");
        };
        self.start_request(GenerationRequest::Filter { image, directive })
    }

    pub fn request_adjustment(&mut self, directive: &str) -> ActionOutcome {
        let Some((image, directive)) = self.request_inputs(directive) else {
            return declined("request preconditions not met");
        };
        self.start_request(GenerationRequest::Adjustment { image, directive })
    }

    fn request_inputs(&self, directive: &str) -> Option<(ImageSnapshot, String)> {
        if !self.phase.can_transition(SessionEvent::BeginRequest) {
            return None;
        }
        let directive = directive.trim();
        if directive.is_empty() {
            return None;
        }
        let image = self.history.current()?.clone();
        Some((image, directive.to_string()))
    }

    fn start_request(&mut self, request: GenerationRequest) -> ActionOutcome {
        if let Err(err) = self.phase.transition(SessionEvent::BeginRequest) {
            tracing::debug!(%err, "request refused");
            return ActionOutcome::Declined;
        }
        self.error = None;
        let kind = request.kind();
        let service = Arc::clone(&self.service);
        let receiver = generation::spawn_worker_action(move || {
            generation::run_request(service.as_ref(), &request)
        });
        self.in_flight = Some(InFlightRequest { kind, receiver });
        ActionOutcome::Applied
    }

    /// Applies the outstanding request's result if it has arrived.
    pub fn poll_generation(&mut self) -> Option<ActionOutcome> {
        let result = match self.in_flight.as_ref()?.receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(GenerationError::WorkerDisconnected),
        };
        Some(self.finish_request(result))
    }

    /// Blocks until the outstanding request resolves.
    pub fn wait_generation(&mut self) -> Option<ActionOutcome> {
        let result = self
            .in_flight
            .as_ref()?
            .receiver
            .recv()
            .unwrap_or(Err(GenerationError::WorkerDisconnected));
        Some(self.finish_request(result))
    }

    fn finish_request(&mut self, result: GenerationResult<ImageSnapshot>) -> ActionOutcome {
        let Some(request) = self.in_flight.take() else {
            return ActionOutcome::Declined;
        };
        if let Err(err) = self.phase.transition(SessionEvent::ResolveRequest) {
            return self.fail(err);
        }
        self.props.clear();
        match result {
            Ok(snapshot) => {
                tracing::info!(kind = request.kind.label(), "generation applied");
                if request.kind == RequestKind::Retouch {
                    self.hotspot = None;
                }
                self.commit_snapshot(snapshot)
            }
            Err(err) => self.fail(err),
        }
    }

    // Crop.

    pub fn set_crop_selection(
        &mut self,
        rect: DisplayRect,
        displayed_size: DisplaySize,
    ) -> ActionOutcome {
        if self.tool != ToolMode::Crop {
            return declined("crop needs crop mode");
        }
        self.crop = Some(CropSelection {
            rect,
            displayed_size,
        });
        ActionOutcome::Applied
    }

    pub fn crop_selection(&self) -> Option<CropSelection> {
        self.crop
    }

    pub fn clear_crop_selection(&mut self) {
        self.crop = None;
    }

    pub fn can_apply_crop(&self) -> bool {
        self.history.current().is_some()
            && self
                .crop
                .is_some_and(|selection| selection.rect.has_area())
    }

    pub fn apply_crop(&mut self) -> ActionOutcome {
        if !self.can_apply_crop() {
            return declined("no completed crop rectangle");
        }
        let (Some(selection), Some(current)) = (self.crop, self.history.current()) else {
            return declined("no completed crop rectangle");
        };
        let natural_size = current.size();
        match pipeline::extract_crop(
            current,
            selection.rect,
            selection.displayed_size,
            natural_size,
        ) {
            Ok(snapshot) => {
                self.hotspot = None;
                self.commit_snapshot(snapshot)
            }
            Err(err) => self.fail(err),
        }
    }

    // Manual adjustments.

    pub fn adjustments(&self) -> &AdjustmentVector {
        &self.adjustments
    }

    pub fn set_adjustment(&mut self, field: AdjustmentField, value: i32) {
        self.adjustments.set(field, value);
    }

    pub fn reset_adjustment(&mut self, field: AdjustmentField) {
        self.adjustments.reset(field);
    }

    pub fn reset_adjustments(&mut self) {
        self.adjustments.reset_all();
    }

    /// False while nothing is set or while any preview-only field is non-zero.
    pub fn can_commit_adjustments(&self) -> bool {
        self.history.current().is_some()
            && !self.adjustments.is_zero()
            && self.adjustments.unbaked_changes().is_empty()
    }

    pub fn preview_adjustments(&mut self) -> Option<RgbaImage> {
        let current = self.history.current()?.clone();
        match self.display.pixels_for(&current) {
            Ok(pixels) => Some(pipeline::render_preview(&pixels, &self.adjustments)),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    pub fn commit_adjustments(&mut self) -> ActionOutcome {
        if !self.can_commit_adjustments() {
            return declined("adjustments cannot be committed");
        }
        let Some(current) = self.history.current() else {
            return declined("no image loaded");
        };
        match pipeline::apply_adjustments(current, &self.adjustments) {
            Ok(snapshot) => {
                self.adjustments.reset_all();
                self.commit_snapshot(snapshot)
            }
            Err(err) => self.fail(err),
        }
    }

    // Restore brush.

    fn begin_restore_session(&mut self) -> ActionOutcome {
        let (Some(current), Some(original)) = (self.history.current(), self.history.original())
        else {
            return declined("no image loaded");
        };
        match MaskCompositor::begin_session(current, original) {
            Ok(compositor) => {
                self.restore = Some(RestoreSession {
                    compositor,
                    scale: CanvasScale::IDENTITY,
                    last_point: None,
                });
                ActionOutcome::Applied
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn is_restore_active(&self) -> bool {
        self.restore.is_some()
    }

    /// Records the restore canvas's on-screen size so pointer positions can be scaled.
    pub fn set_restore_display_size(&mut self, displayed: DisplaySize) -> ActionOutcome {
        let Some(restore) = self.restore.as_mut() else {
            return declined("restore canvas not active");
        };
        match CanvasScale::new(restore.compositor.size(), displayed) {
            Some(scale) => {
                restore.scale = scale;
                ActionOutcome::Applied
            }
            None => declined("restore canvas has no size"),
        }
    }

    pub fn restore_pointer_down(&mut self, point: DisplayPoint) -> ActionOutcome {
        if !point.is_finite() {
            return declined("pointer position is not finite");
        }
        let brush = self.brush;
        let Some(restore) = self.restore.as_mut() else {
            return declined("restore canvas not active");
        };
        restore
            .compositor
            .paint_stroke(point, point, &brush, restore.scale);
        restore.last_point = Some(point);
        ActionOutcome::Applied
    }

    pub fn restore_pointer_move(&mut self, point: DisplayPoint) -> ActionOutcome {
        if !point.is_finite() {
            return declined("pointer position is not finite");
        }
        let brush = self.brush;
        let Some(restore) = self.restore.as_mut() else {
            return declined("restore canvas not active");
        };
        let Some(from) = restore.last_point else {
            return declined("no stroke in progress");
        };
        restore
            .compositor
            .paint_stroke(from, point, &brush, restore.scale);
        restore.last_point = Some(point);
        ActionOutcome::Applied
    }

    pub fn restore_pointer_up(&mut self) {
        if let Some(restore) = self.restore.as_mut() {
            restore.last_point = None;
        }
    }

    pub fn restore_composite(&self) -> Option<&RgbaImage> {
        self.restore
            .as_ref()
            .map(|restore| restore.compositor.composite())
    }

    /// On-screen diameter of the brush cursor over the restore canvas.
    pub fn brush_cursor_diameter(&self) -> Option<f64> {
        self.restore.as_ref().map(|restore| {
            restore
                .scale
                .brush_cursor_diameter(f64::from(self.brush.size()))
        })
    }

    /// Bakes the composite into history and returns to retouch mode.
    pub fn apply_restore(&mut self) -> ActionOutcome {
        let Some(restore) = self.restore.take() else {
            return self.fail(AppError::CanvasNotReady);
        };
        if !restore.compositor.has_strokes() {
            self.restore = Some(restore);
            return declined("nothing painted");
        }
        match restore.compositor.end_session() {
            Ok(snapshot) => {
                self.tool = ToolMode::Retouch;
                self.commit_snapshot(snapshot)
            }
            Err(err) => self.fail(err),
        }
    }

    // Download.

    pub fn export_png(&self) -> Option<Vec<u8>> {
        self.history
            .current()
            .map(|snapshot| snapshot.encoded().to_vec())
    }

    /// Writes the current snapshot through `storage` and returns the written path.
    pub fn save_current<S: SnapshotStorage>(&self, storage: &S) -> AppResult<PathBuf> {
        let current = self.history.current().ok_or(AppError::NoImage)?;
        Ok(storage.save_snapshot(current)?)
    }

    /// Like [`Self::save_current`], but reports failures through the error slot.
    pub fn download<S: SnapshotStorage>(&mut self, storage: &S) -> Option<PathBuf> {
        self.history.current()?;
        match self.save_current(storage) {
            Ok(path) => Some(path),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }
}
