//! Draw-operation state machine: prepare, begin, bounded batches.

use std::time::{Duration, Instant};

use carve_geom::{BoundingBox, Vec3I};
use carve_map::{Block, BlockChangeContext, Map};
use thiserror::Error;

use crate::brush::Brush;
use crate::clipboard::Clipboard;
use crate::cursor::{DrawCursor, EllipsoidCursor, LineCursor, RegionCursor};
use crate::undo::UndoState;

/// Structural caller errors; soft rejection is `Ok(false)` from `prepare`
/// or `begin`, never an error.
#[derive(Debug, Error)]
pub enum DrawOpError {
    #[error("{kind} expects {expected} marks, got {got}")]
    WrongMarkCount {
        kind: DrawOpKind,
        expected: usize,
        got: usize,
    },
    #[error("prepare may only run once")]
    AlreadyPrepared,
    #[error("prepare must complete before begin")]
    NotPrepared,
    #[error("begin may only run once")]
    AlreadyBegun,
    #[error("operation was queued before begin succeeded")]
    NotBegun,
    #[error("clipboard holds no blocks")]
    EmptyClipboard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOpKind {
    Line,
    Ellipsoid,
    EllipsoidHollow,
    Sphere,
    SphereHollow,
    Paste,
    QuickPaste,
    Undo,
    Redo,
}

impl DrawOpKind {
    fn expected_marks(self) -> usize {
        match self {
            DrawOpKind::Undo | DrawOpKind::Redo => 0,
            _ => 2,
        }
    }
}

impl std::fmt::Display for DrawOpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DrawOpKind::Line => "Line",
            DrawOpKind::Ellipsoid => "Ellipsoid",
            DrawOpKind::EllipsoidHollow => "EllipsoidHollow",
            DrawOpKind::Sphere => "Sphere",
            DrawOpKind::SphereHollow => "SphereHollow",
            DrawOpKind::Paste => "Paste",
            DrawOpKind::QuickPaste => "QuickPaste",
            DrawOpKind::Undo => "Undo",
            DrawOpKind::Redo => "Redo",
        };
        f.write_str(name)
    }
}

/// Where block values come from. Replay is an explicit mode instead of the
/// operation posing as its own brush.
enum Mode {
    Brush(Box<dyn Brush>),
    Clipboard { clip: Clipboard, origin: Vec3I },
    Replay { journal: UndoState, index: usize },
}

/// Synchronous veto registry fired by `begin`; any listener returning
/// false cancels the operation before it mutates anything.
#[derive(Default)]
pub struct BeginHooks {
    hooks: Vec<Box<dyn FnMut(&DrawOperation) -> bool + Send>>,
}

impl BeginHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl FnMut(&DrawOperation) -> bool + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    fn allow(&mut self, op: &DrawOperation) -> bool {
        self.hooks.iter_mut().all(|h| h(op))
    }
}

/// One resumable block-painting job. Lifecycle:
/// `prepare` (once) -> `begin` (once) -> `draw_batch` until `is_done`.
/// A caller cancels by simply dropping the operation between batches.
pub struct DrawOperation {
    kind: DrawOpKind,
    mode: Mode,
    cursor: Option<DrawCursor>,
    marks: Vec<Vec3I>,
    bounds: BoundingBox,
    context: BlockChangeContext,
    blocks_total_estimate: u64,
    blocks_processed: u64,
    blocks_updated: u64,
    coords: Vec3I,
    prepared: bool,
    has_begun: bool,
    is_done: bool,
    start_time: Option<Instant>,
    max_batch_time: Duration,
    undo: UndoState,
}

impl DrawOperation {
    const DEFAULT_BATCH_TIME: Duration = Duration::from_millis(20);

    fn with_mode(kind: DrawOpKind, mode: Mode, context: BlockChangeContext) -> Self {
        Self {
            kind,
            mode,
            cursor: None,
            marks: Vec::new(),
            bounds: BoundingBox::default(),
            context,
            blocks_total_estimate: 0,
            blocks_processed: 0,
            blocks_updated: 0,
            coords: Vec3I::ZERO,
            prepared: false,
            has_begun: false,
            is_done: false,
            start_time: None,
            max_batch_time: Self::DEFAULT_BATCH_TIME,
            undo: UndoState::new(),
        }
    }

    pub fn line(brush: Box<dyn Brush>) -> Self {
        Self::with_mode(DrawOpKind::Line, Mode::Brush(brush), BlockChangeContext::DRAWN)
    }

    pub fn ellipsoid(brush: Box<dyn Brush>, hollow: bool) -> Self {
        let kind = if hollow {
            DrawOpKind::EllipsoidHollow
        } else {
            DrawOpKind::Ellipsoid
        };
        Self::with_mode(kind, Mode::Brush(brush), BlockChangeContext::DRAWN)
    }

    /// Sphere delegates to the ellipsoid fill after rewriting its marks
    /// into a radius box; see `prepare`.
    pub fn sphere(brush: Box<dyn Brush>, hollow: bool) -> Self {
        let kind = if hollow {
            DrawOpKind::SphereHollow
        } else {
            DrawOpKind::Sphere
        };
        Self::with_mode(kind, Mode::Brush(brush), BlockChangeContext::DRAWN)
    }

    pub fn paste(clip: Clipboard) -> Self {
        Self::with_mode(
            DrawOpKind::Paste,
            Mode::Clipboard {
                clip,
                origin: Vec3I::ZERO,
            },
            BlockChangeContext::DRAWN | BlockChangeContext::PASTED,
        )
    }

    /// Paste anchored at a single point: both marks collapse to mark 0.
    pub fn quick_paste(clip: Clipboard) -> Self {
        Self::with_mode(
            DrawOpKind::QuickPaste,
            Mode::Clipboard {
                clip,
                origin: Vec3I::ZERO,
            },
            BlockChangeContext::DRAWN | BlockChangeContext::PASTED,
        )
    }

    pub fn undo(journal: UndoState) -> Self {
        Self::with_mode(
            DrawOpKind::Undo,
            Mode::Replay { journal, index: 0 },
            BlockChangeContext::DRAWN | BlockChangeContext::UNDONE_SELF,
        )
    }

    pub fn redo(journal: UndoState) -> Self {
        Self::with_mode(
            DrawOpKind::Redo,
            Mode::Replay { journal, index: 0 },
            BlockChangeContext::DRAWN | BlockChangeContext::REDONE_SELF,
        )
    }

    /// Validate marks, fix bounds, build the cursor, and size the work
    /// estimate. `Ok(false)` means the operation cannot proceed with these
    /// marks (empty journal, region off the map); `Err` means the caller
    /// broke the contract.
    pub fn prepare(&mut self, map: &Map, marks: &[Vec3I]) -> Result<bool, DrawOpError> {
        if self.prepared {
            return Err(DrawOpError::AlreadyPrepared);
        }
        let expected = self.kind.expected_marks();
        if marks.len() != expected {
            return Err(DrawOpError::WrongMarkCount {
                kind: self.kind,
                expected,
                got: marks.len(),
            });
        }
        self.marks = marks.to_vec();

        let proceed = match self.kind {
            DrawOpKind::Line => {
                self.bounds = BoundingBox::from_corners(self.marks[0], self.marks[1]);
                // Lower-bound heuristic: the driving-axis extent.
                self.blocks_total_estimate = self.marks[0].chebyshev(self.marks[1]) as u64;
                self.cursor = Some(DrawCursor::Line(LineCursor::new(
                    self.marks[0],
                    self.marks[1],
                )));
                true
            }
            DrawOpKind::Sphere | DrawOpKind::SphereHollow => {
                // Radius box centered on mark 0. Each corner coordinate is
                // rounded independently, so a fractional radius may leave
                // the box asymmetric by one unit; that is the intended
                // behavior, not a rounding bug to fix.
                let c = self.marks[0];
                let r = c.distance_to(self.marks[1]);
                let lo = Vec3I::new(
                    (c.x as f64 - r).round() as i32,
                    (c.y as f64 - r).round() as i32,
                    (c.z as f64 - r).round() as i32,
                );
                let hi = Vec3I::new(
                    (c.x as f64 + r).round() as i32,
                    (c.y as f64 + r).round() as i32,
                    (c.z as f64 + r).round() as i32,
                );
                self.marks = vec![lo, hi];
                self.prepare_ellipsoid(self.kind == DrawOpKind::SphereHollow);
                true
            }
            DrawOpKind::Ellipsoid | DrawOpKind::EllipsoidHollow => {
                self.prepare_ellipsoid(self.kind == DrawOpKind::EllipsoidHollow);
                true
            }
            DrawOpKind::Paste | DrawOpKind::QuickPaste => self.prepare_paste(map)?,
            DrawOpKind::Undo | DrawOpKind::Redo => {
                let Mode::Replay { journal, .. } = &self.mode else {
                    unreachable!("undo/redo ops are always replay mode");
                };
                match journal.bounds() {
                    Some(b) => {
                        self.bounds = b;
                        self.blocks_total_estimate = journal.len() as u64;
                        true
                    }
                    // Nothing recorded; nothing to replay.
                    None => false,
                }
            }
        };
        self.prepared = true;
        Ok(proceed)
    }

    fn prepare_ellipsoid(&mut self, hollow: bool) {
        let bounds = BoundingBox::from_corners(self.marks[0], self.marks[1]);
        self.bounds = bounds;
        let (wx, wy, wz) = (
            bounds.width_x() as f64,
            bounds.width_y() as f64,
            bounds.width_z() as f64,
        );
        let fill = |x: f64, y: f64, z: f64| (std::f64::consts::PI / 6.0 * x * y * z).max(0.0);
        let estimate = if hollow {
            fill(wx, wy, wz) - fill(wx - 2.0, wy - 2.0, wz - 2.0)
        } else {
            fill(wx, wy, wz)
        };
        self.blocks_total_estimate = estimate.round() as u64;
        self.cursor = Some(DrawCursor::Ellipsoid(EllipsoidCursor::new(bounds, hollow)));
    }

    fn prepare_paste(&mut self, map: &Map) -> Result<bool, DrawOpError> {
        let (clip_dims, clip_volume) = match &self.mode {
            Mode::Clipboard { clip, .. } => (
                Vec3I::new(clip.sx as i32, clip.sy as i32, clip.sz as i32),
                clip.volume(),
            ),
            _ => unreachable!("paste ops are always clipboard mode"),
        };
        if clip_volume == 0 {
            return Err(DrawOpError::EmptyClipboard);
        }
        if self.kind == DrawOpKind::QuickPaste {
            // "Paste here", not "paste into this stretched region".
            self.marks[1] = self.marks[0];
        }
        let region = BoundingBox::from_corners(self.marks[0], self.marks[1]);
        // The region always covers at least one clipboard footprint,
        // anchored at the min corner; larger regions tile.
        let origin = region.min();
        let full = region.expand_to(origin + clip_dims - Vec3I::new(1, 1, 1));
        if !full.intersects(&map.bounds()) {
            return Ok(false);
        }
        if let Mode::Clipboard { origin: o, .. } = &mut self.mode {
            *o = origin;
        }
        self.bounds = full;
        self.blocks_total_estimate = full.volume();
        self.cursor = Some(DrawCursor::Region(RegionCursor::new(full)));
        Ok(true)
    }

    /// Fire the veto hooks and arm the operation. `Ok(false)` when a hook
    /// cancels; no drawing happens in that case.
    pub fn begin(&mut self, hooks: &mut BeginHooks) -> Result<bool, DrawOpError> {
        if !self.prepared {
            return Err(DrawOpError::NotPrepared);
        }
        if self.has_begun {
            return Err(DrawOpError::AlreadyBegun);
        }
        if !hooks.allow(self) {
            return Ok(false);
        }
        self.start_time = Some(Instant::now());
        self.has_begun = true;
        Ok(true)
    }

    /// Apply at most `max_blocks` mutations, stopping early when the
    /// wall-clock guard trips. Returns the number of blocks actually
    /// written; 0 forever once the coordinate stream is exhausted.
    pub fn draw_batch(&mut self, map: &mut Map, max_blocks: usize) -> usize {
        if self.is_done || !self.has_begun || max_blocks == 0 {
            return 0;
        }
        let deadline = Instant::now() + self.max_batch_time;
        let mut written = 0usize;
        while written < max_blocks {
            let target = match &mut self.mode {
                Mode::Brush(brush) => match self.cursor.as_mut().and_then(|c| c.next()) {
                    Some(p) => Some((p, brush.next_block(p, map))),
                    None => None,
                },
                Mode::Clipboard { clip, origin } => {
                    match self.cursor.as_mut().and_then(|c| c.next()) {
                        Some(p) => Some((p, Some(clip.get_tiled(*origin, p)))),
                        None => None,
                    }
                }
                Mode::Replay { journal, index } => match journal.get(*index) {
                    Some(entry) => {
                        // Advance past this entry before applying it, so an
                        // early return never replays it a second time.
                        *index += 1;
                        Some((entry.coords(), Some(entry.block)))
                    }
                    None => None,
                },
            };
            let Some((p, block)) = target else {
                self.is_done = true;
                break;
            };
            if self.draw_one_block(map, p, block) {
                written += 1;
            }
            if Instant::now() >= deadline {
                break;
            }
        }
        written
    }

    /// One coordinate visit. Counts as an update (and journals the prior
    /// value) only when the map actually changed; a declining brush or a
    /// same-value write is a visit, nothing more.
    fn draw_one_block(&mut self, map: &mut Map, p: Vec3I, block: Option<Block>) -> bool {
        self.coords = p;
        self.blocks_processed += 1;
        let Some(b) = block else {
            return false;
        };
        let Some(previous) = map.get(p) else {
            return false;
        };
        if !map.set(p, b) {
            return false;
        }
        self.undo.append(p, previous);
        self.blocks_updated += 1;
        true
    }

    pub fn kind(&self) -> DrawOpKind {
        self.kind
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn marks(&self) -> &[Vec3I] {
        &self.marks
    }

    pub fn context(&self) -> BlockChangeContext {
        self.context
    }

    pub fn blocks_total_estimate(&self) -> u64 {
        self.blocks_total_estimate
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    pub fn blocks_updated(&self) -> u64 {
        self.blocks_updated
    }

    pub fn coords(&self) -> Vec3I {
        self.coords
    }

    pub fn has_begun(&self) -> bool {
        self.has_begun
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    pub fn set_max_batch_time(&mut self, limit: Duration) {
        self.max_batch_time = limit;
    }

    /// Hand over the journal of prior values this operation overwrote.
    pub fn take_undo(&mut self) -> UndoState {
        std::mem::take(&mut self.undo)
    }
}
