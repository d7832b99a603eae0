//! Incremental, resumable block-drawing operations.
#![forbid(unsafe_code)]

mod brush;
mod clipboard;
mod cursor;
mod op;
mod player;
mod queue;
mod undo;

pub use brush::{Brush, CheckeredBrush, ReplaceBrush, SolidBrush};
pub use clipboard::Clipboard;
pub use op::{BeginHooks, DrawOpError, DrawOpKind, DrawOperation};
pub use player::Player;
pub use queue::{CompletedDraw, DrawQueue};
pub use undo::{UndoBlock, UndoState};
