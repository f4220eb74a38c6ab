//! Callouts: short-lived text labels attached to entities on a tile map.
//!
//! Scripts create, style and erase labels through the command surface
//! (`command`, `session`). Once per frame `CalloutSession::sync` reconciles
//! every label with the render tree: it rasterizes new labels, moves them with
//! their entity or slides them away from where they were written, counts down
//! their lifetime and removes what has expired.
//!
//! The host supplies entity lookup and camera conversion through the
//! `WorldModel` and `Viewport` traits. `map::TileMap` is a small host used by
//! the script runner and the tests.

pub mod color;
pub mod command;
pub mod config;
pub mod error;
pub mod expr;
pub mod label;
pub mod map;
#[cfg(feature = "sdl")]
pub mod present;
pub mod raster;
pub mod render_tree;
pub mod session;
pub mod store;
pub mod style;
pub mod sync;
pub mod world;

pub use command::{Command, CommandContext, Dispatch, EntityRef};
pub use config::CalloutConfig;
pub use error::{CalloutError, Result};
pub use label::{Label, LabelId};
pub use raster::{BitmapFont, Rasterizer, TextBitmap};
pub use render_tree::RenderTree;
pub use session::{CalloutSession, SessionSnapshot};
pub use style::{LabelStyle, Lifetime, SetupField, SlideDirection};
pub use sync::SyncReport;
pub use world::{EntityId, Viewport, WorldModel, WorldPoint};
