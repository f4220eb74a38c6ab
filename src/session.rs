//! A running callout session: the store, the label id sequence and the
//! settings they were created with.

use crate::command::{self, Command, CommandContext, Dispatch};
use crate::config::CalloutConfig;
use crate::error::Result;
use crate::label::{LabelId, LabelIdAllocator};
use crate::raster::Rasterizer;
use crate::render_tree::RenderTree;
use crate::store::CalloutStore;
use crate::style::{LabelStyle, SetupField};
use crate::sync::{SyncReport, sync_frame};
use crate::world::{EntityId, Viewport, WorldModel};
use serde::{Deserialize, Serialize};

/// Everything a save needs to bring callouts back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub store: CalloutStore,
    pub ids: LabelIdAllocator,
}

#[derive(Debug)]
pub struct CalloutSession {
    config: CalloutConfig,
    store: CalloutStore,
    ids: LabelIdAllocator,
}

impl Default for CalloutSession {
    fn default() -> Self {
        Self::new(CalloutConfig::default())
    }
}

impl CalloutSession {
    pub fn new(config: CalloutConfig) -> Self {
        let store = CalloutStore::new(config.default_style.clone());
        CalloutSession {
            config,
            store,
            ids: LabelIdAllocator::new(),
        }
    }

    pub fn config(&self) -> &CalloutConfig {
        &self.config
    }

    pub fn store(&self) -> &CalloutStore {
        &self.store
    }

    pub fn ids(&self) -> &LabelIdAllocator {
        &self.ids
    }

    /// Writes `text` above `entity`, anchored at its current position.
    /// Does nothing if the world cannot place the entity.
    pub fn create_text(&mut self, world: &impl WorldModel, entity: EntityId, text: &str) -> Option<LabelId> {
        let Some(origin) = world.real_position(entity) else {
            log::debug!("{} has no position, dropping text {:?}", entity, text);
            return None;
        };
        self.store.create_text(entity, text, origin, &mut self.ids)
    }

    pub fn clear_text(&mut self, entity: EntityId) -> usize {
        self.store.clear_text(entity)
    }

    pub fn style(&self, entity: EntityId) -> Option<&LabelStyle> {
        self.store.style(entity)
    }

    pub fn style_mut(&mut self, entity: EntityId) -> &mut LabelStyle {
        self.store.style_mut(entity)
    }

    /// Applies one style field. On error the style is left as it was.
    pub fn setup(&mut self, entity: EntityId, field: SetupField, value: &str) -> Result<()> {
        self.store.style_mut(entity).set(field, value)?;
        log::debug!("{} set {} = {:?}", entity, field, value);
        Ok(())
    }

    pub fn despawn(&mut self, entity: EntityId) {
        self.store.despawn(entity);
    }

    /// Runs the per-frame pass. Call once per frame after the host has updated
    /// its character visuals.
    ///
    /// # Parameters
    ///
    /// - `tree`: the map scene; text visuals are attached to and detached from it
    /// - `viewport`: camera of the host map, used by sliding labels
    /// - `rasterizer`: draws new text visuals, e.g. `BitmapFont`
    ///
    /// # Returns
    ///
    /// What the pass did, see `SyncReport`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use callouts::map::{PLAYER, TileMap};
    /// use callouts::{BitmapFont, CalloutSession, RenderTree, WorldPoint};
    ///
    /// let mut map = TileMap::default();
    /// map.place_player(WorldPoint::new(2.0, 2.0));
    /// let mut session = CalloutSession::default();
    /// let mut tree = RenderTree::new();
    /// let mut font = BitmapFont::new();
    ///
    /// session.create_text(&map, PLAYER, "Hello");
    /// map.refresh_sprites(&mut tree);
    /// let report = session.sync(&mut tree, &map, &mut font);
    /// assert_eq!(report.materialized, 1);
    /// ```
    pub fn sync(
        &mut self,
        tree: &mut RenderTree,
        viewport: &impl Viewport,
        rasterizer: &mut impl Rasterizer,
    ) -> SyncReport {
        sync_frame(&mut self.store, tree, viewport, rasterizer, self.config.text_z)
    }

    /// Parses and runs the arguments of one callout command
    pub fn execute(&mut self, world: &impl WorldModel, ctx: &CommandContext, args: &[&str]) -> Result<Dispatch> {
        let command = Command::parse(args)?;
        command::dispatch(self, world, ctx, &command)
    }

    /// Entry point for the host's plugin command hook. Commands under any other
    /// keyword are left alone.
    pub fn execute_plugin_command(
        &mut self,
        world: &impl WorldModel,
        ctx: &CommandContext,
        keyword: &str,
        args: &[&str],
    ) -> Result<Dispatch> {
        if !keyword.eq_ignore_ascii_case(&self.config.command_keyword) {
            return Ok(Dispatch::Ignored);
        }
        self.execute(world, ctx, args)
    }

    /// Runs a whitespace-separated command line, keyword first
    pub fn execute_line(&mut self, world: &impl WorldModel, ctx: &CommandContext, line: &str) -> Result<Dispatch> {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(Dispatch::Ignored);
        };
        let args: Vec<&str> = tokens.collect();
        self.execute_plugin_command(world, ctx, keyword, &args)
    }

    /// Forgets every entity's style and labels, for a freshly loaded world.
    /// Their text visuals are detached from `tree`; character visuals stay.
    pub fn load_world(&mut self, tree: &mut RenderTree) {
        let detached = tree.clear_texts();
        log::info!(
            "callouts reset: {} entities dropped, {} text visuals detached",
            self.store.entity_count(),
            detached
        );
        self.store = CalloutStore::new(self.config.default_style.clone());
        self.ids.reset();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            store: self.store.clone(),
            ids: self.ids.clone(),
        }
    }

    /// Restores a snapshot. The current text visuals are detached from `tree`
    /// and the restored labels get new ones on the next frame pass.
    pub fn restore(&mut self, snapshot: SessionSnapshot, tree: &mut RenderTree) {
        tree.clear_texts();
        self.store = snapshot.store;
        self.ids = snapshot.ids;
    }
}
