//! Per-frame label pass
//!
//! Once per frame, every entity with labels is visited and each label's visual
//! is reconciled with the label's state:
//!
//! 1. look up the entity's visual and the label's visual (either may be absent)
//! 2. create the label's visual if the label is live and the entity is visible
//! 3. reposition it: non-sliding labels follow the entity's visual, sliding
//!    labels move their anchor and stay on the world spot they were written at
//! 4. count down the label's lifetime
//! 5. tear down labels that are no longer active, visual first
//!
//! A missing visual is never an error. The pass runs every frame, so whatever
//! could not be done this frame is simply tried again on the next one.
//!
//! Apart from a world reset, this is the only place text visuals are created
//! or destroyed.

use crate::label::{Label, LabelId};
use crate::raster::{Rasterizer, TextRaster, bitmap_size};
use crate::render_tree::{Anchor, CharacterSprite, RenderTree, TextSprite};
use crate::store::CalloutStore;
use crate::style::LabelStyle;
use crate::world::{EntityId, Viewport};
use std::collections::HashSet;

/// Draw order of text visuals relative to the host's sprites
pub const DEFAULT_TEXT_Z: i32 = 9;

/// What one frame pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Text visuals created this frame
    pub materialized: usize,
    /// Labels removed (with their visuals, if any) this frame
    pub torn_down: usize,
    /// Labels still alive after the pass
    pub active: usize,
    /// Text visuals detached because their label is no longer in the store
    pub orphaned: usize,
}

/// Runs one frame of the label pass over every entity in `store`
///
/// # Parameters
///
/// - `store`: per-entity styles and labels; expired labels are removed from it
/// - `tree`: render tree holding the host's character visuals and the text visuals
/// - `viewport`: camera used to place sliding labels at their world origin
/// - `rasterizer`: draws a label's bitmap, called once per new visual
/// - `text_z`: draw order given to new text visuals
///
/// # Returns
///
/// A `SyncReport` counting the visuals created, the labels torn down and the
/// labels still alive. Text visuals left behind by labels that are no longer in
/// the store are detached too and counted as `orphaned`.
///
/// # Example
///
/// ```rust
/// use callouts::label::LabelIdAllocator;
/// use callouts::raster::BitmapFont;
/// use callouts::render_tree::{CharacterSprite, RenderTree};
/// use callouts::store::CalloutStore;
/// use callouts::sync::{DEFAULT_TEXT_Z, sync_frame};
/// use callouts::map::TileMap;
/// use callouts::{EntityId, WorldPoint};
///
/// let hero = EntityId(1);
/// let mut store = CalloutStore::default();
/// let mut ids = LabelIdAllocator::new();
/// let mut tree = RenderTree::new();
/// tree.attach_character(hero, CharacterSprite { x: 96.0, y: 144.0, height: 48.0 });
/// store.create_text(hero, "Hello", WorldPoint::new(2.0, 3.0), &mut ids);
///
/// let report = sync_frame(&mut store, &mut tree, &TileMap::default(), &mut BitmapFont::new(), DEFAULT_TEXT_Z);
/// assert_eq!(report.materialized, 1);
/// assert_eq!(tree.text_count(), 1);
/// ```
pub fn sync_frame(
    store: &mut CalloutStore,
    tree: &mut RenderTree,
    viewport: &impl Viewport,
    rasterizer: &mut impl Rasterizer,
    text_z: i32,
) -> SyncReport {
    let mut report = SyncReport::default();

    for (entity, record) in store.records_mut() {
        if record.labels.is_empty() {
            continue;
        }
        let character = tree.character(entity).copied();
        let style = &record.style;

        record.labels.sweep(|label| {
            if label.is_active() {
                if let Some(character) = character {
                    if tree.text(label.id()).is_none() && !label.is_expiring() {
                        let sprite = materialize(entity, label, style, &character, rasterizer, text_z);
                        tree.attach_text(sprite);
                        report.materialized += 1;
                    }
                    if let Some(sprite) = tree.text_mut(label.id()) {
                        reposition(label, sprite, style, &character, viewport);
                    }
                }
                label.tick();
            }

            if label.is_active() {
                report.active += 1;
                return true;
            }

            if tree.detach_text(label.id()).is_some() {
                log::debug!("{} tore down visual of {}", entity, label.id());
            }
            report.torn_down += 1;
            false
        });
    }

    store.prune_despawned();

    // Visuals whose label left the store without a teardown, e.g. a store swapped out
    // under a live tree
    if tree.text_count() > report.active {
        let live: HashSet<LabelId> = store
            .iter()
            .flat_map(|(_, record)| record.labels.iter().map(Label::id))
            .collect();
        let orphans = tree.retain_texts(|sprite| live.contains(&sprite.label));
        log::debug!("detached {} text visuals with no label", orphans);
        report.orphaned = orphans;
    }
    report
}

/// Builds the text visual for `label`, rasterized once with the entity's current style
fn materialize(
    entity: EntityId,
    label: &mut Label,
    style: &LabelStyle,
    character: &CharacterSprite,
    rasterizer: &mut impl Rasterizer,
    z: i32,
) -> TextSprite {
    label.set_height_hint(character.height);
    let (width, height) = bitmap_size(label.text(), style.font_size, style.outline_width);
    let bitmap = rasterizer.draw_text(&TextRaster {
        text: label.text(),
        width,
        height,
        font_face: &style.font_face,
        font_size: style.font_size,
        italic: style.italic,
        color: &style.color,
        outline_color: &style.outline_color,
        outline_width: style.outline_width,
        alpha: style.alpha,
    });
    log::debug!("{} materialized {} ({}x{})", entity, label.id(), width, height);

    TextSprite {
        label: label.id(),
        owner: entity,
        anchor: Anchor {
            x: label.left,
            y: label.top,
        },
        x: character.x,
        y: character.y - character.height,
        z,
        bitmap,
    }
}

/// Moves a label's visual for this frame.
///
/// The branch is chosen by the slide direction the label was created with; the
/// speed is read from the entity's style as it is now.
fn reposition(
    label: &mut Label,
    sprite: &mut TextSprite,
    style: &LabelStyle,
    character: &CharacterSprite,
    viewport: &impl Viewport,
) {
    match label.slide() {
        None => {
            sprite.x = character.x;
            sprite.y = character.y - character.height;
        }
        Some(direction) => {
            label.advance_slide(style.slide_speeds.get(direction));
            let origin = viewport.screen_point(label.origin());
            sprite.x = origin.x;
            sprite.y = origin.y - character.height;
            sprite.anchor = Anchor {
                x: label.left,
                y: label.top,
            };
        }
    }
}
