//! Render tree of the map scene
//!
//! Holds the host's character visuals and the text visuals created for labels.
//! Both kinds are indexed as they are attached and detached, so the frame pass
//! finds an entity's visual or a label's visual with one lookup instead of
//! scanning every child.

use crate::label::LabelId;
use crate::raster::TextBitmap;
use crate::world::EntityId;
use std::collections::HashMap;

/// Host-owned visual of an entity, as seen by the callout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterSprite {
    /// Screen x of the sprite's anchor (bottom-center)
    pub x: f64,
    /// Screen y of the sprite's anchor (bottom-center)
    pub y: f64,
    pub height: f64,
}

/// Fractional anchor of a sprite: (0, 0) is top-left of the bitmap, (1, 1) bottom-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

/// On-screen text of one label. Owns its rasterized bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSprite {
    pub label: LabelId,
    pub owner: EntityId,
    pub anchor: Anchor,
    pub x: f64,
    pub y: f64,
    pub z: i32,
    pub bitmap: TextBitmap,
}

impl TextSprite {
    /// Screen position of the bitmap's top-left corner
    pub fn top_left(&self) -> (f64, f64) {
        (
            self.x - self.anchor.x * self.bitmap.width() as f64,
            self.y - self.anchor.y * self.bitmap.height() as f64,
        )
    }
}

/// A child of the tree, in attach order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Character(EntityId),
    Text(LabelId),
}

#[derive(Debug, Default)]
pub struct RenderTree {
    characters: HashMap<EntityId, CharacterSprite>,
    texts: HashMap<LabelId, TextSprite>,
    order: Vec<ChildKey>,
    /// Attach serial of each text visual. Never reused, even across `clear`.
    serials: HashMap<LabelId, u64>,
    next_serial: u64,
}

impl RenderTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches or replaces the visual for `entity`
    pub fn attach_character(&mut self, entity: EntityId, sprite: CharacterSprite) {
        if self.characters.insert(entity, sprite).is_none() {
            self.order.push(ChildKey::Character(entity));
        }
    }

    pub fn detach_character(&mut self, entity: EntityId) -> Option<CharacterSprite> {
        let sprite = self.characters.remove(&entity)?;
        self.order.retain(|key| *key != ChildKey::Character(entity));
        Some(sprite)
    }

    pub fn character(&self, entity: EntityId) -> Option<&CharacterSprite> {
        self.characters.get(&entity)
    }

    pub fn character_mut(&mut self, entity: EntityId) -> Option<&mut CharacterSprite> {
        self.characters.get_mut(&entity)
    }

    /// Attaches a text visual, keyed by its label. A previous visual for the
    /// same label is handed back to the caller.
    pub fn attach_text(&mut self, sprite: TextSprite) -> Option<TextSprite> {
        let label = sprite.label;
        self.next_serial += 1;
        self.serials.insert(label, self.next_serial);
        let previous = self.texts.insert(label, sprite);
        if previous.is_none() {
            self.order.push(ChildKey::Text(label));
        }
        previous
    }

    /// Detaches a text visual; dropping the returned sprite releases its bitmap
    pub fn detach_text(&mut self, label: LabelId) -> Option<TextSprite> {
        let sprite = self.texts.remove(&label)?;
        self.serials.remove(&label);
        self.order.retain(|key| *key != ChildKey::Text(label));
        Some(sprite)
    }

    /// Detaches every text visual for which `keep` returns false.
    /// Returns how many were detached.
    pub fn retain_texts(&mut self, mut keep: impl FnMut(&TextSprite) -> bool) -> usize {
        let doomed: Vec<LabelId> = self
            .texts
            .values()
            .filter(|sprite| !keep(*sprite))
            .map(|sprite| sprite.label)
            .collect();
        for label in &doomed {
            self.detach_text(*label);
        }
        doomed.len()
    }

    /// Detaches all text visuals, leaving the character visuals in place
    pub fn clear_texts(&mut self) -> usize {
        self.retain_texts(|_| false)
    }

    /// Serial of the text visual currently attached for `label`.
    ///
    /// Every attach gets a fresh serial, so a label id that comes back after a
    /// world reset never shares a serial with the visual it replaced. Caches of
    /// per-visual resources should key on this rather than on the label id.
    pub fn text_serial(&self, label: LabelId) -> Option<u64> {
        self.serials.get(&label).copied()
    }

    pub fn text(&self, label: LabelId) -> Option<&TextSprite> {
        self.texts.get(&label)
    }

    pub fn text_mut(&mut self, label: LabelId) -> Option<&mut TextSprite> {
        self.texts.get_mut(&label)
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    /// Text visuals belonging to `entity`
    pub fn text_count_for(&self, entity: EntityId) -> usize {
        self.texts.values().filter(|sprite| sprite.owner == entity).count()
    }

    /// All children in attach order
    pub fn children(&self) -> impl Iterator<Item = ChildKey> + '_ {
        self.order.iter().copied()
    }

    /// Text visuals in draw order: by z, then attach order
    pub fn text_sprites(&self) -> Vec<&TextSprite> {
        let mut sprites: Vec<&TextSprite> = self
            .order
            .iter()
            .filter_map(|key| match key {
                ChildKey::Text(label) => self.texts.get(label),
                ChildKey::Character(_) => None,
            })
            .collect();
        // Stable, so equal z keeps attach order
        sprites.sort_by_key(|sprite| sprite.z);
        sprites
    }

    /// Drops every child, e.g. when the host rebuilds its scene
    pub fn clear(&mut self) {
        self.characters.clear();
        self.texts.clear();
        self.serials.clear();
        self.order.clear();
    }
}
