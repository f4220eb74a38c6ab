//! A minimal tile map host.
//!
//! Holds the player and named map events on a tile grid with a scrolling
//! camera, and keeps their character visuals in a `RenderTree` up to date.
//! The script runner drives callouts against it; embedders with their own
//! map implement `WorldModel` and `Viewport` instead.

use crate::render_tree::{ChildKey, CharacterSprite, RenderTree};
use crate::world::{EntityId, Viewport, WorldModel, WorldPoint};
use std::collections::BTreeMap;

pub const TILE_SIZE: u32 = 48;
pub const CHARACTER_HEIGHT: f64 = 48.0;

/// The player always has this id; map events count up from 1
pub const PLAYER: EntityId = EntityId(0);

#[derive(Debug, Clone, PartialEq)]
pub struct MapCharacter {
    pub name: String,
    pub position: WorldPoint,
    pub visible: bool,
}

#[derive(Debug)]
pub struct TileMap {
    tile_width: u32,
    tile_height: u32,
    scroll: WorldPoint,
    characters: BTreeMap<EntityId, MapCharacter>,
    next_event_id: u32,
}

impl Default for TileMap {
    fn default() -> Self {
        Self::new(TILE_SIZE, TILE_SIZE)
    }
}

impl TileMap {
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            tile_width,
            tile_height,
            scroll: WorldPoint::default(),
            characters: BTreeMap::new(),
            next_event_id: 1,
        }
    }

    /// Puts the player on the map, or moves it there
    pub fn place_player(&mut self, position: WorldPoint) {
        self.characters.insert(
            PLAYER,
            MapCharacter {
                name: String::new(),
                position,
                visible: true,
            },
        );
    }

    pub fn add_event(&mut self, name: &str, position: WorldPoint) -> EntityId {
        let id = EntityId(self.next_event_id);
        self.next_event_id += 1;
        self.characters.insert(
            id,
            MapCharacter {
                name: name.to_string(),
                position,
                visible: true,
            },
        );
        log::debug!("event {} {:?} added at ({}, {})", id, name, position.x, position.y);
        id
    }

    /// Removes an entity from the map. Its callouts should be despawned too.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        self.characters.remove(&entity).is_some()
    }

    pub fn character(&self, entity: EntityId) -> Option<&MapCharacter> {
        self.characters.get(&entity)
    }

    pub fn move_entity(&mut self, entity: EntityId, position: WorldPoint) -> bool {
        match self.characters.get_mut(&entity) {
            Some(character) => {
                character.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, entity: EntityId, visible: bool) -> bool {
        match self.characters.get_mut(&entity) {
            Some(character) => {
                character.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Moves the camera so that `origin` is the top-left tile on screen
    pub fn scroll_to(&mut self, origin: WorldPoint) {
        self.scroll = origin;
    }

    /// Brings the character visuals in `tree` in line with the map: visible
    /// characters get a sprite at their screen position, hidden or removed
    /// ones lose theirs.
    pub fn refresh_sprites(&self, tree: &mut RenderTree) {
        let stale: Vec<EntityId> = tree
            .children()
            .filter_map(|key| match key {
                ChildKey::Character(entity) => Some(entity),
                ChildKey::Text(_) => None,
            })
            .filter(|entity| !self.characters.get(entity).is_some_and(|c| c.visible))
            .collect();
        for entity in stale {
            tree.detach_character(entity);
        }

        for (entity, character) in self.characters.iter().filter(|(_, c)| c.visible) {
            let point = self.screen_point(character.position);
            tree.attach_character(
                *entity,
                CharacterSprite {
                    x: point.x,
                    y: point.y,
                    height: CHARACTER_HEIGHT,
                },
            );
        }
    }
}

impl WorldModel for TileMap {
    fn player(&self) -> Option<EntityId> {
        self.characters.contains_key(&PLAYER).then_some(PLAYER)
    }

    fn event(&self, event_id: u32) -> Option<EntityId> {
        let id = EntityId(event_id);
        (id != PLAYER && self.characters.contains_key(&id)).then_some(id)
    }

    fn events(&self) -> Vec<(EntityId, &str)> {
        self.characters
            .iter()
            .filter(|(id, _)| **id != PLAYER)
            .map(|(id, character)| (*id, character.name.as_str()))
            .collect()
    }

    fn real_position(&self, entity: EntityId) -> Option<WorldPoint> {
        self.characters.get(&entity).map(|character| character.position)
    }
}

impl Viewport for TileMap {
    fn adjust_x(&self, real_x: f64) -> f64 {
        real_x - self.scroll.x
    }

    fn adjust_y(&self, real_y: f64) -> f64 {
        real_y - self.scroll.y
    }

    fn tile_width(&self) -> u32 {
        self.tile_width
    }

    fn tile_height(&self) -> u32 {
        self.tile_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_get_sequential_ids() {
        let mut map = TileMap::default();
        let a = map.add_event("Chest", WorldPoint::new(1.0, 1.0));
        let b = map.add_event("Guard", WorldPoint::new(2.0, 1.0));
        assert_eq!((a, b), (EntityId(1), EntityId(2)));
        assert_eq!(map.events(), vec![(a, "Chest"), (b, "Guard")]);
        assert_eq!(map.event(2), Some(b));
        assert_eq!(map.event(0), None);
    }

    #[test]
    fn test_player_is_not_an_event() {
        let mut map = TileMap::default();
        assert_eq!(map.player(), None);
        map.place_player(WorldPoint::new(3.0, 3.0));
        assert_eq!(map.player(), Some(PLAYER));
        assert!(map.events().is_empty());
    }

    #[test]
    fn test_refresh_places_sprites_at_screen_positions() {
        let mut map = TileMap::default();
        let chest = map.add_event("Chest", WorldPoint::new(2.0, 3.0));
        map.scroll_to(WorldPoint::new(1.0, 0.0));
        let mut tree = RenderTree::new();
        map.refresh_sprites(&mut tree);

        let sprite = tree.character(chest).unwrap();
        // (2 - 1) * 48 + 24, 3 * 48 + 48
        assert_eq!((sprite.x, sprite.y), (72.0, 192.0));
        assert_eq!(sprite.height, CHARACTER_HEIGHT);
    }

    #[test]
    fn test_refresh_drops_hidden_and_removed() {
        let mut map = TileMap::default();
        let a = map.add_event("A", WorldPoint::default());
        let b = map.add_event("B", WorldPoint::default());
        let mut tree = RenderTree::new();
        map.refresh_sprites(&mut tree);
        assert_eq!(tree.character_count(), 2);

        map.set_visible(a, false);
        map.remove(b);
        map.refresh_sprites(&mut tree);
        assert_eq!(tree.character_count(), 0);

        map.set_visible(a, true);
        map.refresh_sprites(&mut tree);
        assert!(tree.character(a).is_some());
    }

    #[test]
    fn test_move_unknown_entity() {
        let mut map = TileMap::default();
        assert!(!map.move_entity(EntityId(5), WorldPoint::default()));
        assert!(!map.set_visible(EntityId(5), false));
    }
}
