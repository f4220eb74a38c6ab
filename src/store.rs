//! Per-entity callout state
//!
//! Every entity that has been configured or written to gets an
//! `EntityCallouts` record: its style and its label set. Records live as long
//! as the entity does; `despawn` hands the record to the next frame pass for
//! teardown.

use crate::label::{Label, LabelId, LabelIdAllocator, LabelSet};
use crate::style::LabelStyle;
use crate::world::{EntityId, WorldPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Style and labels attached to one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCallouts {
    pub style: LabelStyle,
    pub labels: LabelSet,
    #[serde(default)]
    despawned: bool,
}

impl EntityCallouts {
    pub fn new(style: LabelStyle) -> Self {
        EntityCallouts {
            style,
            labels: LabelSet::new(),
            despawned: false,
        }
    }

    pub fn is_despawned(&self) -> bool {
        self.despawned
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalloutStore {
    default_style: LabelStyle,
    entities: BTreeMap<EntityId, EntityCallouts>,
}

impl CalloutStore {
    pub fn new(default_style: LabelStyle) -> Self {
        CalloutStore {
            default_style,
            entities: BTreeMap::new(),
        }
    }

    pub fn default_style(&self) -> &LabelStyle {
        &self.default_style
    }

    pub fn get(&self, entity: EntityId) -> Option<&EntityCallouts> {
        self.entities.get(&entity)
    }

    /// The entity's style, if it has been configured or written to
    pub fn style(&self, entity: EntityId) -> Option<&LabelStyle> {
        self.entities.get(&entity).map(|record| &record.style)
    }

    /// The entity's style, creating its record from the defaults on first use
    pub fn style_mut(&mut self, entity: EntityId) -> &mut LabelStyle {
        &mut self.record_mut(entity).style
    }

    pub fn labels(&self, entity: EntityId) -> Option<&LabelSet> {
        self.entities.get(&entity).map(|record| &record.labels)
    }

    fn record_mut(&mut self, entity: EntityId) -> &mut EntityCallouts {
        let default_style = &self.default_style;
        self.entities
            .entry(entity)
            .or_insert_with(|| EntityCallouts::new(default_style.clone()))
    }

    /// Appends a new label to `entity`, styled by its current style.
    ///
    /// Returns None for an entity that has been despawned but not yet swept.
    pub fn create_text(
        &mut self,
        entity: EntityId,
        text: &str,
        origin: WorldPoint,
        ids: &mut LabelIdAllocator,
    ) -> Option<LabelId> {
        let record = self.record_mut(entity);
        if record.despawned {
            log::debug!("{} is despawned, dropping text {:?}", entity, text);
            return None;
        }
        let id = ids.next_id();
        let label = Label::new(id, text, &record.style, origin);
        record.labels.push(label);
        log::debug!("{} wrote {:?} as {}", entity, text, id);
        Some(id)
    }

    /// Schedules every label of `entity` to expire on the next frame tick
    pub fn clear_text(&mut self, entity: EntityId) -> usize {
        match self.entities.get_mut(&entity) {
            Some(record) => record.labels.erase_all(),
            None => 0,
        }
    }

    /// Ends the entity's callouts: its labels expire on the next frame tick and
    /// the record is dropped once their visuals are gone
    pub fn despawn(&mut self, entity: EntityId) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.labels.erase_all();
            record.despawned = true;
        }
    }

    /// Labels that have not expired yet, across all entities
    pub fn active_label_count(&self) -> usize {
        self.entities.values().map(|record| record.labels.active_count()).sum()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityCallouts)> {
        self.entities.iter().map(|(id, record)| (*id, record))
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut EntityCallouts)> {
        self.entities.iter_mut().map(|(id, record)| (*id, record))
    }

    /// Drops despawned records whose labels have all been torn down
    pub(crate) fn prune_despawned(&mut self) {
        self.entities
            .retain(|_, record| !(record.despawned && record.labels.is_empty()));
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Lifetime;

    #[test]
    fn test_style_mut_starts_from_defaults() {
        let mut defaults = LabelStyle::default();
        defaults.font_size = 30.0;
        let mut store = CalloutStore::new(defaults);
        assert!(store.style(EntityId(1)).is_none());
        assert_eq!(store.style_mut(EntityId(1)).font_size, 30.0);
        assert_eq!(store.entity_count(), 1);
    }

    #[test]
    fn test_create_text_uses_current_style() {
        let mut store = CalloutStore::default();
        let mut ids = LabelIdAllocator::new();
        store.style_mut(EntityId(1)).duration = Lifetime::Persistent;
        let id = store
            .create_text(EntityId(1), "hello", WorldPoint::new(3.0, 4.0), &mut ids)
            .unwrap();

        let label = store.labels(EntityId(1)).unwrap().get(id).unwrap();
        assert_eq!(label.text(), "hello");
        assert_eq!(label.remaining(), Lifetime::Persistent);
        assert_eq!(label.origin(), WorldPoint::new(3.0, 4.0));
    }

    #[test]
    fn test_ids_unique_across_entities() {
        let mut store = CalloutStore::default();
        let mut ids = LabelIdAllocator::new();
        let a = store.create_text(EntityId(1), "a", WorldPoint::default(), &mut ids);
        let b = store.create_text(EntityId(2), "b", WorldPoint::default(), &mut ids);
        assert_ne!(a, b);
        assert_eq!(store.active_label_count(), 2);
    }

    #[test]
    fn test_clear_text_unknown_entity_is_noop() {
        let mut store = CalloutStore::default();
        assert_eq!(store.clear_text(EntityId(9)), 0);
        assert_eq!(store.entity_count(), 0);
    }

    #[test]
    fn test_despawned_entity_rejects_text() {
        let mut store = CalloutStore::default();
        let mut ids = LabelIdAllocator::new();
        store.create_text(EntityId(1), "a", WorldPoint::default(), &mut ids);
        store.despawn(EntityId(1));
        assert!(store.get(EntityId(1)).unwrap().is_despawned());
        assert!(store.create_text(EntityId(1), "b", WorldPoint::default(), &mut ids).is_none());
    }

    #[test]
    fn test_store_survives_json_snapshot() {
        let mut store = CalloutStore::default();
        let mut ids = LabelIdAllocator::new();
        store.style_mut(EntityId(4)).color = "#ff0000".to_string();
        store.create_text(EntityId(4), "saved", WorldPoint::new(1.0, 2.0), &mut ids);

        let json = serde_json::to_string(&store).unwrap();
        let restored: CalloutStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
    }
}
