//! Labels and per-entity label sets

use crate::style::{LabelStyle, Lifetime, SlideDirection};
use crate::world::WorldPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-unique label identity, used to find the label's visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(u64);

impl LabelId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label-{}", self.0)
    }
}

/// Monotonic id counter owned by the world session.
///
/// Ids are never reused within a session; `reset` starts over when a world is loaded.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelIdAllocator {
    last: u64,
}

impl LabelIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> LabelId {
        self.last += 1;
        LabelId(self.last)
    }

    pub fn last_issued(&self) -> Option<LabelId> {
        (self.last > 0).then_some(LabelId(self.last))
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

/// One live callout.
///
/// Anchors start as copies of the style's and then move on their own. The slide
/// direction is captured at creation: later `Setup` changes never switch an
/// existing label between tracking the entity and sliding from its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    id: LabelId,
    text: String,
    remaining: Lifetime,
    /// Current vertical anchor fraction
    pub top: f64,
    /// Current horizontal anchor fraction
    pub left: f64,
    slide: Option<SlideDirection>,
    origin: WorldPoint,
    height_hint: Option<f64>,
    active: bool,
}

impl Label {
    pub fn new(id: LabelId, text: impl Into<String>, style: &LabelStyle, origin: WorldPoint) -> Self {
        Label {
            id,
            text: text.into(),
            remaining: style.duration,
            top: style.top,
            left: style.left,
            slide: style.slide(),
            origin,
            height_hint: None,
            active: true,
        }
    }

    pub fn id(&self) -> LabelId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn remaining(&self) -> Lifetime {
        self.remaining
    }

    pub fn slide(&self) -> Option<SlideDirection> {
        self.slide
    }

    /// World position of the owning entity when the label was written
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Height of the entity visual when this label's visual was created
    pub fn height_hint(&self) -> Option<f64> {
        self.height_hint
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True when the next countdown tick will expire this label
    pub fn is_expiring(&self) -> bool {
        self.remaining == Lifetime::Ticks(1)
    }

    /// Schedules the label to expire on the next tick.
    ///
    /// Until that tick the label still reports `is_active()` and is counted by
    /// `active_label_count`. The visual stays attached until then, so teardown
    /// only ever happens inside the frame pass.
    pub fn erase(&mut self) {
        if self.active {
            self.remaining = Lifetime::Ticks(1);
        }
    }

    pub(crate) fn set_height_hint(&mut self, height: f64) {
        self.height_hint = Some(height);
    }

    /// Moves the anchor one tick along the label's slide direction
    pub(crate) fn advance_slide(&mut self, speed: f64) {
        match self.slide {
            Some(SlideDirection::Up) => self.top += speed,
            Some(SlideDirection::Down) => self.top -= speed,
            Some(SlideDirection::Left) => self.left += speed,
            Some(SlideDirection::Right) => self.left -= speed,
            None => {}
        }
    }

    /// One countdown step; flags the label inactive when it runs out
    pub(crate) fn tick(&mut self) {
        if let Lifetime::Ticks(n) = self.remaining {
            let n = n.saturating_sub(1);
            self.remaining = Lifetime::Ticks(n);
            if n == 0 {
                self.active = false;
            }
        }
    }
}

/// Insertion-ordered labels owned by one entity
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn get(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|label| label.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.labels.iter().filter(|label| label.is_active()).count()
    }

    /// Schedules every active label to expire on the next tick
    pub fn erase_all(&mut self) -> usize {
        let mut erased = 0;
        for label in self.labels.iter_mut().rev() {
            if label.is_active() {
                label.erase();
                erased += 1;
            }
        }
        erased
    }

    /// Visits every label once, newest first, removing those for which `visit`
    /// returns false. Walking backwards keeps removal from skipping anything.
    pub(crate) fn sweep(&mut self, mut visit: impl FnMut(&mut Label) -> bool) {
        for i in (0..self.labels.len()).rev() {
            if !visit(&mut self.labels[i]) {
                self.labels.remove(i);
            }
        }
    }
}
