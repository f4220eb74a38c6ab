//! Callout integration tests: commands in, frames out

use callouts::command::{CommandContext, Dispatch};
use callouts::map::{PLAYER, TileMap};
use callouts::{BitmapFont, CalloutSession, EntityId, Lifetime, RenderTree, WorldPoint};
use proptest::prelude::*;

struct Scene {
    session: CalloutSession,
    map: TileMap,
    tree: RenderTree,
    font: BitmapFont,
}

impl Scene {
    fn new() -> Self {
        let mut map = TileMap::default();
        map.place_player(WorldPoint::new(4.0, 4.0));
        map.add_event("Guard", WorldPoint::new(6.0, 4.0));
        map.add_event("Chest", WorldPoint::new(2.0, 7.0));
        Scene {
            session: CalloutSession::default(),
            map,
            tree: RenderTree::new(),
            font: BitmapFont::new(),
        }
    }

    fn run(&mut self, ctx: &CommandContext, line: &str) -> Dispatch {
        self.session.execute_line(&self.map, ctx, line).unwrap()
    }

    fn tick(&mut self) {
        self.map.refresh_sprites(&mut self.tree);
        self.session.sync(&mut self.tree, &self.map, &mut self.font);
    }

    fn ticks(&mut self, frames: u32) {
        for _ in 0..frames {
            self.tick();
        }
    }
}

#[test]
fn test_slide_up_for_one_second() {
    let mut scene = Scene::new();
    let guard = CommandContext::executing(EntityId(1));
    scene.run(&guard, "SimpleText Setup 0 SlideUp true");
    let Dispatch::Wrote(id) = scene.run(&guard, "SimpleText Write 0 hello") else {
        panic!("label was not written");
    };
    let initial_top = scene.session.store().labels(EntityId(1)).unwrap().get(id).unwrap().top;

    scene.ticks(60);

    let label = scene.session.store().labels(EntityId(1)).unwrap().get(id).unwrap();
    assert!(label.is_active());
    assert!((label.top - initial_top - 3.0).abs() < 1e-9);
    assert_eq!(label.remaining(), Lifetime::Ticks(120));
}

#[test]
fn test_duration_in_seconds() {
    let mut scene = Scene::new();
    let ctx = CommandContext::executing(EntityId(2));
    scene.run(&ctx, "SimpleText Setup 0 Duration 2");
    scene.run(&ctx, "SimpleText Write 0 bye");

    scene.ticks(119);
    assert_eq!(scene.session.store().active_label_count(), 1);
    assert_eq!(scene.tree.text_count_for(EntityId(2)), 1);

    scene.tick();
    assert_eq!(scene.session.store().active_label_count(), 0);
    assert_eq!(scene.tree.text_count(), 0);
}

#[test]
fn test_erase_removes_visuals_next_frame() {
    let mut scene = Scene::new();
    let ctx = CommandContext::default();
    scene.run(&ctx, "SimpleText Write Guard one");
    scene.run(&ctx, "SimpleText Write Guard two");
    scene.tick();
    assert_eq!(scene.tree.text_count(), 2);

    assert_eq!(scene.run(&ctx, "SimpleText Erase 1"), Dispatch::Erased(2));
    scene.tick();
    assert_eq!(scene.tree.text_count(), 0);
    assert!(scene.session.store().labels(EntityId(1)).unwrap().is_empty());
}

#[test]
fn test_styles_are_per_entity() {
    let mut scene = Scene::new();
    let ctx = CommandContext::default();
    scene.run(&ctx, "SimpleText Setup Guard Color #ff0000");
    scene.run(&ctx, "SimpleText Setup -1 Size 8*3");

    assert_eq!(scene.session.style(EntityId(1)).unwrap().color, "#ff0000");
    assert_eq!(scene.session.style(PLAYER).unwrap().font_size, 24.0);
    assert!(scene.session.style(EntityId(2)).is_none());
}

#[test]
fn test_label_follows_moving_entity() {
    let mut scene = Scene::new();
    let ctx = CommandContext::default();
    let Dispatch::Wrote(id) = scene.run(&ctx, "SimpleText Write -1 walking") else {
        panic!("label was not written");
    };
    scene.tick();
    let before = scene.tree.text(id).unwrap().x;

    scene.map.move_entity(PLAYER, WorldPoint::new(5.0, 4.0));
    scene.tick();
    assert_eq!(scene.tree.text(id).unwrap().x, before + 48.0);
}

#[test]
fn test_hidden_entity_keeps_counting_down() {
    let mut scene = Scene::new();
    let ctx = CommandContext::default();
    scene.run(&ctx, "SimpleText Setup Chest Duration 0.5");
    scene.run(&ctx, "SimpleText Write Chest hidden");
    scene.map.set_visible(EntityId(2), false);

    scene.ticks(30);
    assert_eq!(scene.tree.text_count(), 0);
    assert_eq!(scene.session.store().active_label_count(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Write(u32),
    Erase(u32),
    Despawn(u32),
    Show(u32),
    Hide(u32),
    Restore,
    Tick(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..3).prop_map(Op::Write),
        (0u32..3).prop_map(Op::Erase),
        (0u32..3).prop_map(Op::Despawn),
        (0u32..3).prop_map(Op::Show),
        (0u32..3).prop_map(Op::Hide),
        Just(Op::Restore),
        (1u8..20).prop_map(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn test_visuals_never_outnumber_active_labels(ops in prop::collection::vec(op(), 1..60)) {
        let mut scene = Scene::new();
        scene.run(&CommandContext::default(), "SimpleText Setup -1 Duration 0.25");
        let snapshot = scene.session.snapshot();

        for op in ops {
            match op {
                Op::Write(e) => {
                    scene.session.create_text(&scene.map, EntityId(e), "x");
                }
                Op::Erase(e) => {
                    scene.session.clear_text(EntityId(e));
                }
                Op::Despawn(e) => scene.session.despawn(EntityId(e)),
                Op::Show(e) => {
                    scene.map.set_visible(EntityId(e), true);
                }
                Op::Hide(e) => {
                    scene.map.set_visible(EntityId(e), false);
                }
                Op::Restore => scene.session.restore(snapshot.clone(), &mut scene.tree),
                Op::Tick(n) => {
                    for _ in 0..n {
                        scene.tick();
                        prop_assert!(scene.tree.text_count() <= scene.session.store().active_label_count());
                    }
                }
            }
            prop_assert!(scene.tree.text_count() <= scene.session.store().active_label_count());
            for sprite in scene.tree.text_sprites() {
                let label = scene.session.store().labels(sprite.owner).and_then(|set| set.get(sprite.label));
                prop_assert!(label.is_some_and(|l| l.is_active()));
            }
        }
    }
}
