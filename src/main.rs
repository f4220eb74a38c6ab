//! Callout script runner
//!
//! Plays a script of map directives and callout commands against a small tile
//! map, one frame per tick, and prints the label state on `dump`.
//!
//! ```text
//! player 4 4
//! event Guard 6 4
//! as Guard
//! SimpleText Setup 0 SlideUp true
//! SimpleText Write 0 Halt!
//! tick 60
//! dump
//! ```

use callouts::command::{CommandContext, Dispatch, resolve_entity};
use callouts::map::TileMap;
use callouts::{BitmapFont, CalloutConfig, CalloutSession, RenderTree, SessionSnapshot, WorldPoint};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Play a callout script headless (or in a window with the `sdl` feature)
#[derive(Parser, Debug)]
#[command(name = "callouts")]
#[command(about = "Run a callout script against a test map")]
struct Args {
    /// Script file, one directive or command per line
    script: PathBuf,

    /// Config file (defaults to callouts.json next to the script, then ~/.callouts/config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Frames to advance after every callout command
    #[arg(long, default_value_t = 0)]
    ticks_per_line: u32,

    /// Show the map in a window while the script plays
    #[cfg(feature = "sdl")]
    #[arg(long)]
    window: bool,
}

/// Why a script line did not complete
#[derive(Debug)]
enum LineError {
    /// Stop the whole script
    Halt,
    Failed(String),
}

impl From<String> for LineError {
    fn from(message: String) -> Self {
        LineError::Failed(message)
    }
}

impl From<callouts::CalloutError> for LineError {
    fn from(err: callouts::CalloutError) -> Self {
        LineError::Failed(err.to_string())
    }
}

/// Called after every frame with the updated tree; false stops the script
type FrameHook<'a> = dyn FnMut(&RenderTree) -> bool + 'a;

struct ScriptRunner {
    session: CalloutSession,
    map: TileMap,
    tree: RenderTree,
    font: BitmapFont,
    ctx: CommandContext,
    ticks_per_line: u32,
    frame: u64,
}

impl ScriptRunner {
    fn new(config: CalloutConfig, ticks_per_line: u32) -> Self {
        Self {
            session: CalloutSession::new(config),
            map: TileMap::default(),
            tree: RenderTree::new(),
            font: BitmapFont::new(),
            ctx: CommandContext::default(),
            ticks_per_line,
            frame: 0,
        }
    }

    fn run_script(&mut self, script: &str, hook: &mut FrameHook<'_>) {
        for (number, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.run_line(line, hook) {
                Ok(()) => {}
                Err(LineError::Halt) => {
                    log::info!("script stopped at line {}", number + 1);
                    return;
                }
                Err(LineError::Failed(message)) => {
                    log::warn!("line {}: {}: {}", number + 1, line, message);
                }
            }
        }
    }

    fn run_line(&mut self, line: &str, hook: &mut FrameHook<'_>) -> Result<(), LineError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let args = &tokens[1..];

        match tokens[0].to_ascii_lowercase().as_str() {
            "player" => {
                let position = point(args, 0)?;
                self.map.place_player(position);
            }
            "event" => {
                let name = arg(args, 0, "name")?;
                let id = self.map.add_event(name, point(args, 1)?);
                println!("{} = {}", name, id);
            }
            "as" => {
                let reference = arg(args, 0, "entity")?;
                self.ctx.executing = if reference.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(self.entity(reference)?)
                };
            }
            "tick" => {
                let frames = match args.first() {
                    Some(count) => count.parse().map_err(|_| format!("invalid tick count {:?}", count))?,
                    None => 1,
                };
                self.tick(frames, hook)?;
            }
            "move" => {
                let entity = self.entity(arg(args, 0, "entity")?)?;
                self.map.move_entity(entity, point(args, 1)?);
            }
            "scroll" => self.map.scroll_to(point(args, 0)?),
            "show" | "hide" => {
                let entity = self.entity(arg(args, 0, "entity")?)?;
                self.map.set_visible(entity, tokens[0].eq_ignore_ascii_case("show"));
            }
            "despawn" => {
                let entity = self.entity(arg(args, 0, "entity")?)?;
                self.map.remove(entity);
                self.session.despawn(entity);
            }
            "reload" => {
                self.session.load_world(&mut self.tree);
                self.map = TileMap::default();
                self.tree.clear();
                self.ctx = CommandContext::default();
            }
            "save" => {
                let path = arg(args, 0, "path")?;
                let json = serde_json::to_string_pretty(&self.session.snapshot()).map_err(|e| e.to_string())?;
                std::fs::write(path, json).map_err(|e| format!("failed to write {}: {}", path, e))?;
            }
            "restore" => {
                let path = arg(args, 0, "path")?;
                let json = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
                let snapshot: SessionSnapshot = serde_json::from_str(&json).map_err(|e| e.to_string())?;
                self.session.restore(snapshot, &mut self.tree);
            }
            "dump" => print!("{}", self.dump()),
            _ => {
                let keyworded = tokens[0].eq_ignore_ascii_case(&self.session.config().command_keyword);
                let result = if keyworded {
                    self.session.execute_line(&self.map, &self.ctx, line)?
                } else {
                    self.session.execute(&self.map, &self.ctx, &tokens)?
                };
                if result == Dispatch::EntityNotFound {
                    log::warn!("{}: no such entity", line);
                }
                self.tick(self.ticks_per_line, hook)?;
            }
        }
        Ok(())
    }

    fn entity(&self, reference: &str) -> Result<callouts::EntityId, String> {
        resolve_entity(&self.map, &self.ctx, reference).ok_or_else(|| format!("no entity matches {:?}", reference))
    }

    fn tick(&mut self, frames: u32, hook: &mut FrameHook<'_>) -> Result<(), LineError> {
        for _ in 0..frames {
            self.map.refresh_sprites(&mut self.tree);
            let report = self.session.sync(&mut self.tree, &self.map, &mut self.font);
            self.frame += 1;
            if report.materialized > 0 || report.torn_down > 0 {
                log::debug!("frame {}: {:?}", self.frame, report);
            }
            if !hook(&self.tree) {
                return Err(LineError::Halt);
            }
        }
        Ok(())
    }

    fn dump(&self) -> String {
        let mut out = format!(
            "frame {}: {} active labels, {} visuals\n",
            self.frame,
            self.session.store().active_label_count(),
            self.tree.text_count()
        );
        for (entity, record) in self.session.store().iter() {
            for label in record.labels.iter() {
                out.push_str(&format!(
                    "  {} {} {:?} remaining={:?} anchor=({:.3}, {:.3})",
                    entity,
                    label.id(),
                    label.text(),
                    label.remaining(),
                    label.left,
                    label.top
                ));
                if let Some(sprite) = self.tree.text(label.id()) {
                    let (x, y) = sprite.top_left();
                    out.push_str(&format!(" at ({:.1}, {:.1})", x, y));
                }
                out.push('\n');
            }
        }
        out
    }
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str) -> Result<&'a str, String> {
    args.get(index).copied().ok_or_else(|| format!("missing {}", name))
}

fn number(args: &[&str], index: usize, name: &str) -> Result<f64, String> {
    let value = arg(args, index, name)?;
    value.parse().map_err(|_| format!("invalid {} {:?}", name, value))
}

fn point(args: &[&str], index: usize) -> Result<WorldPoint, String> {
    Ok(WorldPoint::new(number(args, index, "x")?, number(args, index + 1, "y")?))
}

fn load_config(args: &Args) -> Result<CalloutConfig, String> {
    let candidates: Vec<PathBuf> = match &args.config {
        Some(path) => vec![path.clone()],
        None => {
            let beside_script = args
                .script
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("callouts.json");
            let home = dirs::home_dir().map(|p| p.join(".callouts/config.json"));
            std::iter::once(beside_script)
                .chain(home)
                .filter(|path| path.exists())
                .collect()
        }
    };

    match candidates.first() {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            CalloutConfig::load_from_file(path).map_err(|e| format!("{}: {}", path.display(), e))
        }
        None => Ok(CalloutConfig::default()),
    }
}

#[cfg(feature = "sdl")]
fn run_windowed(runner: &mut ScriptRunner, script: &str) -> Result<(), String> {
    use callouts::present::TextTextures;
    use callouts::render_tree::ChildKey;
    use sdl2::event::Event;
    use sdl2::pixels::Color;
    use sdl2::rect::Rect;

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let window = video_subsystem
        .window("Callouts", 816, 624)
        .position_centered()
        .build()
        .map_err(|e| e.to_string())?;
    let mut canvas = window.into_canvas().present_vsync().build().map_err(|e| e.to_string())?;
    let texture_creator = canvas.texture_creator();
    let mut textures = TextTextures::new(&texture_creator);
    let mut event_pump = sdl_context.event_pump()?;

    let mut hook = |tree: &RenderTree| -> bool {
        for event in event_pump.poll_iter() {
            if let Event::Quit { .. } = event {
                return false;
            }
        }
        canvas.set_draw_color(Color::RGB(34, 52, 40));
        canvas.clear();
        canvas.set_draw_color(Color::RGB(200, 170, 120));
        for key in tree.children() {
            if let ChildKey::Character(entity) = key {
                if let Some(sprite) = tree.character(entity) {
                    let body = Rect::new(
                        sprite.x as i32 - 16,
                        (sprite.y - sprite.height) as i32,
                        32,
                        sprite.height as u32,
                    );
                    if let Err(e) = canvas.fill_rect(body) {
                        log::warn!("draw failed: {}", e);
                    }
                }
            }
        }
        if let Err(e) = textures.present(&mut canvas, tree) {
            log::warn!("draw failed: {}", e);
        }
        canvas.present();
        true
    };
    runner.run_script(script, &mut hook);
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let script = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("failed to read {}: {}", args.script.display(), e))?;
    let mut runner = ScriptRunner::new(config, args.ticks_per_line);

    #[cfg(feature = "sdl")]
    if args.window {
        return run_windowed(&mut runner, &script);
    }

    runner.run_script(&script, &mut |_| true);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> ScriptRunner {
        let mut runner = ScriptRunner::new(CalloutConfig::default(), 0);
        runner.run_script(script, &mut |_| true);
        runner
    }

    #[test]
    fn test_script_writes_and_materializes() {
        let runner = run("player 2 2\nSimpleText Write -1 Hello\ntick\n");
        assert_eq!(runner.session.store().active_label_count(), 1);
        assert_eq!(runner.tree.text_count(), 1);
        assert_eq!(runner.frame, 1);
    }

    #[test]
    fn test_bare_sub_commands_and_as() {
        let runner = run("event Sign 1 1\nas Sign\nSetup 0 Duration 1\nWrite 0 Read_me\ntick 60\n");
        assert_eq!(runner.session.store().active_label_count(), 0);
        assert_eq!(runner.tree.text_count(), 0);
    }

    #[test]
    fn test_bad_lines_do_not_stop_script() {
        let runner = run("player 0 0\nSimpleText Shout -1\nmove Nobody 1 1\nWrite -1 still_runs\n");
        assert_eq!(runner.session.store().active_label_count(), 1);
    }

    #[test]
    fn test_hook_can_halt() {
        let mut runner = ScriptRunner::new(CalloutConfig::default(), 0);
        let mut frames = 0;
        runner.run_script("tick 10\ntick 10\n", &mut |_| {
            frames += 1;
            frames < 3
        });
        assert_eq!(runner.frame, 3);
    }

    #[test]
    fn test_reload_gives_reused_label_id_a_new_serial() {
        let mut runner = ScriptRunner::new(CalloutConfig::default(), 0);
        let mut seen = Vec::new();
        runner.run_script(
            "player 0 0\nWrite -1 a\ntick\nreload\nplayer 0 0\nWrite -1 zzz\ntick\n",
            &mut |tree| {
                for sprite in tree.text_sprites() {
                    seen.push((sprite.label, tree.text_serial(sprite.label), sprite.bitmap.width()));
                }
                true
            },
        );
        assert_eq!(seen.len(), 2);
        let (first, second) = (seen[0], seen[1]);
        assert_eq!(first.0, second.0);
        assert_ne!(first.1, second.1);
        assert!(second.2 > first.2);
    }

    #[test]
    fn test_dump_lists_labels() {
        let runner = run("player 0 0\nWrite -1 Hi\ntick\n");
        let dump = runner.dump();
        assert!(dump.starts_with("frame 1: 1 active labels, 1 visuals"));
        assert!(dump.contains("\"Hi\""));
    }
}
