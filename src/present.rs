//! SDL2 presentation of text visuals
//!
//! Uploads each text visual's bitmap to a texture once and draws the visuals
//! in z order every frame. Textures are keyed by the visual's attach serial, so
//! a label id reused after a world reset never picks up an old texture.
//! Textures are released when their visual leaves the render tree.

use crate::raster::TextBitmap;
use crate::render_tree::RenderTree;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{BlendMode, Texture, TextureCreator, WindowCanvas};
use sdl2::video::WindowContext;
use std::collections::{HashMap, HashSet};

/// Uploads an RGBA bitmap as a blended texture
pub fn bitmap_to_texture<'a>(
    creator: &'a TextureCreator<WindowContext>,
    bitmap: &TextBitmap,
) -> Result<Texture<'a>, String> {
    let mut texture = creator
        .create_texture_static(PixelFormatEnum::RGBA32, bitmap.width(), bitmap.height())
        .map_err(|e| e.to_string())?;
    texture
        .update(None, bitmap.pixels(), bitmap.width() as usize * 4)
        .map_err(|e| e.to_string())?;
    texture.set_blend_mode(BlendMode::Blend);
    Ok(texture)
}

/// Textures of the text visuals currently in a render tree
pub struct TextTextures<'a> {
    creator: &'a TextureCreator<WindowContext>,
    /// Keyed by `RenderTree::text_serial`
    textures: HashMap<u64, Texture<'a>>,
}

impl<'a> TextTextures<'a> {
    pub fn new(creator: &'a TextureCreator<WindowContext>) -> Self {
        Self {
            creator,
            textures: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Draws every text visual of `tree` onto `canvas`
    pub fn present(&mut self, canvas: &mut WindowCanvas, tree: &RenderTree) -> Result<(), String> {
        let sprites: Vec<_> = tree
            .text_sprites()
            .into_iter()
            .filter_map(|sprite| tree.text_serial(sprite.label).map(|serial| (serial, sprite)))
            .collect();
        let live: HashSet<u64> = sprites.iter().map(|(serial, _)| *serial).collect();
        self.textures.retain(|serial, _| live.contains(serial));

        for (serial, sprite) in sprites {
            let (width, height) = (sprite.bitmap.width(), sprite.bitmap.height());
            if width == 0 || height == 0 {
                continue;
            }
            if !self.textures.contains_key(&serial) {
                let texture = bitmap_to_texture(self.creator, &sprite.bitmap)?;
                self.textures.insert(serial, texture);
            }
            let Some(texture) = self.textures.get(&serial) else {
                continue;
            };
            let (x, y) = sprite.top_left();
            canvas.copy(texture, None, Rect::new(x.round() as i32, y.round() as i32, width, height))?;
        }
        Ok(())
    }
}
