//! Display-list renderer.
//!
//! A [`Frame`] lists draw commands in paint order, in unscaled map space. Zoom is
//! applied by whoever presents the frame, never by the frame itself.

use crate::images::{ImageCache, ImageSource};
use crate::renderer::{RenderContext, Renderer};
use kurbo::{Affine, Circle, Line, Point, Size};
use peniko::{Color, ImageData};
use tabletop_core::grid::effective_token_diameter;
use tabletop_core::token::Token;

/// Smallest label size in pixels.
const MIN_LABEL_SIZE: f64 = 10.0;

/// A single paint operation.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Draw an image with a transform from image pixels to map space.
    Image { image: ImageData, transform: Affine },
    /// Draw an image clipped to a circle.
    ClippedImage {
        image: ImageData,
        transform: Affine,
        clip: Circle,
    },
    Line {
        line: Line,
        color: Color,
        width: f64,
    },
    FillCircle { circle: Circle, color: Color },
    StrokeCircle {
        circle: Circle,
        color: Color,
        width: f64,
    },
    /// Outline pass of a label, drawn before its fill.
    StrokeText {
        text: String,
        center: Point,
        size: f64,
        color: Color,
        width: f64,
    },
    FillText {
        text: String,
        center: Point,
        size: f64,
        color: Color,
    },
}

/// One rendered frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub size: Size,
    pub background: Color,
    /// Map space to device pixels.
    pub transform: Affine,
    pub commands: Vec<DrawCommand>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            size: Size::ZERO,
            background: Color::TRANSPARENT,
            transform: Affine::IDENTITY,
            commands: Vec::new(),
        }
    }
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Builds frames of map, grid and tokens.
pub struct SceneRenderer {
    images: ImageCache,
    frame: Frame,
}

impl SceneRenderer {
    pub fn new(source: impl ImageSource + 'static) -> Self {
        Self {
            images: ImageCache::new(source),
            frame: Frame::default(),
        }
    }

    /// Get the last built frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Take ownership of the last built frame.
    pub fn take_frame(&mut self) -> Frame {
        std::mem::take(&mut self.frame)
    }

    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    fn render_map(&mut self, ctx: &RenderContext) {
        let session = ctx.session;
        if session.map_image.is_empty() {
            return;
        }
        // A map that can't be loaded leaves the layer out; the next frame retries
        let Some(image) = self.images.get(&session.map_image) else {
            return;
        };
        if image.width == 0 || image.height == 0 {
            return;
        }
        let transform = Affine::scale_non_uniform(
            session.canvas_width / image.width as f64,
            session.canvas_height / image.height as f64,
        );
        self.frame
            .commands
            .push(DrawCommand::Image { image, transform });
    }

    fn render_grid(&mut self, ctx: &RenderContext) {
        let session = ctx.session;
        let grid = &session.grid;
        if !grid.enabled || grid.size <= 0.0 {
            return;
        }
        let (width, height) = (session.canvas_width, session.canvas_height);
        let color = ctx.style.grid_color;
        let line_width = ctx.style.grid_line_width;

        let mut x = 0.0;
        while x <= width {
            self.frame.commands.push(DrawCommand::Line {
                line: Line::new((x, 0.0), (x, height)),
                color,
                width: line_width,
            });
            x += grid.size;
        }

        let mut y = 0.0;
        while y <= height {
            self.frame.commands.push(DrawCommand::Line {
                line: Line::new((0.0, y), (width, y)),
                color,
                width: line_width,
            });
            y += grid.size;
        }
    }

    fn render_token(&mut self, token: &Token, ctx: &RenderContext) {
        let diameter = effective_token_diameter(token, &ctx.session.grid);
        let radius = diameter / 2.0;
        let circle = Circle::new(token.position, radius);

        // Token images fall back to the flat color when they fail to load
        let image = token
            .visual
            .image_reference()
            .and_then(|reference| self.images.get(reference))
            .filter(|image| image.width > 0 && image.height > 0);
        match image {
            Some(image) => {
                let transform = Affine::translate((
                    token.position.x - radius,
                    token.position.y - radius,
                )) * Affine::scale_non_uniform(
                    diameter / image.width as f64,
                    diameter / image.height as f64,
                );
                self.frame.commands.push(DrawCommand::ClippedImage {
                    image,
                    transform,
                    clip: circle,
                });
            }
            None => self.frame.commands.push(DrawCommand::FillCircle {
                circle,
                color: token.visual.base_color().into(),
            }),
        }

        self.frame.commands.push(DrawCommand::StrokeCircle {
            circle,
            color: ctx.style.token_outline_color,
            width: ctx.style.token_outline_width,
        });

        if let Some(text) = token.display_text() {
            let size = (diameter * 0.3).max(MIN_LABEL_SIZE);
            self.frame.commands.push(DrawCommand::StrokeText {
                text: text.clone(),
                center: token.position,
                size,
                color: ctx.style.label_outline_color,
                width: (size / 5.0).max(2.0),
            });
            self.frame.commands.push(DrawCommand::FillText {
                text,
                center: token.position,
                size,
                color: ctx.style.label_color,
            });
        }
    }

    fn render_selection(&mut self, token: &Token, ctx: &RenderContext) {
        let radius = effective_token_diameter(token, &ctx.session.grid) / 2.0;
        self.frame.commands.push(DrawCommand::StrokeCircle {
            circle: Circle::new(token.position, radius),
            color: ctx.style.selection_color,
            width: ctx.style.selection_width,
        });
    }
}

impl Renderer for SceneRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        let session = ctx.session;
        self.frame = Frame {
            size: Size::new(
                session.canvas_width * ctx.scale_factor,
                session.canvas_height * ctx.scale_factor,
            ),
            background: self.background_color(ctx),
            transform: Affine::scale(ctx.scale_factor),
            commands: Vec::new(),
        };

        self.render_map(ctx);
        self.render_grid(ctx);

        for token in &session.tokens {
            self.render_token(token, ctx);
            if ctx.selection == Some(token.id()) {
                self.render_selection(token, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::MemoryImageSource;
    use crate::images::tests::png_bytes;
    use tabletop_core::session::Session;
    use tabletop_core::token::{TokenSize, TokenVisual};

    fn lines(frame: &Frame) -> usize {
        frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count()
    }

    fn render(renderer: &mut SceneRenderer, ctx: &RenderContext) -> Frame {
        renderer.build_scene(ctx);
        renderer.take_frame()
    }

    #[test]
    fn test_grid_lines_at_cell_multiples() {
        let mut session = Session::new("");
        session.canvas_width = 200.0;
        session.canvas_height = 100.0;
        session.grid.size = 50.0;

        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let frame = render(&mut renderer, &RenderContext::new(&session));

        // x = 0, 50, 100, 150, 200 and y = 0, 50, 100
        assert_eq!(lines(&frame), 8);
        let xs: Vec<f64> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { line, .. } if line.p0.x == line.p1.x => Some(line.p0.x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0, 150.0, 200.0]);
    }

    #[test]
    fn test_grid_disabled() {
        let mut session = Session::new("");
        session.grid.enabled = false;

        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let frame = render(&mut renderer, &RenderContext::new(&session));
        assert_eq!(lines(&frame), 0);
    }

    #[test]
    fn test_draw_order_map_grid_tokens() {
        let mut source = MemoryImageSource::new();
        source.insert("map.png", png_bytes(10, 10));
        let mut session = Session::new("map.png");
        session.canvas_width = 100.0;
        session.canvas_height = 100.0;
        session.add_token(Token::new(Point::new(25.0, 25.0)));

        let mut renderer = SceneRenderer::new(source);
        let frame = render(&mut renderer, &RenderContext::new(&session));

        match &frame.commands[0] {
            DrawCommand::Image { transform, .. } => {
                assert_eq!(*transform, Affine::scale(10.0));
            }
            other => panic!("expected map first, got {other:?}"),
        }
        assert!(matches!(frame.commands[1], DrawCommand::Line { .. }));
        assert!(matches!(
            frame.commands.last(),
            Some(DrawCommand::StrokeCircle { .. })
        ));
    }

    #[test]
    fn test_missing_map_omits_layer() {
        let session = Session::new("missing.png");
        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let frame = render(&mut renderer, &RenderContext::new(&session));

        assert!(
            !frame
                .commands
                .iter()
                .any(|c| matches!(c, DrawCommand::Image { .. }))
        );
    }

    #[test]
    fn test_token_disc_uses_effective_diameter() {
        let mut session = Session::new("");
        session.grid.enabled = false;
        session.add_token(Token::new(Point::new(100.0, 100.0)).with_size(TokenSize::Large));

        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let frame = render(&mut renderer, &RenderContext::new(&session));

        match &frame.commands[0] {
            DrawCommand::FillCircle { circle, .. } => {
                assert_eq!(circle.center, Point::new(100.0, 100.0));
                assert_eq!(circle.radius, 50.0);
            }
            other => panic!("expected token disc, got {other:?}"),
        }
    }

    #[test]
    fn test_token_image_falls_back_to_color() {
        let mut source = MemoryImageSource::new();
        source.insert("elf.png", png_bytes(4, 4));
        let mut session = Session::new("");
        session.grid.enabled = false;
        session.add_token(Token::new(Point::new(25.0, 25.0)).with_visual(TokenVisual::image("elf.png")));
        session.add_token(Token::new(Point::new(75.0, 25.0)).with_visual(TokenVisual::image("orc.png")));

        let mut renderer = SceneRenderer::new(source);
        let frame = render(&mut renderer, &RenderContext::new(&session));

        let clipped = frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::ClippedImage { .. }))
            .count();
        let filled = frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .count();
        assert_eq!((clipped, filled), (1, 1));
    }

    #[test]
    fn test_label_stroke_before_fill() {
        let mut session = Session::new("");
        session.grid.enabled = false;
        let mut token = Token::new(Point::new(25.0, 25.0)).with_label("Goblin");
        token.number = Some(2);
        session.add_token(token);

        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let frame = render(&mut renderer, &RenderContext::new(&session));

        let stroke = frame
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::StrokeText { .. }))
            .unwrap();
        match &frame.commands[stroke + 1] {
            DrawCommand::FillText { text, .. } => assert_eq!(text, "Goblin 2"),
            other => panic!("expected label fill, got {other:?}"),
        }
    }

    #[test]
    fn test_selected_token_redrawn_after_body() {
        let mut session = Session::new("");
        session.grid.enabled = false;
        let first = session.add_token(Token::new(Point::new(25.0, 25.0)));
        session.add_token(Token::new(Point::new(75.0, 25.0)));

        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let ctx = RenderContext::new(&session).with_selection(Some(first));
        let frame = render(&mut renderer, &ctx);
        let selection_color = ctx.style.selection_color;

        // first: fill, outline, highlight; second: fill, outline
        assert_eq!(frame.commands.len(), 5);
        match &frame.commands[2] {
            DrawCommand::StrokeCircle { color, circle, .. } => {
                assert_eq!(color.to_rgba8(), selection_color.to_rgba8());
                assert_eq!(circle.center, Point::new(25.0, 25.0));
            }
            other => panic!("expected selection border, got {other:?}"),
        }
    }

    #[test]
    fn test_scale_factor() {
        let session = Session::new("");
        let mut renderer = SceneRenderer::new(MemoryImageSource::new());
        let frame = render(
            &mut renderer,
            &RenderContext::new(&session).with_scale_factor(2.0),
        );
        assert_eq!(
            frame.size,
            Size::new(session.canvas_width * 2.0, session.canvas_height * 2.0)
        );
        assert_eq!(frame.transform, Affine::scale(2.0));
    }
}
