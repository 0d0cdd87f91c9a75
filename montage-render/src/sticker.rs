//! Built-in sticker artwork.
//!
//! Each sticker is a set of filled and stroked vector paths defined in the
//! sticker's base coordinate space. Paths are painted straight onto the
//! output with the layer transform applied, so stickers stay sharp at any
//! layer scale and rotation.

use montage_core::StickerKind;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

type Rgb = [u8; 3];

const BLACK: Rgb = [20, 20, 20];
const GOLD: Rgb = [212, 175, 55];
const DARK_GOLD: Rgb = [184, 134, 11];
const CREAM: Rgb = [255, 248, 220];
const BROWN: Rgb = [121, 85, 61];
const DARK_BROWN: Rgb = [59, 38, 21];
const CRIMSON: Rgb = [139, 0, 0];
const JEWEL_RED: Rgb = [220, 20, 60];
const EMBER: Rgb = [226, 88, 34];
const ASH: Rgb = [160, 160, 160];

/// Draw a sticker onto `output` with the given transform from the sticker's
/// base coordinate space.
pub fn draw(kind: StickerKind, output: &mut Pixmap, transform: Transform) {
    match kind {
        StickerKind::Glasses => draw_glasses(output, transform),
        StickerKind::TopHat => draw_top_hat(output, transform),
        StickerKind::Mustache => draw_mustache(output, transform),
        StickerKind::Cigar => draw_cigar(output, transform),
        StickerKind::Bling => draw_bling(output, transform),
        StickerKind::Crown => draw_crown(output, transform),
    }
}

/// Sunglasses in an 80x30 box.
fn draw_glasses(output: &mut Pixmap, transform: Transform) {
    let mut pb = PathBuilder::new();
    push_rect(&mut pb, 4.0, 6.0, 28.0, 18.0); // left lens
    push_rect(&mut pb, 48.0, 6.0, 28.0, 18.0); // right lens
    push_rect(&mut pb, 32.0, 10.0, 16.0, 5.0); // bridge
    push_rect(&mut pb, 0.0, 8.0, 4.0, 4.0); // temple stubs
    push_rect(&mut pb, 76.0, 8.0, 4.0, 4.0);
    fill(output, pb.finish(), BLACK, transform);
}

/// Top hat in an 80x70 box.
fn draw_top_hat(output: &mut Pixmap, transform: Transform) {
    let mut pb = PathBuilder::new();
    push_rect(&mut pb, 16.0, 2.0, 48.0, 56.0); // crown
    push_rect(&mut pb, 2.0, 56.0, 76.0, 12.0); // brim
    fill(output, pb.finish(), BLACK, transform);

    let mut band = PathBuilder::new();
    push_rect(&mut band, 16.0, 42.0, 48.0, 10.0);
    fill(output, band.finish(), CRIMSON, transform);
}

/// Handlebar mustache in an 80x24 box.
fn draw_mustache(output: &mut Pixmap, transform: Transform) {
    let mut pb = PathBuilder::new();
    pb.move_to(40.0, 9.0);
    pb.cubic_to(32.0, 1.0, 16.0, 0.0, 8.0, 6.0);
    pb.cubic_to(1.0, 11.0, 2.0, 20.0, 10.0, 22.0);
    pb.cubic_to(20.0, 24.0, 32.0, 19.0, 40.0, 13.0);
    pb.cubic_to(48.0, 19.0, 60.0, 24.0, 70.0, 22.0);
    pb.cubic_to(78.0, 20.0, 79.0, 11.0, 72.0, 6.0);
    pb.cubic_to(64.0, 0.0, 48.0, 1.0, 40.0, 9.0);
    pb.close();
    fill(output, pb.finish(), DARK_BROWN, transform);
}

/// Lit cigar in a 60x18 box, ember to the right.
fn draw_cigar(output: &mut Pixmap, transform: Transform) {
    let mut body = PathBuilder::new();
    push_rect(&mut body, 4.0, 4.0, 42.0, 10.0);
    fill(output, body.finish(), BROWN, transform);

    let mut band = PathBuilder::new();
    push_rect(&mut band, 32.0, 4.0, 7.0, 10.0);
    fill(output, band.finish(), GOLD, transform);

    let mut ember = PathBuilder::new();
    push_rect(&mut ember, 46.0, 4.0, 8.0, 10.0);
    fill(output, ember.finish(), EMBER, transform);

    let mut ash = PathBuilder::new();
    push_rect(&mut ash, 54.0, 6.0, 4.0, 6.0);
    fill(output, ash.finish(), ASH, transform);
}

/// Dollar-sign medallion in a 60x60 box.
fn draw_bling(output: &mut Pixmap, transform: Transform) {
    let mut outer = PathBuilder::new();
    outer.push_circle(30.0, 30.0, 27.0);
    fill(output, outer.finish(), GOLD, transform);

    let mut inner = PathBuilder::new();
    inner.push_circle(30.0, 30.0, 21.0);
    fill(output, inner.finish(), DARK_GOLD, transform);

    let mut bar = PathBuilder::new();
    bar.move_to(30.0, 14.0);
    bar.line_to(30.0, 46.0);
    stroke(output, bar.finish(), CREAM, 4.0, transform);

    let mut curve = PathBuilder::new();
    curve.move_to(38.0, 20.0);
    curve.cubic_to(34.0, 17.0, 23.0, 17.0, 22.0, 24.0);
    curve.cubic_to(21.0, 30.0, 29.0, 31.0, 33.0, 33.0);
    curve.cubic_to(38.0, 35.0, 40.0, 41.0, 34.0, 43.0);
    curve.cubic_to(28.0, 45.0, 22.0, 42.0, 21.0, 38.0);
    stroke(output, curve.finish(), CREAM, 4.5, transform);
}

/// Three-point crown in a 70x50 box.
fn draw_crown(output: &mut Pixmap, transform: Transform) {
    let mut pb = PathBuilder::new();
    pb.move_to(6.0, 40.0);
    pb.line_to(6.0, 12.0);
    pb.line_to(21.0, 26.0);
    pb.line_to(35.0, 4.0);
    pb.line_to(49.0, 26.0);
    pb.line_to(64.0, 12.0);
    pb.line_to(64.0, 40.0);
    pb.close();
    push_rect(&mut pb, 6.0, 40.0, 58.0, 8.0);
    fill(output, pb.finish(), GOLD, transform);

    let mut jewels = PathBuilder::new();
    jewels.push_circle(6.0, 12.0, 3.5);
    jewels.push_circle(35.0, 4.0, 3.5);
    jewels.push_circle(64.0, 12.0, 3.5);
    fill(output, jewels.finish(), JEWEL_RED, transform);
}

fn push_rect(pb: &mut PathBuilder, x: f32, y: f32, w: f32, h: f32) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pb.push_rect(rect);
    }
}

fn fill(output: &mut Pixmap, path: Option<Path>, color: Rgb, transform: Transform) {
    let Some(path) = path else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], 255);
    paint.anti_alias = true;
    output.fill_path(&path, &paint, FillRule::Winding, transform, None);
}

fn stroke(output: &mut Pixmap, path: Option<Path>, color: Rgb, width: f32, transform: Transform) {
    let Some(path) = path else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], 255);
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    output.stroke_path(&path, &paint, &stroke, transform, None);
}
