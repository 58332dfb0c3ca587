//! Obstacle field: a grid of encoded surface normals.
//!
//! One texel per pixel of the visible domain. A zero texel means "no
//! obstacle"; anything else decodes to the outward surface normal at that
//! point. The grid composes two layers into the single field the simulation
//! queries: a static layer that accumulates brush strokes, and a transient
//! mobile disc that follows the pointer and is recomputed every frame.
//!
//! Row 0 is the bottom of the world; the GPU texture is uploaded in the same
//! order and all shaders index it that way.

use crate::domain::SimulationDomain;
use glam::Vec2;

/// Squared-length threshold of the decoded normal for "an obstacle is here".
pub const OBSTACLE_THRESHOLD: f32 = 0.1;

/// RGBA8 texel as stored in the grid and in the GPU texture.
pub type Texel = [u8; 4];

const EMPTY: Texel = [0, 0, 0, 0];

/// Encode a normal into RGBA8: `r,g = n * 0.5 + 0.5`, alpha marks presence.
/// The zero vector encodes to the all-zero texel.
pub fn encode_normal(n: Vec2) -> Texel {
    if n.length_squared() < 1e-12 {
        return EMPTY;
    }
    let quantize = |v: f32| ((v * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8;
    [quantize(n.x), quantize(n.y), 0, 255]
}

/// Inverse of [`encode_normal`], up to 8-bit quantization.
pub fn decode_normal(t: Texel) -> Vec2 {
    if t[3] < 128 {
        return Vec2::ZERO;
    }
    let expand = |v: u8| v as f32 / 255.0 * 2.0 - 1.0;
    Vec2::new(expand(t[0]), expand(t[1]))
}

/// Half-open texel rectangle, used to track what needs re-uploading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl DirtyRect {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    fn union(self, other: DirtyRect) -> DirtyRect {
        DirtyRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

pub struct ObstacleGrid {
    width: u32,
    height: u32,
    /// Brush strokes accumulate here; survives until an explicit clear.
    static_layer: Vec<Texel>,
    /// Composited queryable field: static layer with the mobile disc on top.
    field: Vec<Texel>,
    /// Last mobile disc (normalized center, half-extent), if any.
    mobile: Option<(Vec2, f32)>,
    dirty: Option<DirtyRect>,
}

impl ObstacleGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            static_layer: vec![EMPTY; len],
            field: vec![EMPTY; len],
            mobile: None,
            dirty: Some(DirtyRect {
                x0: 0,
                y0: 0,
                x1: width,
                y1: height,
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Composited field texels, row-major, row 0 at the bottom.
    pub fn texels(&self) -> &[Texel] {
        &self.field
    }

    /// Take the accumulated dirty rectangle, if any edits happened since the
    /// last upload.
    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.dirty.take()
    }

    fn mark_dirty(&mut self, rect: DirtyRect) {
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(rect),
            None => rect,
        });
    }

    /// Texel bounding box of a disc given in normalized coordinates.
    fn disc_rect(&self, center: Vec2, brush: f32) -> DirtyRect {
        let clamp_x = |v: f32| (v.max(0.0) as u32).min(self.width);
        let clamp_y = |v: f32| (v.max(0.0) as u32).min(self.height);
        DirtyRect {
            x0: clamp_x(((center.x - brush) * self.width as f32).floor()),
            y0: clamp_y(((center.y - brush) * self.height as f32).floor()),
            x1: clamp_x(((center.x + brush) * self.width as f32).ceil() + 1.0),
            y1: clamp_y(((center.y + brush) * self.height as f32).ceil() + 1.0),
        }
    }

    /// Write the disc's radial normals into `layer` over its bounding box.
    /// Texels outside the disc are left untouched.
    fn rasterize_disc(&self, layer: &mut [Texel], center: Vec2, brush: f32) -> DirtyRect {
        let rect = self.disc_rect(center, brush);
        let (w, h) = (self.width as f32, self.height as f32);
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                let uv = Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
                let d = uv - center;
                let d2 = d.length_squared();
                if d2 <= brush * brush {
                    // The exact center texel has no radial direction; give it
                    // a fixed +y normal so a brush smaller than one texel
                    // still registers as solid.
                    let n = if d2 > 0.0 { d / d2.sqrt() } else { Vec2::Y };
                    layer[(y * self.width + x) as usize] = encode_normal(n);
                }
            }
        }
        rect
    }

    /// Copy the static layer back into the field over `rect`.
    fn restore_static(&mut self, rect: DirtyRect) {
        for y in rect.y0..rect.y1 {
            let row = (y * self.width) as usize;
            let (x0, x1) = (rect.x0 as usize, rect.x1 as usize);
            self.field[row + x0..row + x1].copy_from_slice(&self.static_layer[row + x0..row + x1]);
        }
    }

    /// Permanently rasterize a brush disc into the static layer.
    ///
    /// A destructive overwrite: a later stroke fully replaces whatever was
    /// inside its radius. The mobile disc is refreshed at the same position so
    /// the stroke is immediately solid instead of phantom.
    pub fn paint_static(&mut self, center: Vec2, brush: f32) {
        let mut layer = std::mem::take(&mut self.static_layer);
        let rect = self.rasterize_disc(&mut layer, center, brush);
        self.static_layer = layer;
        self.mark_dirty(rect);
        self.set_mobile(center, brush);
    }

    /// Recompute the composited field for a pointer disc at `center`.
    ///
    /// Inside the disc the field takes the disc's radial normal; everywhere
    /// else it falls back to the static layer. Called every frame the pointer
    /// is active, stroke or not, and never persisted.
    pub fn set_mobile(&mut self, center: Vec2, brush: f32) {
        if let Some((old_center, old_brush)) = self.mobile {
            let old_rect = self.disc_rect(old_center, old_brush);
            self.restore_static(old_rect);
            self.mark_dirty(old_rect);
        }
        let mut field = std::mem::take(&mut self.field);
        let rect = self.rasterize_disc(&mut field, center, brush);
        self.field = field;
        self.mobile = Some((center, brush));
        self.mark_dirty(rect);
    }

    /// Clear the static layer back to "no obstacle" everywhere. The mobile
    /// disc is dropped too; the next `set_mobile` acts on the cleared base.
    pub fn clear(&mut self) {
        self.static_layer.fill(EMPTY);
        self.field.fill(EMPTY);
        self.mobile = None;
        self.mark_dirty(DirtyRect {
            x0: 0,
            y0: 0,
            x1: self.width,
            y1: self.height,
        });
    }

    /// Decoded normal at a normalized `[0,1]^2` coordinate, nearest texel.
    pub fn sample_norm(&self, uv: Vec2) -> Vec2 {
        let x = ((uv.x * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((uv.y * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as u32;
        decode_normal(self.field[(y * self.width + x) as usize])
    }

    /// Decoded normal at an arbitrary world coordinate (possibly off texel
    /// centers); this is the lookup the simulation step performs.
    pub fn sample(&self, pos: Vec2, domain: &SimulationDomain) -> Vec2 {
        let uv = Vec2::new(
            pos.x / domain.width + 0.5,
            pos.y / domain.height + 0.5,
        );
        self.sample_norm(uv)
    }

    /// The obstacle test applied by the simulation and the overlay renderer.
    pub fn is_obstacle(n: Vec2) -> bool {
        n.length_squared() > OBSTACLE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        // 8-bit channels: half a quantization step per component.
        let tolerance = 1.0 / 127.5;
        for i in 0..=20 {
            for j in 0..=20 {
                let n = Vec2::new(i as f32 / 10.0 - 1.0, j as f32 / 10.0 - 1.0);
                if n.length_squared() < 1e-12 {
                    continue;
                }
                let back = decode_normal(encode_normal(n));
                assert!(
                    (back.x - n.x).abs() <= tolerance && (back.y - n.y).abs() <= tolerance,
                    "n={n:?} back={back:?}"
                );
            }
        }
    }

    #[test]
    fn zero_vector_means_no_obstacle() {
        assert_eq!(encode_normal(Vec2::ZERO), [0, 0, 0, 0]);
        assert_eq!(decode_normal([0, 0, 0, 0]), Vec2::ZERO);
        assert!(!ObstacleGrid::is_obstacle(Vec2::ZERO));
        assert!(ObstacleGrid::is_obstacle(Vec2::new(0.8, 0.0)));
    }

    #[test]
    fn static_disc_has_radial_normals() {
        let mut grid = ObstacleGrid::new(512, 512);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);

        // Right edge of the disc: outward normal points +x.
        let n = grid.sample_norm(Vec2::new(0.55, 0.5));
        assert!(ObstacleGrid::is_obstacle(n), "edge texel should be solid");
        let dir = n.normalize();
        assert!(dir.x > 0.99, "dir={dir:?}");
        assert!(dir.y.abs() < 0.1, "dir={dir:?}");

        // Top edge points +y.
        let n = grid.sample_norm(Vec2::new(0.5, 0.549));
        assert!(n.normalize().y > 0.99);

        // Well outside the disc there is nothing.
        assert_eq!(grid.sample_norm(Vec2::new(0.7, 0.5)), Vec2::ZERO);
    }

    #[test]
    fn tiny_brush_still_marks_its_center_texel() {
        // Brush smaller than half a texel: only the degenerate center texel
        // falls inside the disc, and it must still read as solid.
        let mut grid = ObstacleGrid::new(64, 64);
        let center = Vec2::new(32.5 / 64.0, 32.5 / 64.0);
        grid.paint_static(center, 0.005);

        let n = grid.sample_norm(center);
        assert!(ObstacleGrid::is_obstacle(n), "center texel left empty: {n:?}");
        assert!(n.y > 0.9, "expected the fixed +y normal: {n:?}");
    }

    #[test]
    fn later_stroke_overwrites_earlier_one() {
        let mut grid = ObstacleGrid::new(256, 256);
        grid.paint_static(Vec2::new(0.4, 0.5), 0.05);
        let before = grid.sample_norm(Vec2::new(0.42, 0.5));
        assert!(ObstacleGrid::is_obstacle(before));

        // A second stroke centered on the probe point replaces the normals,
        // it does not blend with them. The probe sits near the new center, so
        // its direction flips to the new radial frame.
        grid.paint_static(Vec2::new(0.45, 0.5), 0.05);
        let after = grid.sample_norm(Vec2::new(0.42, 0.5));
        assert!(ObstacleGrid::is_obstacle(after));
        assert!(after.normalize().x < 0.0, "after={after:?}");
    }

    #[test]
    fn mobile_disc_is_transient() {
        let mut grid = ObstacleGrid::new(256, 256);
        grid.set_mobile(Vec2::new(0.3, 0.3), 0.06);
        assert!(ObstacleGrid::is_obstacle(grid.sample_norm(Vec2::new(0.33, 0.3))));

        // Moving the pointer restores the static layer underneath.
        grid.set_mobile(Vec2::new(0.7, 0.7), 0.06);
        assert_eq!(grid.sample_norm(Vec2::new(0.33, 0.3)), Vec2::ZERO);
        assert!(ObstacleGrid::is_obstacle(grid.sample_norm(Vec2::new(0.73, 0.7))));
    }

    #[test]
    fn mobile_disc_does_not_disturb_static_strokes() {
        let mut grid = ObstacleGrid::new(256, 256);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);
        grid.set_mobile(Vec2::new(0.52, 0.5), 0.05);
        grid.set_mobile(Vec2::new(0.9, 0.9), 0.05);

        // The stroke is still there after the pointer moved away.
        assert!(ObstacleGrid::is_obstacle(grid.sample_norm(Vec2::new(0.53, 0.5))));
    }

    #[test]
    fn clear_resets_to_empty_field() {
        let mut grid = ObstacleGrid::new(128, 128);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.1);
        grid.clear();
        assert!(grid.texels().iter().all(|t| *t == [0, 0, 0, 0]));

        // Mobile updates after a clear act purely on the cleared base.
        grid.set_mobile(Vec2::new(0.5, 0.5), 0.05);
        grid.set_mobile(Vec2::new(0.1, 0.1), 0.05);
        assert_eq!(grid.sample_norm(Vec2::new(0.5, 0.5)), Vec2::ZERO);
    }

    #[test]
    fn world_space_sampling_matches_normalized() {
        let domain = SimulationDomain::new(10.0, 10.0);
        let mut grid = ObstacleGrid::new(512, 512);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);

        // World (0.5, 0.0) is normalized (0.55, 0.5).
        let n = grid.sample(Vec2::new(0.5, 0.0), &domain);
        assert!(ObstacleGrid::is_obstacle(n));
        assert!(n.normalize().x > 0.99);
    }

    #[test]
    fn dirty_rect_tracks_edits() {
        let mut grid = ObstacleGrid::new(128, 128);
        assert!(grid.take_dirty().is_some()); // initial full upload
        assert!(grid.take_dirty().is_none());

        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);
        let rect = grid.take_dirty().expect("paint must dirty the grid");
        assert!(rect.width() > 0 && rect.height() > 0);
        assert!(rect.width() < 128, "a small stroke must not dirty everything");
    }
}
