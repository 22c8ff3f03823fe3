// Web Mercator projection and slippy-map tile math for the map canvas.
use crate::ftt_state::Viewport;
use egui::{Pos2, Rect, Vec2, vec2};
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 18.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

pub const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";
pub const TILE_COPYRIGHT_URL: &str = "https://www.openstreetmap.org/copyright";

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// World pixel coordinates of a point at `zoom`.
pub fn project(lat: f64, lon: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`]; longitude is wrapped into [-180, 180).
pub fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
    (lat, wrap_longitude(lon))
}

fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn url(&self) -> String {
        TILE_URL_TEMPLATE
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTile {
    pub tile: TileId,
    pub rect: Rect,
}

/// Local camera of the map widget. Starts from the stored viewport and is
/// then driven by the user only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCamera {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
}

impl MapCamera {
    pub fn from_viewport(viewport: Viewport) -> Self {
        MapCamera {
            center_lat: viewport.center_lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center_lon: wrap_longitude(viewport.center_lon),
            zoom: viewport.zoom.round().clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            center_lat: self.center_lat,
            center_lon: self.center_lon,
            zoom: self.zoom,
        }
    }

    fn center_world(&self) -> (f64, f64) {
        project(self.center_lat, self.center_lon, self.zoom)
    }

    pub fn to_screen(&self, lat: f64, lon: f64, canvas: Rect) -> Pos2 {
        let (cx, cy) = self.center_world();
        let (x, y) = project(lat, lon, self.zoom);
        canvas.center() + vec2((x - cx) as f32, (y - cy) as f32)
    }

    /// Move the map content by `delta` screen points.
    pub fn pan(&mut self, delta: Vec2) {
        let (cx, cy) = self.center_world();
        let (lat, lon) = unproject(cx - delta.x as f64, cy - delta.y as f64, self.zoom);
        self.center_lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        self.center_lon = lon;
    }

    /// Zoom by whole levels around the center. Returns whether anything changed.
    pub fn zoom_by(&mut self, levels: i32) -> bool {
        let zoom = (self.zoom + levels as f64).clamp(MIN_ZOOM, MAX_ZOOM);
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed
    }

    /// Tiles covering `canvas`, with their screen rectangles. Columns wrap
    /// around the antimeridian; rows outside the world are skipped.
    pub fn visible_tiles(&self, canvas: Rect) -> Vec<PlacedTile> {
        let zoom = self.zoom as u8;
        let count = 1i64 << zoom;
        let (cx, cy) = self.center_world();
        let left = cx - canvas.width() as f64 / 2.0;
        let top = cy - canvas.height() as f64 / 2.0;

        let first_x = (left / TILE_SIZE).floor() as i64;
        let last_x = ((left + canvas.width() as f64) / TILE_SIZE).floor() as i64;
        let first_y = ((top / TILE_SIZE).floor() as i64).max(0);
        let last_y = (((top + canvas.height() as f64) / TILE_SIZE).floor() as i64).min(count - 1);

        let mut tiles = Vec::new();
        for ty in first_y..=last_y {
            for tx in first_x..=last_x {
                let offset = vec2(
                    (tx as f64 * TILE_SIZE - left) as f32,
                    (ty as f64 * TILE_SIZE - top) as f32,
                );
                let min = canvas.min + offset;
                tiles.push(PlacedTile {
                    tile: TileId {
                        zoom,
                        x: tx.rem_euclid(count) as u32,
                        y: ty as u32,
                    },
                    rect: Rect::from_min_size(min, Vec2::splat(TILE_SIZE as f32)),
                });
            }
        }
        tiles
    }
}
