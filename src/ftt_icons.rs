// Map pin glyphs, colored by speed.
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Speeds strictly above this are drawn red.
pub const FAST_SPEED_KMH: f64 = 120.0;

/// Displayed size of a marker, in points.
pub const ICON_SIZE: [f32; 2] = [32.0, 40.0];
/// Point of the icon that sits on the train position (bottom-center).
pub const ICON_ANCHOR: [f32; 2] = [16.0, 40.0];
/// Popup offset relative to the anchor (above the pin tip).
pub const POPUP_ANCHOR: [f32; 2] = [0.0, -40.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedBucket {
    Normal,
    Fast,
}

impl SpeedBucket {
    pub fn for_speed(speed: f64) -> SpeedBucket {
        if speed > FAST_SPEED_KMH {
            SpeedBucket::Fast
        } else {
            SpeedBucket::Normal
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SpeedBucket::Normal => "green",
            SpeedBucket::Fast => "red",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MarkerIcon {
    pub bucket: SpeedBucket,
    /// Image source id understood by the egui svg loader.
    pub uri: String,
    pub svg: Arc<[u8]>,
}

impl MarkerIcon {
    pub fn color(&self) -> &'static str {
        self.bucket.color()
    }
}

lazy_static! {
    static ref ICON_CACHE: Mutex<HashMap<SpeedBucket, Arc<MarkerIcon>>> = Mutex::new(HashMap::new());
}

/// Icon for a train; an absent speed counts as 0.
pub fn icon_for_speed(speed: Option<f64>) -> Arc<MarkerIcon> {
    icon_for_bucket(SpeedBucket::for_speed(speed.unwrap_or(0.0)))
}

pub fn icon_for_bucket(bucket: SpeedBucket) -> Arc<MarkerIcon> {
    let mut cache = ICON_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    cache
        .entry(bucket)
        .or_insert_with(|| {
            Arc::new(MarkerIcon {
                bucket,
                uri: format!("bytes://marker-{}.svg", bucket.color()),
                svg: pin_svg(bucket.color()).into_bytes().into(),
            })
        })
        .clone()
}

fn pin_svg(color: &str) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="50" viewBox="0 0 40 50">"#,
            r#"<path fill="{}" stroke="black" stroke-width="2" "#,
            r#"d="M20,2 C10,2 2,10 2,20 C2,30 20,48 20,48 C20,48 38,30 38,20 C38,10 30,2 20,2 Z"/>"#,
            r#"<circle cx="20" cy="20" r="8" fill="white"/>"#,
            "</svg>"
        ),
        color
    )
}
