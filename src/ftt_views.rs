// Views for the train tracker: list/marker building shared by the window and
// the console mode, plus the console output itself.
use crate::ftt_config::FTTConfig;
use crate::ftt_icons::{self, MarkerIcon};
use crate::ftt_models::TrainRecord;
use crate::ftt_regions::Region;
use crate::ftt_state::ViewSnapshot;
use chrono::{DateTime, Utc};
use chrono_tz::Europe::Helsinki;
use std::sync::Arc;

/// A train that can be placed on the map.
#[derive(Debug, Clone)]
pub struct TrainMarker<'a> {
    pub train: &'a TrainRecord,
    pub lat: f64,
    pub lon: f64,
    pub icon: Arc<MarkerIcon>,
}

pub struct FTTViews;

impl FTTViews {
    /// Fastest first; a missing speed sorts as 0 and ties keep feed order.
    pub fn sorted_by_speed(trains: &[TrainRecord]) -> Vec<&TrainRecord> {
        let mut sorted: Vec<&TrainRecord> = trains.iter().collect();
        sorted.sort_by(|a, b| b.speed_or_zero().total_cmp(&a.speed_or_zero()));
        sorted
    }

    /// Sidebar contents for the selected region.
    pub fn sidebar_trains(trains: &[TrainRecord], region: Region) -> Vec<&TrainRecord> {
        let mut sorted = Self::sorted_by_speed(trains);
        if region != Region::All {
            sorted.retain(|train| region.admits(train.region()));
        }
        sorted
    }

    /// One marker per train with a usable position, in feed order.
    pub fn map_markers(trains: &[TrainRecord], filter: Region) -> Vec<TrainMarker<'_>> {
        trains
            .iter()
            .filter_map(|train| {
                let position = train.position()?;
                let (lat, lon) = (position.y(), position.x());
                if !filter.admits(Some(Region::classify(lat, lon))) {
                    return None;
                }
                Some(TrainMarker {
                    train,
                    lat,
                    lon,
                    icon: ftt_icons::icon_for_speed(train.speed),
                })
            })
            .collect()
    }

    pub fn train_label(train: &TrainRecord) -> String {
        match train.train_number {
            Some(number) => format!("Train {}", number),
            None => "Train ?".to_string(),
        }
    }

    pub fn sidebar_line(train: &TrainRecord) -> String {
        format!(
            "{} → {} km/h {}",
            Self::train_label(train),
            raw_or_dash(train.speed),
            raw_or_dash(train.heading)
        )
    }

    pub fn popup_lines(train: &TrainRecord) -> Vec<String> {
        let mut lines = vec![
            format!("Speed: {} km/h", raw_or_na(train.speed)),
            format!("Heading: {}", raw_or_na(train.heading)),
        ];
        if let Some(date) = &train.departure_date {
            lines.push(format!("Departure date: {}", date));
        }
        if let Some(timestamp) = train.timestamp {
            lines.push(format!("Reported: {}", Self::format_clock(timestamp)));
        }
        lines
    }

    /// Wall-clock time in Finland.
    pub fn format_clock(time: DateTime<Utc>) -> String {
        time.with_timezone(&Helsinki).format("%H:%M:%S").to_string()
    }

    // ========================================================================
    // Console output
    // ========================================================================

    pub fn show_welcome_screen(config: &FTTConfig) {
        println!("\n{}", "═".repeat(70));
        println!("  🚆 TRAIN TRACKER - LIVE TRAIN LOCATIONS IN FINLAND");
        println!("{}", "═".repeat(70));
        println!("\n  🌐 Data source: {}", config.feed_url);
        println!("  🔄 Refreshing every {} seconds", config.poll_interval.as_secs());
        println!("  📍 Region filter: {}", config.region);
        println!("\n  Press Ctrl-C to quit");
        println!("{}", "═".repeat(70));
    }

    pub fn show_train_list(snapshot: &ViewSnapshot) {
        let trains = Self::sidebar_trains(&snapshot.trains, snapshot.region);
        let updated = snapshot
            .last_tick
            .map(Self::format_clock)
            .unwrap_or_else(|| "never".to_string());

        println!("\n{}", "═".repeat(70));
        println!(
            "🚆 ACTIVE TRAINS | Region: {} | {} shown of {} | Updated {}",
            snapshot.region,
            trains.len(),
            snapshot.trains.len(),
            updated
        );
        println!("{}", "─".repeat(70));

        if trains.is_empty() {
            println!("  No trains to show");
        }
        for train in trains {
            println!("  {}", Self::sidebar_line(train));
        }
        println!("{}", "═".repeat(70));
    }

    pub fn goodbye_message() {
        println!("\n👋 Stopped polling. Goodbye!");
    }
}

fn raw_or_dash(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn raw_or_na(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}
