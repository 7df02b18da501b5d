//! Derived view over one history payload.
//!
//! Everything here is recomputed from scratch on every poll tick; nothing is
//! diffed against the previous frame.

use chrono::{DateTime, Local, Utc};

use super::LIVE_CHART_MAX_POINTS;
use crate::domain::Reading;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn bounds(&self) -> [f64; 2] {
        [self.min, self.max]
    }
}

pub const DISTANCE_AXIS: AxisRange = AxisRange { min: 0.0, max: 10.0 };
pub const DETECTION_AXIS: AxisRange = AxisRange { min: -0.1, max: 1.1 };

/// which field of a reading a chart or table shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Series {
    Distance,
    Detection,
}

impl Series {
    pub fn label(&self) -> &'static str {
        match self {
            Series::Distance => "Distance",
            Series::Detection => "Detection",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Series::Distance => "#007bff",
            Series::Detection => "#dc3545",
        }
    }

    pub fn axis(&self) -> AxisRange {
        match self {
            Series::Distance => DISTANCE_AXIS,
            Series::Detection => DETECTION_AXIS,
        }
    }

    /// detection is drawn as a 0/1 step line
    pub fn stepped(&self) -> bool {
        matches!(self, Series::Detection)
    }

    fn value(&self, reading: &Reading) -> f64 {
        match self {
            Series::Distance => reading.distance_cm,
            Series::Detection => {
                if reading.led_is_on {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    /// already clamped to the series axis
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiveChart {
    pub series: Series,
    pub points: Vec<ChartPoint>,
}

impl LiveChart {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// visual treatment of a table cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Plain,
    /// something is in front of the sensor
    Alert,
    /// nothing detected
    Ok,
}

impl Tone {
    /// hex color for the cell text; `Plain` keeps the terminal default.
    /// toned cells are drawn bold.
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Tone::Plain => None,
            Tone::Alert => Some("#dc3545"),
            Tone::Ok => Some("#28a745"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub time: String,
    pub value: String,
    pub tone: Tone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView {
    pub distance_chart: LiveChart,
    pub detection_chart: LiveChart,
    pub distance_table: Vec<TableRow>,
    pub detection_table: Vec<TableRow>,
}

pub fn time_label(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// the last `LIVE_CHART_MAX_POINTS` readings, still oldest first
pub fn live_window(data: &[Reading]) -> &[Reading] {
    &data[data.len().saturating_sub(LIVE_CHART_MAX_POINTS)..]
}

pub fn live_chart(series: Series, data: &[Reading]) -> LiveChart {
    let axis = series.axis();
    let points = live_window(data)
        .iter()
        .map(|reading| ChartPoint {
            label: time_label(&reading.created_at),
            value: axis.clamp(series.value(reading)),
        })
        .collect();

    LiveChart { series, points }
}

/// every row of the payload, newest first
pub fn history_table(series: Series, data: &[Reading]) -> Vec<TableRow> {
    data.iter()
        .rev()
        .map(|reading| {
            let (value, tone) = match series {
                Series::Distance => (format!("{:.2}", reading.distance_cm), Tone::Plain),
                Series::Detection if reading.led_is_on => ("Detected".to_string(), Tone::Alert),
                Series::Detection => ("Clear".to_string(), Tone::Ok),
            };
            TableRow { time: time_label(&reading.created_at), value, tone }
        })
        .collect()
}

/// `None` for an empty payload: the previous frame stays on screen
pub fn build_view(data: &[Reading]) -> Option<DashboardView> {
    if data.is_empty() {
        return None;
    }

    Some(DashboardView {
        distance_chart: live_chart(Series::Distance, data),
        detection_chart: live_chart(Series::Detection, data),
        distance_table: history_table(Series::Distance, data),
        detection_table: history_table(Series::Detection, data),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn readings(count: usize) -> Vec<Reading> {
        let start = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        (0..count)
            .map(|i| Reading {
                id: i as i64 + 1,
                distance_cm: (i % 10) as f64 + 0.5,
                led_is_on: i % 3 == 0,
                created_at: start + Duration::seconds(i as i64),
            })
            .collect()
    }

    #[test]
    fn live_chart_keeps_last_twenty_in_order() {
        let data = readings(30);
        let chart = live_chart(Series::Distance, &data);

        assert_eq!(chart.points.len(), LIVE_CHART_MAX_POINTS);
        let expected: Vec<f64> = data[10..].iter().map(|r| r.distance_cm).collect();
        assert_eq!(chart.values(), expected);
    }

    #[test]
    fn short_payload_is_charted_whole() {
        let data = readings(3);
        assert_eq!(live_window(&data).len(), 3);
        assert_eq!(live_chart(Series::Detection, &data).values(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn distance_is_clamped_to_axis() {
        let mut data = readings(2);
        data[0].distance_cm = 42.0;
        data[1].distance_cm = -3.0;
        assert_eq!(live_chart(Series::Distance, &data).values(), vec![10.0, 0.0]);
    }

    #[test]
    fn detection_chart_is_stepped_with_padded_axis() {
        assert!(Series::Detection.stepped());
        assert!(!Series::Distance.stepped());
        assert_eq!(Series::Detection.axis(), AxisRange { min: -0.1, max: 1.1 });
        assert_eq!(Series::Distance.axis(), AxisRange { min: 0.0, max: 10.0 });
    }

    #[test]
    fn tables_hold_every_row_newest_first() {
        let data = readings(30);
        let table = history_table(Series::Distance, &data);

        assert_eq!(table.len(), 30);
        assert_eq!(table[0].value, format!("{:.2}", data[29].distance_cm));
        assert_eq!(table[29].value, format!("{:.2}", data[0].distance_cm));
    }

    #[test]
    fn distance_cells_have_two_decimals() {
        let mut data = readings(1);
        data[0].distance_cm = 5.0;
        assert_eq!(history_table(Series::Distance, &data)[0].value, "5.00");
        data[0].distance_cm = 3.14159;
        assert_eq!(history_table(Series::Distance, &data)[0].value, "3.14");
    }

    #[test]
    fn detection_cells_use_text_and_tone() {
        let mut data = readings(2);
        data[0].led_is_on = true;
        data[1].led_is_on = false;

        let table = history_table(Series::Detection, &data);
        assert_eq!((table[0].value.as_str(), table[0].tone), ("Clear", Tone::Ok));
        assert_eq!((table[1].value.as_str(), table[1].tone), ("Detected", Tone::Alert));
    }

    #[test]
    fn empty_payload_builds_nothing() {
        assert!(build_view(&[]).is_none());
        assert!(build_view(&readings(1)).is_some());
    }
}
