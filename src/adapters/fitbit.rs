//! Fitbit vendor adapter
//!
//! Parses Fitbit Web API payloads (sleep logs v1.2, intraday and daily heart
//! rate) into typed pipeline inputs.

use crate::error::ComputeError;
use crate::timestamps::{parse_date, parse_time_of_day, parse_timestamp};
use crate::types::{
    DailyHeartRateSummary, DailyRestingHeartRate, HeartRateSample, HeartRateSeries, SleepLevel,
    SleepLog, SleepStageSegment,
};
use serde::Deserialize;
use serde_json::Value;

use super::VendorPayloadAdapter;

/// Fitbit payload adapter
pub struct FitbitAdapter;

impl VendorPayloadAdapter for FitbitAdapter {
    /// Flatten a per-date sleep response (`{"sleep": [...]}`) into its log
    /// entries. Bare arrays and single log objects are accepted as well.
    fn sleep_log_entries(&self, response: &Value) -> Vec<Value> {
        match response {
            Value::Array(entries) => entries.clone(),
            Value::Object(map) => match map.get("sleep") {
                Some(Value::Array(entries)) => entries.clone(),
                Some(_) => Vec::new(),
                None if map.contains_key("startTime") => vec![response.clone()],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn sleep_logs(&self, raw_logs: &[Value]) -> Result<Vec<SleepLog>, ComputeError> {
        let mut logs = Vec::with_capacity(raw_logs.len());

        for (index, raw) in raw_logs.iter().enumerate() {
            let entry = match FitbitSleepLog::deserialize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping sleep log {index}: {e}");
                    continue;
                }
            };
            if let Some(log) = convert_sleep_log(entry)? {
                logs.push(log);
            } else {
                log::warn!("skipping sleep log {index}: missing startTime or endTime");
            }
        }

        Ok(logs)
    }

    fn heart_rate_series(&self, raw: &Value) -> Result<Option<HeartRateSeries>, ComputeError> {
        let payload = match FitbitHeartRatePayload::deserialize(raw) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("ignoring intraday heart rate payload: {e}");
                return Ok(None);
            }
        };

        let dataset = payload.intraday.map(|i| i.dataset).unwrap_or_default();
        if dataset.is_empty() {
            return Ok(None);
        }

        let Some(first_day) = payload.days.first() else {
            log::warn!("intraday heart rate has no activities-heart entry to anchor dates");
            return Ok(None);
        };
        let anchor_date = parse_date("activities-heart.dateTime", &first_day.date_time)?;

        let mut samples = Vec::with_capacity(dataset.len());
        for point in dataset {
            let time = parse_time_of_day("activities-heart-intraday.dataset.time", &point.time)?;
            match bpm(point.value) {
                Some(value) => samples.push(HeartRateSample { time, value }),
                None => log::warn!("skipping heart rate sample at {time} with value {}", point.value),
            }
        }

        Ok(Some(HeartRateSeries {
            anchor_date,
            samples,
        }))
    }

    fn daily_summary(&self, raw: &Value) -> Result<Option<DailyHeartRateSummary>, ComputeError> {
        let payload = match FitbitHeartRatePayload::deserialize(raw) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("ignoring daily heart rate payload: {e}");
                return Ok(None);
            }
        };
        if payload.days.is_empty() {
            return Ok(None);
        }

        let days = payload
            .days
            .iter()
            .map(|day| {
                Ok(DailyRestingHeartRate {
                    date: parse_date("activities-heart.dateTime", &day.date_time)?,
                    resting_heart_rate: day
                        .value
                        .get("restingHeartRate")
                        .and_then(Value::as_f64)
                        .and_then(bpm),
                })
            })
            .collect::<Result<Vec<_>, ComputeError>>()?;

        Ok(Some(DailyHeartRateSummary { days }))
    }
}

fn convert_sleep_log(entry: FitbitSleepLog) -> Result<Option<SleepLog>, ComputeError> {
    let (Some(start), Some(end)) = (entry.start_time, entry.end_time) else {
        return Ok(None);
    };

    let mut stages = Vec::new();
    for level in entry.levels.map(|l| l.data).unwrap_or_default() {
        let start_time = parse_timestamp("levels.data.dateTime", &level.date_time)?;
        match SleepLevel::from_vendor(&level.level) {
            Some(stage) => {
                stages.push(SleepStageSegment::try_new(stage, start_time, level.seconds)?)
            }
            None => log::debug!("dropping {} segment at {}", level.level, level.date_time),
        }
    }

    Ok(Some(SleepLog {
        start_time: parse_timestamp("startTime", &start)?,
        end_time: parse_timestamp("endTime", &end)?,
        stages,
    }))
}

/// Whole beats per minute from a JSON number; `None` if negative or not finite.
fn bpm(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX)).then(|| value.round() as u32)
}

// Fitbit API response structures

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FitbitSleepLog {
    start_time: Option<String>,
    end_time: Option<String>,
    levels: Option<FitbitSleepLevels>,
}

#[derive(Debug, Deserialize)]
struct FitbitSleepLevels {
    #[serde(default)]
    data: Vec<FitbitLevelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FitbitLevelEntry {
    date_time: String,
    level: String,
    seconds: u32,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartRatePayload {
    #[serde(rename = "activities-heart", default)]
    days: Vec<FitbitHeartDay>,
    #[serde(rename = "activities-heart-intraday")]
    intraday: Option<FitbitIntraday>,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartDay {
    #[serde(rename = "dateTime")]
    date_time: String,
    /// Object for daily summaries; intraday responses may carry a string
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct FitbitIntraday {
    #[serde(default)]
    dataset: Vec<FitbitIntradayPoint>,
}

#[derive(Debug, Deserialize)]
struct FitbitIntradayPoint {
    time: String,
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    fn sample_sleep_json() -> Value {
        json!({
            "sleep": [{
                "dateOfSleep": "2024-01-16",
                "startTime": "2024-01-15T22:00:00.000",
                "endTime": "2024-01-16T06:00:00.000",
                "isMainSleep": true,
                "levels": {
                    "data": [
                        {"dateTime": "2024-01-15T22:00:00.000", "level": "wake", "seconds": 300},
                        {"dateTime": "2024-01-15T22:05:00.000", "level": "light", "seconds": 1800},
                        {"dateTime": "2024-01-15T22:35:00.000", "level": "deep", "seconds": 3600}
                    ],
                    "shortData": [
                        {"dateTime": "2024-01-15T23:00:00.000", "level": "wake", "seconds": 30}
                    ]
                }
            }]
        })
    }

    #[test]
    fn test_parse_sleep_response() {
        let entries = FitbitAdapter.sleep_log_entries(&sample_sleep_json());
        let logs = FitbitAdapter.sleep_logs(&entries).unwrap();

        assert_eq!(logs.len(), 1);
        let log = &logs[0];
        assert_eq!(log.start_time, Utc.with_ymd_and_hms(2024, 1, 15, 22, 0, 0).unwrap());
        assert_eq!(log.end_time, Utc.with_ymd_and_hms(2024, 1, 16, 6, 0, 0).unwrap());
        assert_eq!(log.stages.len(), 3);
        assert_eq!(log.stages[2].level, SleepLevel::Deep);
        assert_eq!(log.stages[2].duration_seconds, 3600);
    }

    #[test]
    fn test_sleep_log_entries_shapes() {
        assert_eq!(FitbitAdapter.sleep_log_entries(&json!({"sleep": []})).len(), 0);
        assert_eq!(FitbitAdapter.sleep_log_entries(&json!([{}, {}])).len(), 2);
        assert_eq!(
            FitbitAdapter.sleep_log_entries(&json!({"startTime": "x", "endTime": "y"})).len(),
            1
        );
        assert!(FitbitAdapter.sleep_log_entries(&json!({"summary": {}})).is_empty());
        assert!(FitbitAdapter.sleep_log_entries(&Value::Null).is_empty());
    }

    #[test]
    fn test_unknown_levels_are_dropped() {
        let raw = json!({
            "startTime": "2024-01-15T22:00:00.000",
            "endTime": "2024-01-15T23:00:00.000",
            "levels": {"data": [
                {"dateTime": "2024-01-15T22:00:00.000", "level": "restless", "seconds": 60},
                {"dateTime": "2024-01-15T22:01:00.000", "level": "rem", "seconds": 60}
            ]}
        });
        let logs = FitbitAdapter.sleep_logs(&[raw]).unwrap();
        assert_eq!(logs[0].stages.len(), 1);
        assert_eq!(logs[0].stages[0].level, SleepLevel::Rem);
    }

    #[test]
    fn test_incomplete_logs_degrade() {
        let raw = vec![
            json!({"startTime": "2024-01-15T22:00:00.000"}),
            json!({"startTime": 12, "endTime": true}),
            json!({"startTime": "2024-01-15T22:00:00.000", "endTime": "2024-01-15T23:00:00.000"}),
        ];
        let logs = FitbitAdapter.sleep_logs(&raw).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].stages.is_empty());
    }

    #[test]
    fn test_malformed_stage_timestamp_is_an_error() {
        let raw = json!({
            "startTime": "2024-01-15T22:00:00.000",
            "endTime": "2024-01-15T23:00:00.000",
            "levels": {"data": [{"dateTime": "22:00", "level": "rem", "seconds": 60}]}
        });
        let err = FitbitAdapter.sleep_logs(&[raw]).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::TimestampParse { field: "levels.data.dateTime", .. }
        ));
    }

    #[test]
    fn test_segment_ending_past_max_timestamp_is_an_error() {
        let raw = json!({
            "startTime": "+262142-12-31T22:00:00",
            "endTime": "+262142-12-31T23:59:00",
            "levels": {"data": [
                {"dateTime": "+262142-12-31T23:00:00", "level": "wake", "seconds": 7200}
            ]}
        });
        assert!(matches!(
            FitbitAdapter.sleep_logs(&[raw]),
            Err(ComputeError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_intraday_heart_rate() {
        let raw = json!({
            "activities-heart": [{"dateTime": "2024-01-15", "value": "61.2"}],
            "activities-heart-intraday": {
                "dataset": [
                    {"time": "23:59:00", "value": 58},
                    {"time": "00:00:00", "value": 57}
                ],
                "datasetInterval": 1,
                "datasetType": "minute"
            }
        });
        let series = FitbitAdapter.heart_rate_series(&raw).unwrap().unwrap();
        assert_eq!(series.anchor_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(series.samples.len(), 2);
        assert_eq!(series.samples[1].value, 57);
    }

    #[test]
    fn test_missing_intraday_degrades_to_none() {
        let adapter = FitbitAdapter;
        assert!(adapter.heart_rate_series(&json!({})).unwrap().is_none());
        assert!(adapter
            .heart_rate_series(&json!({
                "activities-heart": [{"dateTime": "2024-01-15"}],
                "activities-heart-intraday": {"dataset": []}
            }))
            .unwrap()
            .is_none());
        assert!(adapter
            .heart_rate_series(&json!({
                "activities-heart-intraday": {"dataset": [{"time": "10:00:00", "value": 60}]}
            }))
            .unwrap()
            .is_none());
        assert!(adapter.heart_rate_series(&json!("offline")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_intraday_time_is_an_error() {
        let raw = json!({
            "activities-heart": [{"dateTime": "2024-01-15"}],
            "activities-heart-intraday": {"dataset": [{"time": "quarter past", "value": 60}]}
        });
        assert!(matches!(
            FitbitAdapter.heart_rate_series(&raw),
            Err(ComputeError::TimestampParse { .. })
        ));
    }

    #[test]
    fn test_parse_daily_summary() {
        let raw = json!({
            "activities-heart": [
                {"dateTime": "2024-01-15", "value": {"restingHeartRate": 58, "heartRateZones": []}},
                {"dateTime": "2024-01-16", "value": {"heartRateZones": []}}
            ]
        });
        let summary = FitbitAdapter.daily_summary(&raw).unwrap().unwrap();
        assert_eq!(summary.days.len(), 2);
        assert_eq!(summary.resting_heart_rate(), Some(58));
        assert_eq!(summary.days[1].resting_heart_rate, None);
    }

    #[test]
    fn test_empty_daily_summary() {
        assert!(FitbitAdapter
            .daily_summary(&json!({"activities-heart": []}))
            .unwrap()
            .is_none());
        assert!(FitbitAdapter.daily_summary(&Value::Null).unwrap().is_none());
    }
}
