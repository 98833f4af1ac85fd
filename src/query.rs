//! Typed query-string decoding for the control endpoints.
//!
//! Every handler decodes its whole query up front into a typed value, so a
//! bad request is rejected before any motor or camera side effect happens.
//! All [`QueryError`] variants map to HTTP 404.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::query::{parse_config, parse_drive, QueryError};
//! use rs_rover::camera::CameraParam;
//! use rs_rover::DriveCommand;
//!
//! assert_eq!(parse_drive("forward=40&steer=-10"), Ok(DriveCommand::new(40, -10)));
//! assert_eq!(parse_config("quality=15"), Ok(CameraParam::Quality(15)));
//! assert!(matches!(parse_config("bogus=1"), Err(QueryError::UnknownKey(_))));
//! ```

use thiserror::Error;

use crate::camera::CameraParam;
use crate::drive::DriveCommand;

/// Reasons a query string was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No query string at all.
    #[error("empty query string")]
    Empty,

    /// A required key was absent.
    #[error("missing parameter `{0}`")]
    Missing(String),

    /// A value did not parse as `i32`.
    #[error("parameter `{key}` is not an integer: {value:?}")]
    NotAnInteger {
        /// Offending key.
        key: String,
        /// Raw value as received.
        value: String,
    },

    /// A key this endpoint does not accept.
    #[error("unrecognised parameter `{0}`")]
    UnknownKey(String),

    /// None of the accepted keys was present.
    #[error("no recognised parameter")]
    NoRecognisedKey,

    /// `/config` received more than one setting.
    #[error("more than one setting in one request")]
    Ambiguous,
}

/// Decoded `key=value` pairs in request order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decode a raw query string. A leading `?` is ignored.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        if raw.is_empty() {
            return Err(QueryError::Empty);
        }
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        if pairs.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self { pairs })
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, parsed as a decimal integer.
    pub fn get_int(&self, key: &str) -> Result<i32, QueryError> {
        let value = self
            .get(key)
            .ok_or_else(|| QueryError::Missing(key.to_string()))?;
        value
            .trim()
            .parse()
            .map_err(|_| QueryError::NotAnInteger {
                key: key.to_string(),
                value: value.to_string(),
            })
    }

    /// Iterates over the decoded pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs were decoded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Decode `/drive?forward=F&steer=S`. Both keys are required.
pub fn parse_drive(raw: &str) -> Result<DriveCommand, QueryError> {
    let params = QueryParams::parse(raw)?;
    let forward = params.get_int("forward")?;
    let steer = params.get_int("steer")?;
    Ok(DriveCommand::new(forward, steer))
}

/// Decode `/config`: exactly one of `framesize`, `quality`, `flash`.
pub fn parse_config(raw: &str) -> Result<CameraParam, QueryError> {
    let params = QueryParams::parse(raw)?;

    let mut found: Option<&str> = None;
    for (key, _) in params.iter() {
        if !CameraParam::KEYS.contains(&key) {
            return Err(QueryError::UnknownKey(key.to_string()));
        }
        if found.is_some() {
            return Err(QueryError::Ambiguous);
        }
        found = Some(key);
    }

    let key = found.ok_or(QueryError::NoRecognisedKey)?;
    let value = params.get_int(key)?;
    CameraParam::from_key(key, value).ok_or_else(|| QueryError::UnknownKey(key.to_string()))
}

/// A decoded `/control?var=&val=` request from the button UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlVar {
    /// Camera or light setting, same as `/config`.
    Camera(CameraParam),
    /// Speed level, nominally 0..=8.
    Speed(i32),
    /// Left servo neutral trim.
    LeftTrim(i32),
    /// Right servo neutral trim.
    RightTrim(i32),
    /// Car movement code (1 forward, 2 backward, 3 left, 4 right, else stop).
    Car(i32),
}

/// Decode `/control?var=NAME&val=N`.
pub fn parse_control(raw: &str) -> Result<ControlVar, QueryError> {
    let params = QueryParams::parse(raw)?;
    let var = params
        .get("var")
        .ok_or_else(|| QueryError::Missing("var".to_string()))?;
    let val = params.get_int("val")?;

    if let Some(param) = CameraParam::from_key(var, val) {
        return Ok(ControlVar::Camera(param));
    }
    match var {
        "speed" => Ok(ControlVar::Speed(val)),
        "ltrim" => Ok(ControlVar::LeftTrim(val)),
        "rtrim" => Ok(ControlVar::RightTrim(val)),
        "car" => Ok(ControlVar::Car(val)),
        other => Err(QueryError::UnknownKey(other.to_string())),
    }
}
