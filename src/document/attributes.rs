//! Typed attribute access
//!
//! Attribute text is parsed on demand. A blank value is treated the same as
//! a missing attribute. Anything else that fails to parse, including `nan`
//! and `inf`, is reported as a malformed attribute naming the element and
//! the attribute along with the raw text.

use super::Element;
use crate::error::{Error, Result};
use nalgebra::Vector3;

impl Element {
    /// Attribute value, with blank values treated as absent
    pub fn non_blank_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.trim().is_empty())
    }

    /// Parse a whitespace-separated list of floats
    pub fn parse_floats(&self, name: &str) -> Result<Option<Vec<f64>>> {
        let Some(raw) = self.non_blank_attr(name) else {
            return Ok(None);
        };

        raw.split_whitespace()
            .map(|token| {
                let reason = match token.parse::<f64>() {
                    Ok(value) if value.is_finite() => return Ok(value),
                    Ok(_) => format!("'{}' is not a finite number", token),
                    Err(_) => format!("'{}' is not a number", token),
                };
                Err(Error::malformed_attribute(self.tag(), name, raw, reason))
            })
            .collect::<Result<Vec<f64>>>()
            .map(Some)
    }

    /// Parse exactly `N` floats
    pub fn parse_array<const N: usize>(&self, name: &str) -> Result<Option<[f64; N]>> {
        let Some(values) = self.parse_floats(name)? else {
            return Ok(None);
        };

        let raw = self.attr(name).unwrap_or_default();
        let count = values.len();
        <[f64; N]>::try_from(values).map(Some).map_err(|_| {
            Error::malformed_attribute(
                self.tag(),
                name,
                raw,
                format!("expected {} values, got {}", N, count),
            )
        })
    }

    /// Parse a 3-component vector
    pub fn parse_vector3(&self, name: &str) -> Result<Option<Vector3<f64>>> {
        Ok(self.parse_array::<3>(name)?.map(Vector3::from))
    }

    /// Parse a single float
    pub fn parse_f64(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.parse_array::<1>(name)?.map(|[value]| value))
    }

    /// Parse a single integer
    pub fn parse_i64(&self, name: &str) -> Result<Option<i64>> {
        let Some(raw) = self.non_blank_attr(name) else {
            return Ok(None);
        };
        raw.trim().parse::<i64>().map(Some).map_err(|_| {
            Error::malformed_attribute(self.tag(), name, raw, "expected an integer")
        })
    }

    /// Write a list of floats as space-separated text
    ///
    /// Negative zero is written as `0`.
    pub fn set_floats(&mut self, name: &str, values: &[f64]) {
        let text = values
            .iter()
            .map(|value| if *value == 0.0 { 0.0 } else { *value })
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(name, text);
    }
}

/// Map an MJCF identifier into the downstream naming domain
///
/// `.` and `-` are not valid in scene-graph path segments; both become `_`.
pub fn normalize_identifier(name: &str) -> String {
    name.replace(['.', '-'], "_")
}
