//! Reading normalization and hysteresis classification

use thermo_api::{LevelTable, ThermalStatus};

/// Convert a raw sensor reading to degrees Celsius.
///
/// Sensors report in millidegrees, kelvin or Celsius without saying which,
/// so the unit is guessed from the magnitude: above 1000 is taken as
/// milli-units, and anything still above 223 (about -50 C) as kelvin.
pub fn normalize_temperature(raw: i32) -> i32 {
    let mut temperature = raw;

    if temperature > 1000 {
        temperature /= 1000;
    }
    if temperature > 223 {
        temperature -= 273;
    }

    temperature
}

/// Compute the status following `current` for `temperature`.
///
/// The walk leaves `current` only when the temperature is outside its band,
/// then moves one level at a time, re-testing against each new level's band,
/// until the band holds the temperature or the end of the scale is reached.
/// Bands are used as given; overlapping or unordered bands are not corrected.
pub fn classify(current: ThermalStatus, temperature: i32, levels: &LevelTable) -> ThermalStatus {
    let band = |status: ThermalStatus| &levels[status.index()];
    let mut status = current;

    if temperature < band(status).min {
        while status > ThermalStatus::Normal && temperature < band(status).min {
            status = status.lower();
        }
    } else if temperature > band(status).max {
        while status < ThermalStatus::Fatal && temperature > band(status).max {
            status = status.raise();
        }
    }

    status
}
