// src/data_analysis/axis_scaling.rs

// Unit-aware tick rescaling. Values like 0.00000005 on a "V" axis become 50
// on an "nV" axis; units outside the SI set get a power-of-ten factor instead.

use ndarray::ArrayD;
use ndarray_stats::QuantileExt;

use crate::config::PlotSettings;
use crate::data_input::plot_record::{make_axis_label, PlotRecord, RecordData};

/// Engineering prefixes keyed by their power of ten.
pub const ENGINEERING_PREFIXES: [(i32, &str); 17] = [
    (-24, "y"),
    (-21, "z"),
    (-18, "a"),
    (-15, "f"),
    (-12, "p"),
    (-9, "n"),
    (-6, "µ"),
    (-3, "m"),
    (0, ""),
    (3, "k"),
    (6, "M"),
    (9, "G"),
    (12, "T"),
    (15, "P"),
    (18, "E"),
    (21, "Z"),
    (24, "Y"),
];

/// Picks a prefix and power of ten so that `max_abs / 10^scale` stays near unity.
///
/// For rescalable SI units the first prefix whose threshold
/// `10^(scale + 3)` exceeds `max_abs` is chosen (yocto..yotta). Other units
/// get `3 * floor(floor(log10(max_abs)) / 3)` and a `"10^n "` prefix.
pub fn find_scale_and_prefix(max_abs: f64, unit: &str, settings: &PlotSettings) -> (String, i32) {
    if settings.is_rescalable_unit(unit) {
        if !max_abs.is_finite() || max_abs == 0.0 {
            return (String::new(), 0);
        }
        for (scale, prefix) in ENGINEERING_PREFIXES {
            let threshold = 10f64.powi(scale + 3);
            if max_abs < threshold {
                return (prefix.to_string(), scale);
            }
        }
        ("Y".to_string(), 24)
    } else {
        let selected_scale = if max_abs.is_finite() && max_abs > 0.0 {
            3 * (max_abs.log10().floor() / 3.0).floor() as i32
        } else {
            0
        };
        if selected_scale != 0 {
            (format!("10^{selected_scale} "), selected_scale)
        } else {
            (String::new(), 0)
        }
    }
}

/// Formats a tick value the way C's `%g` does: six significant digits,
/// trailing zeros dropped, exponent form outside `1e-4 <= |v| < 1e6`.
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return format!("{value}");
    }

    // Round to the significant digits first, the exponent may change (9.9999995 -> 10)
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = trim_trailing_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        trim_trailing_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_trailing_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Largest absolute value ignoring NaN, 0 for non-numeric or empty data.
pub fn nan_max_abs(data: &RecordData) -> f64 {
    match data {
        RecordData::Numeric(values) => {
            if values.is_empty() {
                return 0.0;
            }
            let abs: ArrayD<f64> = values.mapv(f64::abs);
            let max = *abs.max_skipnan();
            if max.is_nan() {
                0.0
            } else {
                max
            }
        }
        _ => 0.0,
    }
}

/// Tick multiplier and axis label produced by rescaling one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RescaledAxis {
    /// Multiply raw tick values by this before formatting.
    pub factor: f64,
    pub label: String,
}

pub fn make_rescaled_ticks_and_units(record: &PlotRecord, settings: &PlotSettings) -> RescaledAxis {
    let max_abs = nan_max_abs(&record.data);
    let (prefix, scale) = find_scale_and_prefix(max_abs, &record.unit, settings);
    let new_unit = format!("{prefix}{}", record.unit);
    RescaledAxis {
        factor: 10f64.powi(-scale),
        label: make_axis_label(record.display_label(), &new_unit),
    }
}


// src/data_analysis/axis_scaling.rs
