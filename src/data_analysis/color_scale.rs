// src/data_analysis/color_scale.rs

// Outlier-robust color limits for 2D plots. A few hot pixels should not wash
// out the rest of a map, so limits follow the interquartile range.

use plotters::style::RGBColor;

use crate::config::PlotSettings;
use crate::error::Result;
use crate::plot_framework::{parse_hex_color, Colorbar, ColorbarExtend};

/// Percentile with linear interpolation between closest ranks, ignoring NaN.
/// `None` when no finite value remains.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Color limits `(vmin, vmax)` from the interquartile range.
///
/// Limits are `q1 - 1.5 IQR` and `q3 + 1.5 IQR`, bounded by the data, and
/// never clip more than `cutoff_percentile = (top, bottom)` percent of it.
pub fn auto_range_iqr(values: &[f64], cutoff_percentile: (f64, f64)) -> Option<(f64, f64)> {
    let (top, bottom) = cutoff_percentile;
    let zmin = percentile(values, 0.0)?;
    let zmax = percentile(values, 100.0)?;
    let zrange = zmax - zmin;
    let pmin = percentile(values, bottom)?;
    let q3 = percentile(values, 75.0)?;
    let q1 = percentile(values, 25.0)?;
    let pmax = percentile(values, 100.0 - top)?;
    let iqr = q3 - q1;

    // all-equal data, or an IQR that is numerically zero on the data's scale
    if zrange == 0.0 || iqr / zrange < 1e-8 {
        return Some((zmin, zmax));
    }
    let vmin = (q1 - 1.5 * iqr).max(zmin).min(pmin);
    let vmax = (q3 + 1.5 * iqr).min(zmax).max(pmax);
    Some((vmin, vmax))
}

/// Sets the colorbar limits and marks which ends of the data exceed them.
pub fn apply_color_scale_limits(
    colorbar: &mut Colorbar,
    limits: (f64, f64),
    values: &[f64],
    color_over: RGBColor,
    color_under: RGBColor,
) {
    let (vmin, vmax) = if limits.0 <= limits.1 {
        limits
    } else {
        (limits.1, limits.0)
    };
    let data_min = percentile(values, 0.0).unwrap_or(vmin);
    let data_max = percentile(values, 100.0).unwrap_or(vmax);

    colorbar.extend = match (data_min < vmin, data_max > vmax) {
        (true, true) => ColorbarExtend::Both,
        (true, false) => ColorbarExtend::Min,
        (false, true) => ColorbarExtend::Max,
        (false, false) => ColorbarExtend::Neither,
    };
    colorbar.color_over = Some(color_over);
    colorbar.color_under = Some(color_under);
    colorbar.vmin = vmin;
    colorbar.vmax = vmax;
}

pub fn apply_auto_color_scale(
    colorbar: &mut Colorbar,
    values: &[f64],
    cutoff_percentile: (f64, f64),
    color_over: RGBColor,
    color_under: RGBColor,
) {
    match auto_range_iqr(values, cutoff_percentile) {
        Some(limits) => {
            log::debug!("Auto color scale limits: {:?}", limits);
            apply_color_scale_limits(colorbar, limits, values, color_over, color_under);
        }
        None => log::debug!("Auto color scale skipped: no finite values"),
    }
}

/// Applies the automatic color scale when the call (`enabled`) or, failing
/// that, the settings ask for it. Missing cutoff and colors come from the
/// settings as well.
pub fn auto_color_scale_from_settings(
    colorbar: Option<&mut Colorbar>,
    enabled: Option<bool>,
    values: &[f64],
    cutoff_percentile: Option<(f64, f64)>,
    settings: &PlotSettings,
) -> Result<()> {
    let Some(colorbar) = colorbar else {
        return Ok(());
    };
    let auto = &settings.auto_color_scale;
    if !enabled.unwrap_or(auto.enabled) {
        return Ok(());
    }
    let cutoff = cutoff_percentile.unwrap_or(auto.cutoff_percentile);
    let color_over = parse_hex_color(&auto.color_over)?;
    let color_under = parse_hex_color(&auto.color_under)?;
    apply_auto_color_scale(colorbar, values, cutoff, color_over, color_under);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot_framework::Colormap;

    fn colorbar() -> Colorbar {
        Colorbar::new(Colormap::by_name("viridis").unwrap(), 0.0, 1.0)
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, f64::NAN, 3.0, 2.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(4.0));
        assert_eq!(percentile(&values, 50.0), Some(2.5));
        assert_eq!(percentile(&values, 25.0), Some(1.75));
        assert_eq!(percentile(&[f64::NAN], 50.0), None);
    }

    #[test]
    fn test_outlier_is_clipped() {
        let mut values: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        values.push(1000.0);
        let (vmin, vmax) = auto_range_iqr(&values, (50.0, 50.0)).unwrap();
        assert_eq!(vmin, 0.0);
        assert!(vmax < 2.0, "vmax = {vmax}");
    }

    #[test]
    fn test_cutoff_limits_clipping() {
        let mut values: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        values.push(1000.0);
        // clipping at most 0% from the top keeps the outlier inside
        let (_, vmax) = auto_range_iqr(&values, (0.0, 0.0)).unwrap();
        assert_eq!(vmax, 1000.0);
    }

    #[test]
    fn test_constant_data() {
        assert_eq!(auto_range_iqr(&[2.0, 2.0, 2.0], (50.0, 50.0)), Some((2.0, 2.0)));
    }

    #[test]
    fn test_extend_markers() {
        let mut cb = colorbar();
        let values = [0.0, 5.0, 10.0];
        apply_color_scale_limits(&mut cb, (8.0, 2.0), &values, RGBColor(1, 1, 1), RGBColor(2, 2, 2));
        assert_eq!((cb.vmin, cb.vmax), (2.0, 8.0));
        assert_eq!(cb.extend, ColorbarExtend::Both);
        assert_eq!(cb.color_for(9.0), Some(RGBColor(1, 1, 1)));

        apply_color_scale_limits(&mut cb, (0.0, 8.0), &values, RGBColor(1, 1, 1), RGBColor(2, 2, 2));
        assert_eq!(cb.extend, ColorbarExtend::Max);
    }

    #[test]
    fn test_settings_gate() {
        let settings = PlotSettings::default();
        let mut cb = colorbar();
        let values = [0.0, 1.0, 2.0, 3.0, 100.0];
        auto_color_scale_from_settings(Some(&mut cb), None, &values, None, &settings).unwrap();
        assert_eq!((cb.vmin, cb.vmax), (0.0, 1.0));

        auto_color_scale_from_settings(Some(&mut cb), Some(true), &values, None, &settings).unwrap();
        assert!(cb.vmax < 100.0);
        assert_eq!(cb.extend, ColorbarExtend::Max);

        assert!(auto_color_scale_from_settings(None, Some(true), &values, None, &settings).is_ok());
    }
}

// src/data_analysis/color_scale.rs
