//! Box-and-whisker plots rendered as standalone SVG documents.
//!
//! # Layout
//!
//! One box per implementation, left to right in order of first appearance:
//!
//! ```text
//!        ┬  <- highest value within Q3 + 1.5 IQR
//!        │
//!      ┌─┴─┐ <- Q3
//!      │───│ <- median
//!      └─┬─┘ <- Q1
//!        │
//!        ┴  <- lowest value within Q1 - 1.5 IQR
//!        o  <- outlier
//! ```
//!
//! Quartiles use the same linear interpolation as the descriptive summaries.

use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

use perfstat_stats::descriptive::DescriptiveStats;

use crate::comparison::MetricGroups;

pub const PLOT_WIDTH: f64 = 1200.0;
pub const PLOT_HEIGHT: f64 = 600.0;

/// Whisker reach, in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;

const PALETTE: [&str; 10] = [
    "#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860", "#da8bc3", "#8c8c8c",
    "#ccb974", "#64b5cd",
];

/// Five-number summary of one box, with the points beyond the whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotStats {
    pub label: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxplotStats {
    /// Computes box statistics for `values`.
    ///
    /// # Returns
    ///
    /// * `Some(BoxplotStats)` - if `values` holds at least one number
    /// * `None` - otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use perfstat_analysis::plot::BoxplotStats;
    ///
    /// let stats = BoxplotStats::new("a", &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.whisker_high, 4.0);
    /// assert_eq!(stats.outliers, vec![100.0]);
    /// ```
    #[must_use]
    pub fn new(label: &str, values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let stats = DescriptiveStats::from_sorted(&sorted)?;
        let reach = WHISKER_IQR * stats.iqr();
        let (low_fence, high_fence) = (stats.q1 - reach, stats.q3 + reach);

        let (whisker_low, whisker_high) = sorted
            .iter()
            .copied()
            .filter(|v| (low_fence..=high_fence).contains(v))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect();

        Some(Self {
            label: label.to_owned(),
            q1: stats.q1,
            median: stats.median,
            q3: stats.q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    fn extent(&self) -> (f64, f64) {
        self.outliers
            .iter()
            .fold((self.whisker_low, self.whisker_high), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    }
}

/// File name of the boxplot for `metric` at `endpoint`.
///
/// Characters outside `[A-Za-z0-9._-]` are replaced by `_`.
///
/// # Examples
///
/// ```
/// use perfstat_analysis::plot::boxplot_file_name;
///
/// assert_eq!(
///     boxplot_file_name("req_dur_avg_ms", "GET /attributes/{id}"),
///     "boxplot_req_dur_avg_ms_GET__attributes__id_.svg"
/// );
/// ```
#[must_use]
pub fn boxplot_file_name(metric: &str, endpoint: &str) -> String {
    format!("boxplot_{}_{}.svg", sanitize(metric), sanitize(endpoint))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Plot title, with the metric name in title case.
///
/// # Examples
///
/// ```
/// use perfstat_analysis::plot::boxplot_title;
///
/// assert_eq!(
///     boxplot_title("req_dur_p_90_ms", "list"),
///     "Req Dur P 90 Ms by Implementation for list"
/// );
/// ```
#[must_use]
pub fn boxplot_title(metric: &str, endpoint: &str) -> String {
    let mut title = String::with_capacity(metric.len());
    let mut in_word = false;
    for c in metric.chars().map(|c| if c == '_' { ' ' } else { c }) {
        if c.is_alphabetic() {
            if in_word {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            title.push(c);
            in_word = false;
        }
    }
    format!("{title} by Implementation for {endpoint}")
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Evenly spaced axis ticks with a 1, 2 or 5 mantissa covering `[min, max]`.
///
/// At most nine ticks are returned; an empty or non-finite range has none.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn nice_ticks(min: f64, max: f64) -> Vec<f64> {
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return vec![];
    }
    let raw_step = span / 8.0;
    let exponent = raw_step.log10().floor();
    let magnitude = 10_f64.powf(exponent);
    let mantissa = match raw_step / magnitude {
        r if r <= 1.0 => 1.0,
        r if r <= 2.0 => 2.0,
        r if r <= 5.0 => 5.0,
        _ => 10.0,
    };
    // divide by an exact power of ten so that 0.6 prints as 0.6
    let tick = |k: f64| {
        if exponent < 0.0 {
            k * mantissa / 10_f64.powf(-exponent)
        } else {
            k * mantissa * magnitude
        }
    };
    let step = mantissa * magnitude;
    let first = (min / step).ceil();
    let count = (span / step).floor() as usize + 1;
    let mut ticks = (0..count)
        .map(|i| tick(first + i as f64))
        .take_while(|t| *t <= max)
        .collect::<Vec<_>>();
    ticks.dedup();
    ticks
}

/// Renders `boxes` as an SVG document.
///
/// # Arguments
///
/// * `title` - Title drawn above the plot
/// * `y_label` - Label of the value axis
/// * `boxes` - One entry per implementation, drawn left to right
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn render_boxplot_svg(title: &str, y_label: &str, boxes: &[BoxplotStats]) -> String {
    let plot_width = PLOT_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = PLOT_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let bottom = MARGIN_TOP + plot_height;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {PLOT_WIDTH} {PLOT_HEIGHT}" width="{PLOT_WIDTH}" height="{PLOT_HEIGHT}">"##
    );
    let _ = writeln!(
        svg,
        r##"  <rect width="{PLOT_WIDTH}" height="{PLOT_HEIGHT}" fill="#ffffff"/>"##
    );
    let _ = writeln!(
        svg,
        r##"  <text x="{:.1}" y="35" font-family="sans-serif" font-size="18" fill="#262626" text-anchor="middle">{}</text>"##,
        PLOT_WIDTH / 2.0,
        escape_xml(title)
    );

    let (lo, hi) = boxes
        .iter()
        .map(BoxplotStats::extent)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (l, h)| {
            (lo.min(l), hi.max(h))
        });
    if boxes.is_empty() {
        let _ = writeln!(
            svg,
            r##"  <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="14" fill="#8c8c8c" text-anchor="middle">no data</text>"##,
            PLOT_WIDTH / 2.0,
            PLOT_HEIGHT / 2.0
        );
        svg.push_str("</svg>\n");
        return svg;
    }

    // a span within rounding noise of the values is drawn like a constant
    let scale = lo.abs().max(hi.abs()).max(1.0);
    let pad = if hi - lo > scale * 1e-9 {
        (hi - lo) * 0.05
    } else {
        scale * 0.05
    };
    let (y_min, y_max) = (lo - pad, hi + pad);
    let y = |v: f64| MARGIN_TOP + (y_max - v) / (y_max - y_min) * plot_height;

    for tick in nice_ticks(y_min, y_max) {
        let ty = y(tick);
        let _ = writeln!(
            svg,
            r##"  <line x1="{MARGIN_LEFT}" y1="{ty:.2}" x2="{:.1}" y2="{ty:.2}" stroke="#eaeaf2"/>"##,
            PLOT_WIDTH - MARGIN_RIGHT
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{:.1}" y="{:.2}" font-family="sans-serif" font-size="11" fill="#262626" text-anchor="end">{tick}</text>"##,
            MARGIN_LEFT - 8.0,
            ty + 4.0
        );
    }
    let _ = writeln!(
        svg,
        r##"  <rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{plot_width}" height="{plot_height}" fill="none" stroke="#262626"/>"##
    );

    let slot = plot_width / boxes.len() as f64;
    let half_box = slot * 0.4;
    for (i, stats) in boxes.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let cx = MARGIN_LEFT + slot * (i as f64 + 0.5);
        let (left, right) = (cx - half_box, cx + half_box);
        let cap = half_box / 2.0;

        let _ = writeln!(svg, r#"  <g class="box" data-implementation="{}">"#, escape_xml(&stats.label));
        for (from, to) in [(stats.whisker_low, stats.q1), (stats.q3, stats.whisker_high)] {
            let _ = writeln!(
                svg,
                r##"    <line x1="{cx:.2}" y1="{:.2}" x2="{cx:.2}" y2="{:.2}" stroke="#3f3f3f" stroke-width="1.5"/>"##,
                y(from),
                y(to)
            );
        }
        for whisker in [stats.whisker_low, stats.whisker_high] {
            let _ = writeln!(
                svg,
                r##"    <line x1="{:.2}" y1="{wy:.2}" x2="{:.2}" y2="{wy:.2}" stroke="#3f3f3f" stroke-width="1.5"/>"##,
                cx - cap,
                cx + cap,
                wy = y(whisker)
            );
        }
        let _ = writeln!(
            svg,
            r##"    <rect x="{left:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{color}" stroke="#3f3f3f" stroke-width="1.5"/>"##,
            y(stats.q3),
            right - left,
            (y(stats.q1) - y(stats.q3)).max(0.5)
        );
        let _ = writeln!(
            svg,
            r##"    <line x1="{left:.2}" y1="{my:.2}" x2="{right:.2}" y2="{my:.2}" stroke="#3f3f3f" stroke-width="2"/>"##,
            my = y(stats.median)
        );
        for outlier in &stats.outliers {
            let _ = writeln!(
                svg,
                r##"    <circle cx="{cx:.2}" cy="{:.2}" r="3.5" fill="none" stroke="#3f3f3f"/>"##,
                y(*outlier)
            );
        }
        let _ = writeln!(
            svg,
            r##"    <text x="{cx:.2}" y="{:.1}" font-family="sans-serif" font-size="12" fill="#262626" text-anchor="middle">{}</text>"##,
            bottom + 22.0,
            escape_xml(&stats.label)
        );
        svg.push_str("  </g>\n");
    }

    let _ = writeln!(
        svg,
        r##"  <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="13" fill="#262626" text-anchor="middle">implementation</text>"##,
        MARGIN_LEFT + plot_width / 2.0,
        PLOT_HEIGHT - 20.0
    );
    let label_y = MARGIN_TOP + plot_height / 2.0;
    let _ = writeln!(
        svg,
        r##"  <text x="25" y="{label_y:.1}" font-family="sans-serif" font-size="13" fill="#262626" text-anchor="middle" transform="rotate(-90 25 {label_y:.1})">{}</text>"##,
        escape_xml(y_label)
    );
    svg.push_str("</svg>\n");
    svg
}

/// Renders the boxplot of `groups` for `endpoint` into `dir`, replacing any existing file.
///
/// Returns the path written.
pub fn write_boxplot(dir: &Path, endpoint: &str, groups: &MetricGroups<'_>) -> io::Result<PathBuf> {
    let boxes = groups
        .implementations
        .iter()
        .zip(&groups.values)
        .filter_map(|(label, values)| BoxplotStats::new(label, values))
        .collect::<Vec<_>>();
    let svg = render_boxplot_svg(&boxplot_title(groups.metric, endpoint), groups.metric, &boxes);
    let path = dir.join(boxplot_file_name(groups.metric, endpoint));
    fs::write(&path, svg)?;
    tracing::debug!(path = %path.display(), "wrote boxplot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Sample};

    #[test]
    fn test_whiskers_stop_at_fences() {
        let stats = BoxplotStats::new("a", &[-5.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 20.0]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (2.0, 4.0, 6.0));
        // IQR = 4, fences at -4 and 12
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 7.0);
        assert_eq!(stats.outliers, vec![-5.0, 20.0]);
    }

    #[test]
    fn test_constant_values() {
        let stats = BoxplotStats::new("a", &[3.0; 5]).unwrap();
        assert_eq!(stats.whisker_low, 3.0);
        assert_eq!(stats.whisker_high, 3.0);
        assert!(stats.outliers.is_empty());
        assert!(BoxplotStats::new("a", &[]).is_none());
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 10.0), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(0.05, 0.95), vec![0.2, 0.4, 0.6, 0.8]);
        assert_eq!(nice_ticks(95.0, 515.0), vec![100.0, 200.0, 300.0, 400.0, 500.0]);
    }

    #[test]
    fn test_nice_ticks_degenerate_ranges() {
        assert!(nice_ticks(1.0, 1.0).is_empty());
        assert!(nice_ticks(2.0, 1.0).is_empty());
        assert!(nice_ticks(0.0, f64::INFINITY).is_empty());

        // one ulp apart: min / step is far beyond exact integer range
        let lo: f64 = 1e5;
        let hi = f64::from_bits(lo.to_bits() + 1);
        let ticks = nice_ticks(lo, hi);
        assert!(ticks.len() <= 9);
        assert!(ticks.iter().all(|t| (t - lo).abs() < 1e-6));
    }

    #[test]
    fn test_nearly_constant_values_render() {
        let lo: f64 = 1e5;
        let hi = f64::from_bits(lo.to_bits() + 1);
        let dataset = Dataset::from_samples(
            vec!["ms".into()],
            [lo, hi, lo]
                .into_iter()
                .map(|v| Sample {
                    endpoint_name: "list".into(),
                    implementation: "a".into(),
                    values: vec![Some(v)],
                })
                .collect(),
        );
        let endpoints = dataset.endpoints();
        let groups = MetricGroups::collect(&endpoints[0], "ms", 0);

        let dir = tempfile::tempdir().unwrap();
        let path = write_boxplot(dir.path(), "list", &groups).unwrap();
        let svg = fs::read_to_string(path).unwrap();
        assert_eq!(svg.matches("class=\"box\"").count(), 1);
        // padded to 5% of the value, so ticks step by 1000 around 1e5
        assert!(svg.contains(">100000</text>"));
    }

    #[test]
    fn test_svg_document() {
        let boxes = vec![
            BoxplotStats::new("fast & lean", &[1.0, 2.0, 3.0]).unwrap(),
            BoxplotStats::new("slow", &[10.0, 11.0, 30.0]).unwrap(),
        ];
        let svg = render_boxplot_svg("Latency by Implementation for <list>", "latency", &boxes);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("class=\"box\"").count(), 2);
        assert!(svg.contains("fast &amp; lean"));
        assert!(svg.contains("for &lt;list&gt;"));
    }

    #[test]
    fn test_empty_plot() {
        let svg = render_boxplot_svg("t", "y", &[]);
        assert!(svg.contains(">no data</text>"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a/b c.d-e_f"), "a_b_c.d-e_f");
    }
}
