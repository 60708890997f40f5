use std::fmt::Write as _;

use super::*;

const PALETTE: [&str; 8] = [
    "#add8e6", "#0000ff", "#90ee90", "#008000", "#ffc0cb", "#ff0000", "#a52a2a", "#808080",
];
const SLOT_WIDTH: f64 = 90.0;
const PLOT_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;
const WHISKER_IQR: f64 = 1.5;

/// Box geometry for one group, whiskers at the furthest values within
/// 1.5 IQR of the quartiles.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub summary: Summary,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let summary = Summary::from_values(values)?;
        let low_fence = summary.q1 - WHISKER_IQR * summary.iqr();
        let high_fence = summary.q3 + WHISKER_IQR * summary.iqr();

        let inside = values
            .iter()
            .copied()
            .filter(|value| *value >= low_fence && *value <= high_fence);
        let lower_whisker = inside.clone().fold(summary.q1, f64::min);
        let upper_whisker = inside.fold(summary.q3, f64::max);
        let outliers = values
            .iter()
            .copied()
            .filter(|value| *value < low_fence || *value > high_fence)
            .collect();

        Some(Self {
            summary,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Renders one panel of vertical box plots as a standalone SVG document.
pub fn render_box_plot(title: &str, y_label: &str, groups: &[(&str, &[f64])]) -> String {
    let boxes = groups
        .iter()
        .filter_map(|(label, values)| BoxStats::from_values(values).map(|stats| (*label, stats)))
        .collect::<Vec<(&str, BoxStats)>>();

    let slots = boxes.len().max(1) as f64;
    let width = MARGIN_LEFT + MARGIN_RIGHT + slots * SLOT_WIDTH;
    let height = MARGIN_TOP + PLOT_HEIGHT + MARGIN_BOTTOM;
    let y_max = boxes
        .iter()
        .map(|(_, stats)| stats.summary.max)
        .fold(1.0_f64, f64::max);
    let y_of = |value: f64| MARGIN_TOP + PLOT_HEIGHT * (1.0 - value.clamp(0.0, y_max) / y_max);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" font-family="sans-serif">"#
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{width:.0}" height="{height:.0}" fill="white"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="28" font-size="18" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape_xml(title)
    );

    for step in 0..=5 {
        let value = y_max * step as f64 / 5.0;
        let y = y_of(value);
        let _ = writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
            width - MARGIN_RIGHT
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{value:.1}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{:.1}" font-size="13" text-anchor="middle" transform="rotate(-90 18 {:.1})">{}</text>"#,
        MARGIN_TOP + PLOT_HEIGHT / 2.0,
        MARGIN_TOP + PLOT_HEIGHT / 2.0,
        escape_xml(y_label)
    );

    for (index, (label, stats)) in boxes.iter().enumerate() {
        let center = MARGIN_LEFT + SLOT_WIDTH * (index as f64 + 0.5);
        let half = SLOT_WIDTH * 0.25;
        let color = PALETTE[index % PALETTE.len()];
        let q1 = y_of(stats.summary.q1);
        let q3 = y_of(stats.summary.q3);
        let median = y_of(stats.summary.median);

        let _ = writeln!(
            svg,
            r#"<line x1="{center:.1}" y1="{:.1}" x2="{center:.1}" y2="{q1:.1}" stroke="black"/>"#,
            y_of(stats.lower_whisker)
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{center:.1}" y1="{q3:.1}" x2="{center:.1}" y2="{:.1}" stroke="black"/>"#,
            y_of(stats.upper_whisker)
        );
        for whisker in [stats.lower_whisker, stats.upper_whisker] {
            let y = y_of(whisker);
            let _ = writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="black"/>"#,
                center - half / 2.0,
                center + half / 2.0
            );
        }
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{q3:.1}" width="{:.1}" height="{:.1}" fill="{color}" stroke="black"/>"#,
            center - half,
            half * 2.0,
            (q1 - q3).max(0.5)
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{:.1}" y1="{median:.1}" x2="{:.1}" y2="{median:.1}" stroke="white" stroke-width="2"/>"#,
            center - half,
            center + half
        );
        for outlier in &stats.outliers {
            let _ = writeln!(
                svg,
                r#"<circle cx="{center:.1}" cy="{:.1}" r="3" fill="none" stroke="black"/>"#,
                y_of(*outlier)
            );
        }
        let _ = writeln!(
            svg,
            r#"<text x="{center:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
            MARGIN_TOP + PLOT_HEIGHT + 20.0,
            escape_xml(label)
        );
        let _ = writeln!(
            svg,
            r##"<text x="{center:.1}" y="{:.1}" font-size="10" text-anchor="middle" fill="#555555">n={}</text>"##,
            MARGIN_TOP + PLOT_HEIGHT + 36.0,
            stats.summary.count
        );
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn write_figure(path: &Path, svg: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    fs::write(path, svg).with_context(|| format!("failed to write figure: {}", path.display()))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
