//! Probability bar chart, rendered as a standalone SVG.
//!
//! One horizontal bar per class, top-down in the classifier's label order,
//! on a log-scaled x axis. The most probable class is drawn red, the rest
//! orange, and every bar carries its probability in `1.23e-04` notation.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::classifier::argmax;

const WIDTH: f64 = 800.0;
const ROW_HEIGHT: f64 = 40.0;
const PAD_L: f64 = 130.0;
const PAD_R: f64 = 24.0;
const PAD_T: f64 = 14.0;
const PAD_B: f64 = 36.0;
/// Lowest decade shown; smaller probabilities are clamped onto it.
const MIN_DECADE: i32 = -12;

/// Renders the chart for index-aligned `labels` and `probs`.
pub fn probability_chart_svg(labels: &[String], probs: &[f64]) -> String {
    let n = probs.len().max(1);
    let h = PAD_T + PAD_B + ROW_HEIGHT * n as f64;
    let plot_w = WIDTH - PAD_L - PAD_R;

    let (lo, hi) = decade_range(probs);
    let span = (hi - lo) as f64;
    let px = |p: f64| -> f64 {
        let floor = 10f64.powi(lo);
        let v = if p.is_finite() && p > floor { p.log10() } else { lo as f64 };
        PAD_L + (v - lo as f64) / span * plot_w
    };

    let grid_color = "rgba(0,0,0,0.15)";
    let text_color = "#333";

    // Decade grid lines and tick labels.
    let grid: String = (lo..=hi).map(|k| {
        let x = px(10f64.powi(k));
        format!(
            "<line x1=\"{x:.1}\" y1=\"{t:.1}\" x2=\"{x:.1}\" y2=\"{b:.1}\" stroke=\"{grid}\" stroke-width=\"1\"/>\n\
             <text x=\"{x:.1}\" y=\"{ty:.1}\" text-anchor=\"middle\" fill=\"{text}\" font-size=\"11\">10<tspan dy=\"-5\" font-size=\"8\">{k}</tspan></text>",
            x = x, t = PAD_T, b = h - PAD_B, ty = h - PAD_B + 18.0,
            grid = grid_color, text = text_color, k = k,
        )
    }).collect::<Vec<_>>().join("\n");

    let best = argmax(probs);
    let min_prob = probs.iter().cloned().fold(f64::INFINITY, f64::min);
    let annotate_x = px(min_prob) + 4.0;

    let bars: String = probs.iter().enumerate().map(|(i, &p)| {
        let y_mid = PAD_T + ROW_HEIGHT * (i as f64 + 0.5);
        let bar_h = ROW_HEIGHT * 0.8;
        let color = if i == best { "red" } else { "orange" };
        let label = labels.get(i).map(String::as_str).unwrap_or("");
        format!(
            "<rect x=\"{x0:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{bh:.1}\" fill=\"{color}\"/>\n\
             <text x=\"{lx:.1}\" y=\"{ty:.1}\" text-anchor=\"end\" fill=\"{text}\" font-size=\"12\">{label}</text>\n\
             <text x=\"{ax:.1}\" y=\"{ty:.1}\" fill=\"{text}\" font-size=\"11\">{value}</text>",
            x0 = PAD_L, y = y_mid - bar_h / 2.0, w = (px(p) - PAD_L).max(0.0), bh = bar_h,
            color = color, lx = PAD_L - 6.0, ty = y_mid + 4.0, text = text_color,
            label = xml_escape(label), ax = annotate_x, value = format_sci(p),
        )
    }).collect::<Vec<_>>().join("\n");

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n\
         <rect x=\"{pl}\" y=\"{pt}\" width=\"{pw}\" height=\"{ph}\" fill=\"white\"/>\n\
         {grid}\n{bars}\n\
         </svg>",
        w = WIDTH, h = h, pl = PAD_L, pt = PAD_T, pw = plot_w, ph = h - PAD_T - PAD_B,
        grid = grid, bars = bars,
    )
}

/// Wraps an SVG document as a base64 `data:` URI usable in `<img src=..>`.
pub fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// Formats like Python's `"{:0.2e}"`: two decimals, signed two-digit exponent.
pub fn format_sci(p: f64) -> String {
    if !p.is_finite() {
        return if p.is_nan() { "nan".into() } else if p > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let s = format!("{:.2e}", p);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => s,
    }
}

/// Whole decades covering the positive probabilities, at least one wide.
fn decade_range(probs: &[f64]) -> (i32, i32) {
    let positive = probs.iter().cloned().filter(|p| p.is_finite() && *p > 0.0);
    let min = positive.clone().fold(f64::INFINITY, f64::min);
    let max = positive.fold(0.0f64, f64::max);
    if max <= 0.0 {
        return (-1, 0);
    }
    let hi = max.log10().ceil() as i32;
    let lo = (min.log10().floor() as i32).max(MIN_DECADE);
    if lo >= hi { (hi - 1, hi) } else { (lo, hi) }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}
