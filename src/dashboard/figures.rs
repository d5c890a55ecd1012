use serde_json::{json, Value};

use crate::dashboard::records::{GammaRecord, SampleRecord};

/// Plug properties selectable on the cross-plot axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Kinf,
    Porosity,
    Gdensity,
    Depth,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Kinf, Axis::Porosity, Axis::Gdensity, Axis::Depth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Kinf => "Kinf",
            Axis::Porosity => "Porosity",
            Axis::Gdensity => "Gdensity",
            Axis::Depth => "Depth",
        }
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        Axis::ALL.iter().copied().find(|a| a.as_str() == name)
    }

    pub fn value(&self, s: &SampleRecord) -> f64 {
        match self {
            Axis::Kinf => s.kinf,
            Axis::Porosity => s.porosity,
            Axis::Gdensity => s.gdensity,
            Axis::Depth => s.depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisType {
    Linear,
    Log,
}

impl AxisType {
    pub fn from_name(name: &str) -> Option<AxisType> {
        match name {
            "Linear" => Some(AxisType::Linear),
            "Log" => Some(AxisType::Log),
            _ => None,
        }
    }

    fn plotly(&self) -> &'static str {
        match self {
            AxisType::Linear => "linear",
            AxisType::Log => "log",
        }
    }
}

/// Scatter of one plug property against another, one marker per sample.
///
/// Each marker carries its sample number in `customdata` so a box or lasso
/// selection can be mapped back to samples.
pub fn cross_plot(
    samples: &[SampleRecord],
    x: Axis,
    y: Axis,
    x_type: AxisType,
    y_type: AxisType,
) -> Value {
    let hover: Vec<String> = samples.iter().map(|s| {
        format!(
            "Sample Number: {}<br>Kinf: {:?}<br>Porosity: {:?}<br>Grain Density: {:?}<br>Depth: {:?}",
            s.sample_number, s.kinf, s.porosity, s.gdensity, s.depth
        )
    }).collect();

    json!({
        "data": [{
            "x": samples.iter().map(|s| x.value(s)).collect::<Vec<_>>(),
            "y": samples.iter().map(|s| y.value(s)).collect::<Vec<_>>(),
            "customdata": samples.iter().map(|s| s.sample_number).collect::<Vec<_>>(),
            "text": hover,
            "hovertemplate": "%{text}<extra></extra>",
            "mode": "markers",
            "type": "scatter",
            "marker": { "size": 15, "opacity": 0.5 },
        }],
        "layout": {
            "xaxis": { "title": x.as_str(), "type": x_type.plotly() },
            "yaxis": { "title": y.as_str(), "type": y_type.plotly() },
            "margin": { "l": 40, "b": 40, "t": 10, "r": 0 },
            "hovermode": "closest",
        }
    })
}

/// Core gamma against depth, with the plug permeabilities overlaid on a
/// second x axis. `selected` are indices into `samples` to highlight.
pub fn well_log(samples: &[SampleRecord], gamma: &[GammaRecord], selected: &[usize]) -> Value {
    let bg_color = "white";
    let tick_font_size = 8;
    let line_width = 1.0;

    json!({
        "data": [
            {
                "x": gamma.iter().map(|g| g.gamma).collect::<Vec<_>>(),
                "y": gamma.iter().map(|g| g.depth).collect::<Vec<_>>(),
                "xaxis": "x",
                "yaxis": "y",
                "name": "CoreGamma",
                "type": "scatter",
                "mode": "lines",
                "line": { "width": line_width, "dash": "dashdot" },
                "showlegend": false,
                "hoverinfo": "skip",
            },
            {
                "x": samples.iter().map(|s| s.kinf).collect::<Vec<_>>(),
                "y": samples.iter().map(|s| s.depth).collect::<Vec<_>>(),
                "xaxis": "x2",
                "yaxis": "y",
                "selectedpoints": selected,
                "name": "PERM-plug",
                "type": "scatter",
                "mode": "markers",
                "hovertemplate": "Depth: %{y:.2f}m<br>PERM: %{x:.3e}md<br><extra></extra>",
                "marker": { "size": 8, "line": { "width": 0.5, "color": "white" } },
                "unselected": {
                    "marker": { "opacity": 0.2 },
                    "textfont": { "color": "rgba(0, 0, 0, 0)" },
                },
                "showlegend": false,
            }
        ],
        "layout": {
            "height": 500,
            "width": 300,
            "xaxis": { "title": "Gamma", "type": "log", "side": "bottom" },
            "xaxis2": { "title": "Kinf", "side": "top", "overlaying": "x" },
            "yaxis": { "title": "Depth<br>[m]", "autorange": "reversed" },
            "plot_bgcolor": bg_color,
            "paper_bgcolor": bg_color,
            "hovermode": "closest",
            "legend": { "font": { "size": tick_font_size } },
            "margin": { "l": 20, "r": 20, "t": 10, "b": 40 },
        }
    })
}
