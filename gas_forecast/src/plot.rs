//! Forecast plot rendered to an in-memory SVG document

use crate::data::TimeSeriesData;
use crate::error::{ForecastError, Result};
use crate::models::Forecast;
use crate::utils::{date_from_epoch_days, days_since_epoch};
use chrono::{Datelike, NaiveDate};

const MARGIN: f64 = 50.0;
const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// History points, the forecast line and its uncertainty band
#[derive(Debug, Clone)]
pub struct ForecastPlot {
    title: String,
    width: u32,
    height: u32,
    history: Vec<(NaiveDate, f64)>,
    forecast: Forecast,
}

impl ForecastPlot {
    /// Plot a forecast over the observed history
    pub fn new(history: &TimeSeriesData, forecast: &Forecast) -> Result<Self> {
        if forecast.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot plot an empty forecast".to_string(),
            ));
        }

        let history = history
            .dates()?
            .into_iter()
            .zip(history.values()?)
            .collect();
        Ok(Self {
            title: "Forecast".to_string(),
            width: 1000,
            height: 600,
            history,
            forecast: forecast.clone(),
        })
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(200);
        self.height = height.max(150);
        self
    }

    /// Number of observed points drawn
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forecast being drawn
    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    fn x_range(&self) -> (f64, f64) {
        let days = self
            .history
            .iter()
            .map(|(d, _)| *d)
            .chain(self.forecast.ds.iter().copied())
            .map(|d| days_since_epoch(d) as f64);
        bounds(days)
    }

    fn y_range(&self) -> (f64, f64) {
        let values = self
            .history
            .iter()
            .map(|(_, v)| *v)
            .chain(self.forecast.yhat_lower.iter().copied())
            .chain(self.forecast.yhat_upper.iter().copied())
            .filter(|v| v.is_finite());
        bounds(values)
    }

    /// Render a self-contained SVG document
    pub fn render_svg(&self) -> String {
        let (width, height) = (f64::from(self.width), f64::from(self.height));
        let (x_min, x_max) = self.x_range();
        let (y_min, y_max) = self.y_range();

        let (plot_width, plot_height) = (width - 2.0 * MARGIN, height - 2.0 * MARGIN);
        let x = |date: NaiveDate| {
            MARGIN + (days_since_epoch(date) as f64 - x_min) / (x_max - x_min) * plot_width
        };
        let y = |value: f64| height - MARGIN - (value - y_min) / (y_max - y_min) * plot_height;

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"{}\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            SVG_NAMESPACE,
            w = self.width,
            h = self.height
        ));
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        let title = escape(&self.title);
        svg.push_str(&text(width / 2.0, MARGIN / 2.0, 16, "middle", &title));

        // axes
        svg.push_str(&format!(
            "<line x1=\"{m:.1}\" y1=\"{b:.1}\" x2=\"{r:.1}\" y2=\"{b:.1}\" stroke=\"black\"/>\n\
             <line x1=\"{m:.1}\" y1=\"{m:.1}\" x2=\"{m:.1}\" y2=\"{b:.1}\" stroke=\"black\"/>\n",
            m = MARGIN,
            b = height - MARGIN,
            r = width - MARGIN
        ));
        for (date, label) in year_ticks(x_min, x_max) {
            svg.push_str(&text(x(date), height - MARGIN + 15.0, 10, "middle", &label));
        }
        for value in [y_min, (y_min + y_max) / 2.0, y_max] {
            let label = format!("{:.2}", value);
            svg.push_str(&text(MARGIN - 5.0, y(value), 10, "end", &label));
        }

        // uncertainty band: upper bound forwards, lower bound backwards
        let forecast = &self.forecast;
        let upper = forecast.ds.iter().zip(&forecast.yhat_upper);
        let lower = forecast.ds.iter().zip(&forecast.yhat_lower).rev();
        let band: Vec<String> = upper
            .chain(lower)
            .map(|(d, v)| format!("{:.1},{:.1}", x(*d), y(*v)))
            .collect();
        svg.push_str(&format!(
            "<polygon points=\"{}\" fill=\"#0072B2\" fill-opacity=\"0.2\" stroke=\"none\"/>\n",
            band.join(" ")
        ));

        let line: Vec<String> = forecast
            .ds
            .iter()
            .zip(&forecast.yhat)
            .map(|(d, v)| format!("{:.1},{:.1}", x(*d), y(*v)))
            .collect();
        svg.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"#0072B2\" stroke-width=\"2\"/>\n",
            line.join(" ")
        ));

        for (date, value) in &self.history {
            svg.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"2\" fill=\"black\"/>\n",
                x(*date),
                y(*value)
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Minimum and maximum, widened so the range is never empty
fn bounds<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if max - min < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    (min, max)
}

/// January-first ticks, thinned to at most ten labels
fn year_ticks(x_min: f64, x_max: f64) -> Vec<(NaiveDate, String)> {
    let first = date_from_epoch_days(x_min.ceil() as i32);
    let last = date_from_epoch_days(x_max.floor() as i32);
    let (first, last) = match (first, last) {
        (Ok(first), Ok(last)) => (first, last),
        _ => return Vec::new(),
    };

    let years: Vec<i32> = (first.year()..=last.year()).collect();
    let step = (years.len() / 10).max(1);
    years
        .into_iter()
        .step_by(step)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .filter(|date| *date >= first && *date <= last)
        .map(|date| (date, date.year().to_string()))
        .collect()
}

fn text(x: f64, y: f64, size: u32, anchor: &str, content: &str) -> String {
    format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"{}\" \
         text-anchor=\"{}\">{}</text>\n",
        x, y, size, anchor, content
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
