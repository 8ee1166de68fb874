//! Self-contained Leaflet documents.
//!
//! Markers and the legend travel as one JSON object embedded in the page;
//! popup and legend strings are HTML-escaped before they are embedded.

use crate::utils::error::Result;
use serde::Serialize;

const LEAFLET_VERSION: &str = "1.9.4";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.legend { background: white; border: 2px solid grey; padding: 8px 12px; font-size: 14px; line-height: 1.6; }
.legend .swatch { display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 6px; border: 2px solid transparent; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const config = __CONFIG__;
const map = L.map('map').setView(config.center, config.zoom);
L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}).addTo(map);
for (const m of config.markers) {
  L.circleMarker([m.lat, m.lon], {
    radius: m.radius,
    color: m.stroke,
    weight: 2,
    fill: true,
    fillColor: m.fill,
    fillOpacity: m.fill_opacity
  }).bindPopup(m.popup, { maxWidth: 300 }).addTo(map);
}
const legend = L.control({ position: config.legend_position });
legend.onAdd = function () {
  const div = L.DomUtil.create('div', 'legend');
  div.innerHTML = config.legend_html;
  return div;
};
legend.addTo(map);
</script>
</body>
</html>
"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub fill: String,
    pub stroke: String,
    pub fill_opacity: f64,
    /// HTML; callers build it with [`popup`].
    pub popup: String,
}

impl Marker {
    pub fn circle(position: (f64, f64), color: &str, radius: f64, popup: String) -> Self {
        Self {
            lat: position.0,
            lon: position.1,
            radius,
            fill: color.to_string(),
            stroke: color.to_string(),
            fill_opacity: 0.7,
            popup,
        }
    }

    pub fn with_stroke(mut self, stroke: &str) -> Self {
        self.stroke = stroke.to_string();
        self
    }

    pub fn with_opacity(mut self, fill_opacity: f64) -> Self {
        self.fill_opacity = fill_opacity;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
    /// Drawn as a ring instead of a filled dot.
    pub outline: bool,
}

#[derive(Debug, Clone, Serialize)]
struct PageConfig<'a> {
    center: [f64; 2],
    zoom: u8,
    markers: &'a [Marker],
    legend_html: String,
    legend_position: &'a str,
}

#[derive(Debug, Clone)]
pub struct LeafletMap {
    title: String,
    center: (f64, f64),
    zoom: u8,
    markers: Vec<Marker>,
    legend_title: String,
    legend: Vec<LegendEntry>,
    legend_position: &'static str,
}

impl LeafletMap {
    pub fn new(title: impl Into<String>, center: (f64, f64), zoom: u8) -> Self {
        Self {
            title: title.into(),
            center,
            zoom,
            markers: Vec::new(),
            legend_title: String::new(),
            legend: Vec::new(),
            legend_position: "topright",
        }
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn legend_title(mut self, title: impl Into<String>) -> Self {
        self.legend_title = title.into();
        self
    }

    pub fn legend_at_left(mut self) -> Self {
        self.legend_position = "topleft";
        self
    }

    pub fn add_legend(&mut self, color: &str, label: impl Into<String>) {
        self.legend.push(LegendEntry {
            color: color.to_string(),
            label: label.into(),
            outline: false,
        });
    }

    pub fn add_legend_outline(&mut self, color: &str, label: impl Into<String>) {
        self.legend.push(LegendEntry {
            color: color.to_string(),
            label: label.into(),
            outline: true,
        });
    }

    fn legend_html(&self) -> String {
        let mut html = format!("<b>{}</b><br>", escape_html(&self.legend_title));
        for entry in &self.legend {
            let style = if entry.outline {
                format!("border-color:{}", escape_html(&entry.color))
            } else {
                format!("background:{}", escape_html(&entry.color))
            };
            html.push_str(&format!(
                "<span class=\"swatch\" style=\"{}\"></span>{}<br>",
                style,
                escape_html(&entry.label)
            ));
        }
        html
    }

    pub fn to_html(&self) -> Result<String> {
        let config = PageConfig {
            center: [self.center.0, self.center.1],
            zoom: self.zoom,
            markers: &self.markers,
            legend_html: self.legend_html(),
            legend_position: self.legend_position,
        };
        let json = script_safe_json(&config)?;

        Ok(TEMPLATE
            .replace("__TITLE__", &escape_html(&self.title))
            .replace("__LEAFLET__", LEAFLET_VERSION)
            .replace("__CONFIG__", &json))
    }
}

/// JSON that cannot close the surrounding `<script>` element.
fn script_safe_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Popup body: a bold heading followed by `label: value` lines, all escaped.
pub fn popup(heading: &str, lines: &[(&str, String)]) -> String {
    let mut html = format!("<b>{}</b>", escape_html(heading));
    for (label, value) in lines {
        html.push_str(&format!("<br>{}: {}", escape_html(label), escape_html(value)));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"A" & 'B'</b>"#),
            "&lt;b&gt;&quot;A&quot; &amp; &#39;B&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("수성구"), "수성구");
    }

    #[test]
    fn test_popup_escapes_values() {
        let html = popup("충전기 <1>", &[("주소", "대구 & 경북".to_string())]);
        assert_eq!(html, "<b>충전기 &lt;1&gt;</b><br>주소: 대구 &amp; 경북");
    }

    #[test]
    fn test_document_embeds_markers_and_cannot_break_script() {
        let mut map = LeafletMap::new("테스트 지도", (35.87, 128.60), 12).legend_title("범례");
        map.add_marker(Marker::circle(
            (35.88, 128.61),
            "red",
            10.0,
            "</script><script>alert(1)</script>".to_string(),
        ));
        map.add_legend("red", "충전기");

        let html = map.to_html().unwrap();
        assert!(html.contains("<title>테스트 지도</title>"));
        assert!(html.contains("leaflet@1.9.4"));
        assert!(html.contains("\"lat\":35.88"));
        assert!(html.contains("<\\/script>"));
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains("{s}.tile.openstreetmap.org"));
    }
}
