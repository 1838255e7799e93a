use serde::{Serialize, Serializer};

/// Smallest marker radius; zero-magnitude and negative-magnitude events still render.
pub const MIN_RADIUS: f64 = 1.0;

const RADIUS_SCALE: f64 = 5.0;

/// Marker fill colors, declared from shallowest to deepest so the derived
/// ordering is the severity rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorToken {
    Green,
    Lime,
    Amber,
    Orange,
    RedOrange,
    Red,
}

impl ColorToken {
    pub fn css(self) -> &'static str {
        match self {
            ColorToken::Green => "green",
            ColorToken::Lime => "#cafc03",
            ColorToken::Amber => "#fcad03",
            ColorToken::Orange => "#fc8403",
            ColorToken::RedOrange => "#fc4903",
            ColorToken::Red => "red",
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ColorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css())
    }
}

impl Serialize for ColorToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.css())
    }
}

/// Fill color for an event `depth` km below the surface.
///
/// Buckets are strict: a depth of exactly 90 falls in the 70–90 bucket.
pub fn depth_color(depth: f64) -> ColorToken {
    if depth > 90.0 {
        ColorToken::Red
    } else if depth > 70.0 {
        ColorToken::RedOrange
    } else if depth > 50.0 {
        ColorToken::Orange
    } else if depth > 30.0 {
        ColorToken::Amber
    } else if depth > 10.0 {
        ColorToken::Lime
    } else {
        ColorToken::Green
    }
}

/// Circle marker radius in pixels.
pub fn magnitude_radius(magnitude: f64) -> f64 {
    if magnitude <= 0.0 {
        MIN_RADIUS
    } else {
        magnitude * RADIUS_SCALE
    }
}

/// Popup body for one event. `place` is inserted as given; callers holding
/// untrusted text should pass it through [`escape_html`] first.
pub fn feature_popup_text(magnitude: f64, depth_km: f64, place: &str) -> String {
    format!(
        "Magnitude: <b>{}</b><br>Depth: <b>{}</b><br>Location: <b>{}</b>",
        magnitude, depth_km, place
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_color_buckets() {
        assert_eq!(depth_color(120.0), ColorToken::Red);
        assert_eq!(depth_color(80.0), ColorToken::RedOrange);
        assert_eq!(depth_color(60.0), ColorToken::Orange);
        assert_eq!(depth_color(40.0), ColorToken::Amber);
        assert_eq!(depth_color(20.0), ColorToken::Lime);
        assert_eq!(depth_color(5.0), ColorToken::Green);
        assert_eq!(depth_color(-3.5), ColorToken::Green);
    }

    #[test]
    fn test_depth_color_boundaries_fall_in_lower_bucket() {
        assert_eq!(depth_color(90.0).css(), "#fc4903");
        assert_eq!(depth_color(70.0).css(), "#fc8403");
        assert_eq!(depth_color(50.0).css(), "#fcad03");
        assert_eq!(depth_color(30.0).css(), "#cafc03");
        assert_eq!(depth_color(10.0).css(), "green");
    }

    #[test]
    fn test_depth_color_is_monotonic() {
        let depths: Vec<f64> = (-200..=2000).map(|d| d as f64 * 0.25).collect();
        for pair in depths.windows(2) {
            assert!(
                depth_color(pair[0]).rank() <= depth_color(pair[1]).rank(),
                "rank decreased between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_magnitude_radius() {
        assert_eq!(magnitude_radius(0.0), 1.0);
        assert_eq!(magnitude_radius(5.0), 25.0);
        assert_eq!(magnitude_radius(2.5), 12.5);
    }

    #[test]
    fn test_negative_magnitude_gets_minimum_radius() {
        assert_eq!(magnitude_radius(-0.8), MIN_RADIUS);
        assert_eq!(magnitude_radius(-0.0), MIN_RADIUS);
    }

    #[test]
    fn test_popup_text_embeds_values() {
        let text = feature_popup_text(5.2, 10.0, "Tokyo, Japan");
        assert!(text.contains("5.2"));
        assert!(text.contains("10"));
        assert!(text.contains("Tokyo, Japan"));
        assert_eq!(
            text,
            "Magnitude: <b>5.2</b><br>Depth: <b>10</b><br>Location: <b>Tokyo, Japan</b>"
        );
    }

    #[test]
    fn test_popup_text_passes_place_verbatim() {
        let text = feature_popup_text(1.0, 2.0, "<script>");
        assert!(text.contains("<script>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Bob's" & co</b>"#),
            "&lt;b&gt;&quot;Bob&#39;s&quot; &amp; co&lt;/b&gt;"
        );
        assert_eq!(escape_html("10 km SSW of Anza, CA"), "10 km SSW of Anza, CA");
    }

    #[test]
    fn test_color_token_serializes_as_css() {
        let json = serde_json::to_string(&ColorToken::Amber).unwrap();
        assert_eq!(json, "\"#fcad03\"");
    }
}
