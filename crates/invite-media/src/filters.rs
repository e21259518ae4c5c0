//! FFmpeg filter and lavfi source builders.

/// Color used when a template color cannot be parsed.
pub const FALLBACK_COLOR: &str = "#667eea";

/// Parse `#rrggbb` or `#rgb` (leading `#` optional).
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            let expand = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

/// Template color as an ffmpeg `0xRRGGBB` literal, with fallback.
pub fn ffmpeg_color(color: &str) -> String {
    let (r, g, b) = parse_hex_color(color).unwrap_or((0x66, 0x7e, 0xea));
    format!("0x{:02x}{:02x}{:02x}", r, g, b)
}

/// Escape a value for use inside a single-quoted filter option.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Flat color source.
pub fn color_source(color: &str, width: u32, height: u32, fps: u32, duration: f64) -> String {
    format!(
        "color=c={}:s={}x{}:r={}:d={:.3}",
        ffmpeg_color(color),
        width,
        height,
        fps,
        duration
    )
}

/// Diagonal gradient source. One color degrades to a flat color; at most
/// eight stops are used.
pub fn gradient_source(colors: &[String], width: u32, height: u32, fps: u32, duration: f64) -> String {
    match colors {
        [] => color_source(FALLBACK_COLOR, width, height, fps, duration),
        [only] => color_source(only, width, height, fps, duration),
        stops => {
            let stops = &stops[..stops.len().min(8)];
            let mut graph = format!("gradients=s={}x{}", width, height);
            for (i, color) in stops.iter().enumerate() {
                graph.push_str(&format!(":c{}={}", i, ffmpeg_color(color)));
            }
            graph.push_str(&format!(
                ":n={}:x0=0:y0=0:x1={}:y1={}:r={}:d={:.3}",
                stops.len(),
                width,
                height,
                fps,
                duration
            ));
            graph
        }
    }
}

/// Scale-to-cover then crop to exactly `width`x`height`.
pub fn cover_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        w = width,
        h = height
    )
}

/// Fade-in from black at the start, fade-out ending at `total_duration`.
///
/// Fades longer than half the video are shortened so they never overlap.
pub fn fade_filter(fade_in: f64, fade_out: f64, total_duration: f64) -> Option<String> {
    let half = (total_duration / 2.0).max(0.0);
    let fade_in = fade_in.clamp(0.0, half);
    let fade_out = fade_out.clamp(0.0, half);

    let mut parts = Vec::new();
    if fade_in > 0.0 {
        parts.push(format!("fade=t=in:st=0:d={:.3}", fade_in));
    }
    if fade_out > 0.0 {
        parts.push(format!(
            "fade=t=out:st={:.3}:d={:.3}",
            total_duration - fade_out,
            fade_out
        ));
    }

    (!parts.is_empty()).then(|| parts.join(","))
}
