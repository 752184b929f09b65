//! Interactive attack map view.
//!
//! Owns every store for the session and drives the tick loop: drain input,
//! drain the feed, expire lines, assemble the scene, rasterize to braille,
//! present. All state lives on this thread; the feed socket is non-blocking
//! so a slow upstream can never stall a frame.

use crate::attack::counts::{CountryCounts, ThreatBand};
use crate::attack::feed::Feed;
use crate::attack::lines::LineStore;
use crate::attack::Severity;
use crate::colors::{self, Palette};
use crate::config::{FeedConfig, MapConfig};
use crate::geo::boundaries::BoundaryStore;
use crate::geo::projection::Projection;
use crate::geo::viewport::{ViewTransform, Viewport};
use crate::help::render_help_overlay;
use crate::terminal::Terminal;
use super::canvas::BrailleCanvas;
use super::scene::{Scene, SceneBuilder};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseButton,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::style::Color;
use std::io;
use std::time::Instant;

const HELP_TEXT: &str = "\
ATTACK MAP
─────────────────
Drag   Pan the map
Wheel  Zoom at cursor
+/-    Zoom in/out
0      Reset view
Space  Pause feed
t      Toggle palette
r      Reload boundaries
?      Close help
q/Esc  Quit
─────────────────";

// Cell tags, draw priority low to high: country bands, then arc
// severities, then endpoint markers.
const TAG_BAND_BASE: u8 = 1;
const TAG_ARC_BASE: u8 = 8;
const TAG_MARKER: u8 = 12;

pub fn run(config: &MapConfig, feed_config: &FeedConfig) -> io::Result<()> {
    let mut term = Terminal::new(true)?;
    let _mouse_guard = MouseCaptureGuard::enable()?;

    let mut boundaries = BoundaryStore::load(config.boundaries_url.as_deref());
    let mut feed = Feed::new(feed_config, config.geoip_db.as_deref());
    let mut counts = CountryCounts::new();
    let mut lines = LineStore::new();
    let mut viewport = Viewport::new();
    let mut builder = SceneBuilder::new();

    let (mut prev_w, mut prev_h) = term.size();
    let mut canvas = BrailleCanvas::new(prev_w as usize, map_rows(prev_h));
    let mut projection = {
        let (dw, dh) = canvas.dot_size();
        let mut p = Projection::new(dw as f64, dh as f64);
        p.fit_to(boundaries.features(), dw as f64, dh as f64);
        p
    };

    let mut palette = if config.light { Palette::Light } else { Palette::Dark };
    let mut show_help = false;
    let mut paused = false;
    let mut status_note: Option<String> = None;
    let tick = config.time_step.max(0.02);

    'frame: loop {
        if let Ok((w, h)) = crossterm::terminal::size() {
            if w != prev_w || h != prev_h {
                term.resize(w, h);
                canvas.resize(w as usize, map_rows(h));
                let (dw, dh) = canvas.dot_size();
                projection.fit_to(boundaries.features(), dw as f64, dh as f64);
                builder.invalidate();
                term.clear_screen()?;
                prev_w = w;
                prev_h = h;
            }
        }

        while let Some(event) = term.check_event()? {
            match event {
                Event::Key(key) => {
                    let code = normalize_key(key.code, key.modifiers);
                    if palette.handle_key(code) {
                        builder.invalidate();
                        continue;
                    }
                    match code {
                        KeyCode::Char('q') | KeyCode::Esc => break 'frame,
                        KeyCode::Char('?') => show_help = !show_help,
                        KeyCode::Char(' ') => paused = !paused,
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            viewport.zoom_step(1, canvas_center(&canvas));
                        }
                        KeyCode::Char('-') => {
                            viewport.zoom_step(-1, canvas_center(&canvas));
                        }
                        KeyCode::Char('0') => viewport.reset(),
                        KeyCode::Char('r') => {
                            if let Some(url) = config.boundaries_url.as_deref() {
                                boundaries.reload(url);
                                let (dw, dh) = canvas.dot_size();
                                projection.fit_to(boundaries.features(), dw as f64, dh as f64);
                                builder.invalidate();
                                status_note = Some(match boundaries.fallback_reason() {
                                    Some(reason) => format!("reload failed: {reason}"),
                                    None => "boundaries reloaded".into(),
                                });
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    // Cell coordinates to braille dot coordinates.
                    let px = mouse.column as f64 * 2.0;
                    let py = mouse.row as f64 * 4.0;
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => viewport.press(px, py),
                        MouseEventKind::Drag(MouseButton::Left) => viewport.drag_to(px, py),
                        MouseEventKind::Up(MouseButton::Left) => viewport.release(),
                        MouseEventKind::ScrollUp => viewport.wheel(1, (px, py)),
                        MouseEventKind::ScrollDown => viewport.wheel(-1, (px, py)),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        let now = Instant::now();
        if !paused {
            for event in feed.poll() {
                counts.record(&event);
                lines.add(&event, now);
            }
        }
        lines.expire(now);
        if let Some(note) = feed.take_note() {
            status_note = Some(note);
        }

        let scene = builder.build(
            &boundaries,
            &counts,
            &lines,
            &projection,
            viewport.transform(),
            palette,
        );
        canvas.clear();
        rasterize(&mut canvas, &scene);

        term.clear();
        for (cx, cy, ch, tag) in canvas.cells() {
            let (color, bold) = tag_style(tag, palette);
            term.set(cx as i32, cy as i32, ch, Some(color), bold);
        }
        drop(scene);

        draw_status(
            &mut term,
            palette,
            &boundaries,
            &counts,
            &lines,
            &feed,
            &viewport,
            paused,
            status_note.as_deref(),
        );

        if show_help {
            let (w, h) = term.size();
            render_help_overlay(&mut term, w, h, HELP_TEXT);
        }

        term.present()?;
        term.sleep(tick);
    }

    // Teardown drops every line and pending expiry in one step.
    lines.clear();
    Ok(())
}

/// Rows available to the canvas; the last row is the status line.
fn map_rows(height: u16) -> usize {
    height.saturating_sub(1).max(1) as usize
}

fn canvas_center(canvas: &BrailleCanvas) -> (f64, f64) {
    let (dw, dh) = canvas.dot_size();
    (dw as f64 / 2.0, dh as f64 / 2.0)
}

fn rasterize(canvas: &mut BrailleCanvas, scene: &Scene<'_>) {
    let t = scene.transform;

    for country in scene.countries {
        let tag = band_tag(country.band);
        for ring in &country.rings {
            polyline(canvas, ring, t, tag);
            if country.band != ThreatBand::None {
                stipple_fill(canvas, ring, t, tag);
            }
        }
    }

    for arc in &scene.arcs {
        let tag = arc_tag(arc.severity);
        polyline(canvas, &arc.points, t, tag);
        for &(mx, my) in &arc.markers {
            let (sx, sy) = t.apply(mx, my);
            canvas.blot(sx.round() as i32, sy.round() as i32, 1, TAG_MARKER);
        }
    }
}

fn polyline(canvas: &mut BrailleCanvas, points: &[(f64, f64)], t: ViewTransform, tag: u8) {
    if points.len() == 1 {
        let (sx, sy) = t.apply(points[0].0, points[0].1);
        canvas.set_dot(sx.round() as i32, sy.round() as i32, tag);
        return;
    }
    for pair in points.windows(2) {
        let (x0, y0) = t.apply(pair[0].0, pair[0].1);
        let (x1, y1) = t.apply(pair[1].0, pair[1].1);
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            continue;
        }
        canvas.line(
            x0.round() as i32,
            y0.round() as i32,
            x1.round() as i32,
            y1.round() as i32,
            tag,
        );
    }
}

/// Sparse interior fill so a hot country reads as a colored area, not just
/// an outline. Every third dot keeps the cost low at world zoom.
fn stipple_fill(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], t: ViewTransform, tag: u8) {
    if ring.len() < 3 {
        return;
    }
    let pts: Vec<(f64, f64)> = ring.iter().map(|&(x, y)| t.apply(x, y)).collect();
    if pts.iter().any(|p| !p.0.is_finite() || !p.1.is_finite()) {
        return;
    }

    let (dw, dh) = canvas.dot_size();
    let min_x = pts.iter().map(|p| p.0).fold(f64::INFINITY, f64::min).max(0.0) as i32;
    let max_x = (pts.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) as i32).min(dw as i32 - 1);
    let min_y = pts.iter().map(|p| p.1).fold(f64::INFINITY, f64::min).max(0.0) as i32;
    let max_y = (pts.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) as i32).min(dh as i32 - 1);

    let mut y = min_y;
    while y <= max_y {
        let mut x = min_x;
        while x <= max_x {
            if point_in_ring(&pts, x as f64 + 0.5, y as f64 + 0.5) {
                canvas.set_dot(x, y, tag);
            }
            x += 3;
        }
        y += 3;
    }
}

/// Even-odd crossing test in dot space.
fn point_in_ring(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn band_tag(band: ThreatBand) -> u8 {
    TAG_BAND_BASE
        + match band {
            ThreatBand::None => 0,
            ThreatBand::Minimal => 1,
            ThreatBand::Low => 2,
            ThreatBand::Moderate => 3,
            ThreatBand::High => 4,
            ThreatBand::Severe => 5,
        }
}

/// Severe arcs win cell contention over routine ones.
fn arc_tag(severity: Severity) -> u8 {
    TAG_ARC_BASE
        + match severity {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
}

/// Resolve a cell tag back to its drawing style.
fn tag_style(tag: u8, palette: Palette) -> (Color, bool) {
    match tag {
        t if t == TAG_MARKER => (colors::marker_color(palette), false),
        t if t >= TAG_ARC_BASE => {
            let severity = match t - TAG_ARC_BASE {
                0 => Severity::Low,
                1 => Severity::Medium,
                2 => Severity::High,
                _ => Severity::Critical,
            };
            colors::severity_color(palette, severity)
        }
        t if t >= TAG_BAND_BASE => {
            let band = match t - TAG_BAND_BASE {
                0 => ThreatBand::None,
                1 => ThreatBand::Minimal,
                2 => ThreatBand::Low,
                3 => ThreatBand::Moderate,
                4 => ThreatBand::High,
                _ => ThreatBand::Severe,
            };
            (colors::band_color(palette, band), false)
        }
        _ => (colors::status_color(palette), false),
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_status(
    term: &mut Terminal,
    palette: Palette,
    boundaries: &BoundaryStore,
    counts: &CountryCounts,
    lines: &LineStore,
    feed: &Feed,
    viewport: &Viewport,
    paused: bool,
    note: Option<&str>,
) {
    let (width, height) = term.size();
    if height == 0 {
        return;
    }
    let y = (height - 1) as i32;

    let feed_label = if feed.is_simulated() { "sim" } else { "live" };
    let dropped = lines.rejected() + feed.malformed() + counts.unattributed();
    let top: Vec<String> = counts
        .top(3)
        .into_iter()
        .map(|(code, n)| format!("{code}:{n}"))
        .collect();

    let mut status = format!(
        " {feed_label} | map {} | ev {} | live {} | drop {} | zoom {:.1}",
        boundaries.source(),
        counts.total(),
        lines.len(),
        dropped,
        viewport.transform().scale,
    );
    if !top.is_empty() {
        status.push_str(&format!(" | top {}", top.join(" ")));
    }
    if let Some(worst) = lines.active().map(|l| l.severity).max() {
        status.push_str(&format!(" | max {}", worst.label()));
    }
    if paused {
        status.push_str(" | PAUSED");
    }
    if let Some(reason) = boundaries.fallback_reason() {
        status.push_str(&format!(" | {reason}"));
    } else if let Some(note) = note {
        status.push_str(&format!(" | {note}"));
    }
    status.push_str(" | ? help");

    let truncated: String = status.chars().take(width as usize).collect();
    term.set_str(0, y, &truncated, Some(colors::status_color(palette)), false);
}

struct MouseCaptureGuard;

impl MouseCaptureGuard {
    fn enable() -> io::Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for MouseCaptureGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture);
    }
}

fn normalize_key(code: KeyCode, mods: KeyModifiers) -> KeyCode {
    if code == KeyCode::Char('/') && mods.contains(KeyModifiers::SHIFT) {
        KeyCode::Char('?')
    } else {
        code
    }
}
