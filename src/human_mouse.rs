use enigo::MouseControllable;
use rand::Rng;
use std::time::Duration;

/// Moves the cursor from `start` to `end` along a randomised cubic Bézier
/// arc, spreading the steps over roughly `duration`.
pub fn move_mouse_human(enigo: &mut enigo::Enigo, start: (i32, i32), end: (i32, i32), duration: Duration) {
    let mut rng = rand::thread_rng();
    let path = bezier_path(start, end, control_points(&mut rng, start, end), step_count(start, end));
    let pause = duration / path.len().max(1) as u32;
    for (x, y) in path {
        enigo.mouse_move_to(x, y);
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }
}

fn distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    ((b.0 - a.0) as f64).hypot((b.1 - a.1) as f64)
}

// More steps = smoother but slower movement
fn step_count(start: (i32, i32), end: (i32, i32)) -> usize {
    ((distance(start, end) / 2.0) as usize).clamp(10, 50)
}

// Control points a third and two thirds along the line, nudged sideways so
// the path bends a little. Short hops bend less.
fn control_points<R: Rng + ?Sized>(rng: &mut R, start: (i32, i32), end: (i32, i32)) -> [(f64, f64); 2] {
    let wobble = (distance(start, end) / 4.0).min(20.0);
    let (dx, dy) = ((end.0 - start.0) as f64, (end.1 - start.1) as f64);
    let mut nudge = |k: f64| {
        let jx = if wobble > 0.0 { rng.gen_range(-wobble..=wobble) } else { 0.0 };
        let jy = if wobble > 0.0 { rng.gen_range(-wobble..=wobble) } else { 0.0 };
        (start.0 as f64 + dx * k + jx, start.1 as f64 + dy * k + jy)
    };
    [nudge(1.0 / 3.0), nudge(2.0 / 3.0)]
}

fn bezier_path(start: (i32, i32), end: (i32, i32), [c1, c2]: [(f64, f64); 2], steps: usize) -> Vec<(i32, i32)> {
    let (sx, sy) = (start.0 as f64, start.1 as f64);
    let (ex, ey) = (end.0 as f64, end.1 as f64);
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let u = 1.0 - t;
            // Cubic Bézier curve formula
            let x = u.powi(3) * sx + 3.0 * u.powi(2) * t * c1.0 + 3.0 * u * t.powi(2) * c2.0 + t.powi(3) * ex;
            let y = u.powi(3) * sy + 3.0 * u.powi(2) * t * c1.1 + 3.0 * u * t.powi(2) * c2.1 + t.powi(3) * ey;
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}
