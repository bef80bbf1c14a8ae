//! Headless playback of a small loop course, printing renderer calls to stdout.
//!
//! `cargo run --example playback_demo`

use route_playback::{
    Bounds, CameraPose, ControllerEvent, GpsPoint, ManualScheduler, MapRenderer, MarkFeature,
    PlaybackConfig, PlaybackStore, PopupContent, PopupRenderer, RouteInput, RoutePlayer,
};

struct ConsoleMap {
    frames: usize,
}

impl MapRenderer for ConsoleMap {
    fn set_head_position(&mut self, position: GpsPoint) {
        self.frames += 1;
        if self.frames % 60 == 0 {
            println!("head  {:.5}, {:.5}", position.latitude, position.longitude);
        }
    }

    fn set_camera(&mut self, _pose: &CameraPose) {}

    fn fit_bounds(&mut self, bounds: &Bounds) {
        println!(
            "fit   [{:.4}, {:.4}] x [{:.4}, {:.4}]",
            bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng
        );
    }
}

struct ConsolePopup;

impl PopupRenderer for ConsolePopup {
    fn show_at(&mut self, anchor: GpsPoint, content: &PopupContent) {
        println!("popup {} @ {:.5}, {:.5}", content.title, anchor.latitude, anchor.longitude);
    }

    fn hide(&mut self) {
        println!("popup hidden");
    }
}

struct ConsoleStore;

impl PlaybackStore for ConsoleStore {
    fn set_progress(&mut self, _progress: f64) {}
}

/// A square loop, about 4.4 km, starting and finishing at the same corner.
fn loop_course() -> Vec<GpsPoint> {
    let corners = [(46.0, 7.0), (46.0, 7.01), (46.01, 7.01), (46.01, 7.0), (46.0, 7.0)];
    let mut points = Vec::new();
    for pair in corners.windows(2) {
        let ((lat0, lng0), (lat1, lng1)) = (pair[0], pair[1]);
        for i in 0..20 {
            let t = i as f64 / 20.0;
            points.push(GpsPoint::new(lat0 + t * (lat1 - lat0), lng0 + t * (lng1 - lng0)));
        }
    }
    points.push(GpsPoint::new(46.0, 7.0));
    points
}

fn main() -> route_playback::Result<()> {
    let marks = vec![
        MarkFeature::new(GpsPoint::new(46.0, 7.0), "Start"),
        MarkFeature::new(GpsPoint::new(46.0, 7.01), "KM 1"),
        MarkFeature::new(GpsPoint::new(46.0001, 7.0101), "Water"),
        MarkFeature::new(GpsPoint::new(46.01, 7.005), "Gel"),
        MarkFeature::new(GpsPoint::new(46.0, 7.0), "Finish"),
    ];
    let input = RouteInput::new(loop_course(), 30_000.0).with_marks(marks);

    let mut player = RoutePlayer::setup(
        input,
        PlaybackConfig::default(),
        ManualScheduler::new(),
        ConsoleMap { frames: 0 },
        ConsolePopup,
        ConsoleStore,
    )?;
    println!("{} clusters", player.geofence().clusters().len());

    player.start(0.0);
    let mut now = 0.0;
    loop {
        now += 16.0;
        player.scheduler_mut().advance_to(now);
        let mut finished = false;
        for frame in player.scheduler_mut().take_frames() {
            if player.on_frame(frame, now) == Some(ControllerEvent::Finished) {
                finished = true;
            }
        }
        if finished {
            println!("finished at {:.0}ms", now);
            break;
        }
    }

    Ok(())
}
