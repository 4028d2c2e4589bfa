//! Tracked-only capture: only an explicitly registered value is persisted
//!
//! Runs an iterative loop that grows one `State` value. With
//! `min_object_size` negative the policy admits nothing by size or module,
//! so the snapshots contain exactly the tracked value. Line probes are
//! rate-limited; the explicit snapshot every 100 iterations always fires.
//!
//! ```sh
//! cargo run --example tracked_only
//! recuerdo snapshots/<file>.snap
//! ```

use std::time::Duration;

use serde::Serialize;

use recuerdo::{capture_type, CaptureConfig, CaptureEngine};

#[derive(Serialize, Default)]
struct State {
    x: Vec<i64>,
}

capture_type!(State, kind = Sequence, size = |s: &State| {
    std::mem::size_of::<State>() + s.x.capacity() * 8
});

fn main() -> recuerdo::Result<()> {
    let config = CaptureConfig::new(file!())
        .with_min_object_size(-1)
        .with_frequency_ms(500)
        .with_verbosity(1)
        .with_output_directory("./snapshots");
    let engine = CaptureEngine::new(config);
    let _guard = engine.install()?;

    let mut state = State::default();
    engine.track(&state);

    for i in 0..1_000u64 {
        state.x.push((i * 31 % 997) as i64);
        if i % 100 == 0 {
            recuerdo::snapshot!(&format!("iter{i}"), locals: [state]);
        }
        recuerdo::observe!(locals: [state]);
        std::thread::sleep(Duration::from_millis(5));
    }

    Ok(())
}
