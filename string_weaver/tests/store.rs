use std::path::PathBuf;

use string_weaver::{
    store, verboser::Silent, Algorithm, Config, Grid, PathState, Precision, Raster, Shape,
};

fn portrait() -> Raster {
    Raster::from_fn(Grid::new(100, 100), |p| {
        let dx = p.x as f32 - 50.0;
        let dy = p.y as f32 - 40.0;
        if dx * dx + dy * dy < 400.0 {
            20
        } else {
            180
        }
    })
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("string_weaver-{}-{}.bin", name, std::process::id()))
}

fn generate() -> Algorithm<f64> {
    let config = Config {
        nail_count: 48,
        max_lines: 120,
        opacity: 45,
        skip_neighbors: 6,
        shape: Shape::Circle,
    };
    let mut algorithm = Algorithm::new(config, portrait(), &mut Silent).unwrap();
    algorithm.compute_all(&mut Silent);
    algorithm
}

#[test]
fn saved_state_loads_back_identically() {
    let algorithm = generate();
    let state = algorithm.capture("portrait.png");
    let path = temp_file("round-trip");
    state.save(&path).unwrap();
    let loaded = PathState::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, state);
    let restored = loaded.restore(None);
    assert_eq!(restored.edges, algorithm.edges());
    assert_eq!(restored.points, algorithm.points());
    assert_eq!(restored.config.nail_count, 48);
    assert_eq!(restored.config.opacity, 45);
    assert_eq!(restored.config.skip_neighbors, 6);
    assert_eq!(restored.config.shape, Shape::Circle);
    assert_eq!(restored.config.max_lines, algorithm.steps());
}

#[test]
fn replay_matches_the_original_run() {
    let algorithm = generate();
    let state = algorithm.capture("portrait.png");
    let replay = state.replay::<f64>(portrait(), None, None, &mut Silent).unwrap();
    assert_eq!(replay.raster(), algorithm.raster());
    assert_eq!(
        replay.drawing().build_instructions(10),
        algorithm.drawing().build_instructions(10)
    );
}

#[test]
fn partial_replay_matches_a_shorter_run() {
    let algorithm = generate();
    let state = algorithm.capture("portrait.png");
    let replay = state.replay::<f64>(portrait(), Some(30), None, &mut Silent).unwrap();
    assert_eq!(replay.edges(), &algorithm.edges()[..30]);
    assert_eq!(replay.points(), &algorithm.points()[..31]);

    let mut shorter = Algorithm::<f64>::new(
        Config {
            max_lines: 30,
            ..*algorithm.config()
        },
        portrait(),
        &mut Silent,
    )
    .unwrap();
    shorter.compute_all(&mut Silent);
    assert_eq!(replay.raster(), shorter.raster());
}

#[test]
fn opacity_override_changes_only_the_strength() {
    let algorithm = generate();
    let state = algorithm.capture("portrait.png");
    let replay = state
        .replay::<f64>(portrait(), None, Some(255), &mut Silent)
        .unwrap();
    assert_eq!(replay.config().opacity, 255);
    assert_eq!(replay.edges(), algorithm.edges());
    assert!(replay
        .raster()
        .pixels()
        .iter()
        .zip(algorithm.raster().pixels())
        .all(|(strong, weak)| strong >= weak));
}

#[test]
fn replay_keeps_the_precision_of_the_run() {
    let mut algorithm = Algorithm::<f32>::new(
        Config {
            nail_count: 200,
            max_lines: 400,
            ..Config::default()
        },
        Raster::from_fn(Grid::new(500, 500), |p| ((p.x + p.y) * 255 / 1000) as u8),
        &mut Silent,
    )
    .unwrap();
    algorithm.compute_all(&mut Silent);
    let state = algorithm.capture("gradient.png");
    assert_eq!(state.precision, Precision::Single);

    let path = temp_file("precision");
    state.save(&path).unwrap();
    let loaded = PathState::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let prepared = || Raster::from_fn(Grid::new(500, 500), |p| ((p.x + p.y) * 255 / 1000) as u8);
    assert!(matches!(
        loaded.replay::<f64>(prepared(), None, None, &mut Silent),
        Err(string_weaver::Error::Store(store::Error::GeometryMismatch(_)))
    ));
    let replay = loaded
        .replay::<f32>(prepared(), None, None, &mut Silent)
        .unwrap();
    assert_eq!(replay.raster(), algorithm.raster());
}

#[test]
fn loading_garbage_fails() {
    let path = temp_file("garbage");
    std::fs::write(&path, [1u8, 2, 3]).unwrap();
    let result = PathState::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(store::Error::Encoding(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        PathState::load(temp_file("missing")),
        Err(store::Error::Io(_))
    ));
}
