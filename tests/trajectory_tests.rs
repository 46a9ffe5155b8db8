//! Integration tests for trajectory buffer growth and persistence.

use orgmin::trajectory::INITIAL_CAPACITY;
use orgmin::{Error, TrajectoryBuffer};

fn temp_dir() -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut path = std::env::temp_dir();
    path.push(format!(
        "orgmin_trajectory_test_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&path).unwrap();
    path
}

fn filled_buffer(dim: usize, rows: usize) -> TrajectoryBuffer {
    let mut buffer = TrajectoryBuffer::with_dim(dim);
    for i in 0..rows {
        let point: Vec<f64> = (0..dim).map(|j| (i * dim + j) as f64).collect();
        buffer.append((i + 1) as u64, -(i as f64), &point).unwrap();
    }
    buffer
}

fn assert_same_contents(a: &TrajectoryBuffer, b: &TrajectoryBuffer) {
    assert_eq!(a.evaluations(), b.evaluations());
    assert_eq!(a.f_mins(), b.f_mins());
    assert_eq!(a.x_bests(), b.x_bests());
    assert_eq!(a.elapsed(), b.elapsed());
    assert_eq!(a.solution_found, b.solution_found);
}

#[test]
fn parallel_sequences_share_logical_length() {
    let buffer = filled_buffer(3, 7);
    assert_eq!(buffer.len(), 7);
    assert_eq!(buffer.evaluations().len(), 7);
    assert_eq!(buffer.f_mins().len(), 7);
    assert_eq!(buffer.x_bests().len(), 7);
    assert_eq!(buffer.capacity(), INITIAL_CAPACITY);
}

#[test]
fn appending_1025_rows_doubles_capacity_exactly_once() {
    let buffer = filled_buffer(3, INITIAL_CAPACITY + 1);
    assert_eq!(buffer.len(), 1025);
    assert_eq!(buffer.capacity(), 2 * INITIAL_CAPACITY);

    // Contents survived the growth copy.
    assert_eq!(buffer.evaluations()[0], 1);
    assert_eq!(buffer.evaluations()[1024], 1025);
    assert_eq!(buffer.x_bests()[1024], &[3072.0, 3073.0, 3074.0]);
}

#[test]
fn wrong_dimension_is_rejected_without_mutation() {
    let mut buffer = filled_buffer(3, 2);

    let err = buffer.append(3, -3.0, &[1.0, 2.0]).unwrap_err();
    match err {
        Error::DimensionMismatch { expected, got } => {
            assert_eq!(expected, 3);
            assert_eq!(got, 2);
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
    assert_eq!(buffer.len(), 2);

    // A correctly sized point still goes through afterwards.
    buffer.append(3, -3.0, &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(buffer.len(), 3);
}

#[test]
fn roundtrip_at_growth_boundaries() {
    for rows in [0, 1, INITIAL_CAPACITY - 1, INITIAL_CAPACITY, INITIAL_CAPACITY + 1] {
        let dir = temp_dir();
        let buffer = filled_buffer(3, rows);
        buffer.persist(&dir).unwrap();

        let restored = TrajectoryBuffer::restore(&dir).unwrap();
        assert_same_contents(&buffer, &restored);
        assert_eq!(restored.len(), rows);
        // Capacity is exactly the logical length, no padding.
        assert_eq!(restored.capacity(), rows);
        if rows > 0 {
            assert_eq!(restored.dim(), 3);
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}

#[test]
fn restored_buffer_grows_again_on_append() {
    let dir = temp_dir();
    filled_buffer(2, 5).persist(&dir).unwrap();

    let mut restored = TrajectoryBuffer::restore(&dir).unwrap();
    assert_eq!(restored.capacity(), 5);
    restored.append(6, -5.0, &[0.0, 0.0]).unwrap();
    assert_eq!(restored.len(), 6);
    assert_eq!(restored.capacity(), 10);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn elapsed_time_round_trips() {
    let dir = temp_dir();
    let mut buffer = filled_buffer(1, 1);
    buffer.start_timing();
    buffer.stop_timing();
    buffer.solution_found = true;
    let elapsed = buffer.elapsed().unwrap();

    buffer.persist(&dir).unwrap();
    let restored = TrajectoryBuffer::restore(&dir).unwrap();

    let diff = (restored.elapsed().unwrap().as_secs_f64() - elapsed.as_secs_f64()).abs();
    assert!(diff < 1e-9, "elapsed drifted by {diff}");
    assert!(restored.solution_found);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn absent_elapsed_time_round_trips_as_absent() {
    let dir = temp_dir();
    let buffer = filled_buffer(1, 1);
    assert!(buffer.elapsed().is_none());

    buffer.persist(&dir).unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.join("time.txt")).unwrap(),
        "None"
    );

    let restored = TrajectoryBuffer::restore(&dir).unwrap();
    assert!(restored.elapsed().is_none());
    assert!(!restored.solution_found);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn timing_misuse_is_a_no_op() {
    let mut buffer = TrajectoryBuffer::with_dim(1);

    // Stop before start does nothing.
    buffer.stop_timing();
    assert!(buffer.elapsed().is_none());

    buffer.start_timing();
    buffer.start_timing(); // second start keeps the original
    buffer.stop_timing();
    let first = buffer.elapsed().unwrap();
    buffer.stop_timing(); // second stop keeps the first measurement
    assert_eq!(buffer.elapsed(), Some(first));
}

#[test]
fn success_flag_is_written_as_canonical_token() {
    let dir = temp_dir();
    filled_buffer(1, 0).persist(&dir).unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.join("solution_found.txt")).unwrap(),
        "False"
    );
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn non_canonical_success_text_is_corrupt() {
    let dir = temp_dir();
    filled_buffer(1, 1).persist(&dir).unwrap();

    std::fs::write(dir.join("solution_found.txt"), "maybe").unwrap();
    assert!(matches!(
        TrajectoryBuffer::restore(&dir),
        Err(Error::CorruptState(_))
    ));

    // Even a case variation is rejected.
    std::fs::write(dir.join("solution_found.txt"), "true").unwrap();
    assert!(matches!(
        TrajectoryBuffer::restore(&dir),
        Err(Error::CorruptState(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unparsable_elapsed_time_is_corrupt() {
    let dir = temp_dir();
    filled_buffer(1, 1).persist(&dir).unwrap();

    std::fs::write(dir.join("time.txt"), "eleven seconds").unwrap();
    assert!(matches!(
        TrajectoryBuffer::restore(&dir),
        Err(Error::CorruptState(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn out_of_range_elapsed_time_is_corrupt() {
    let dir = temp_dir();
    filled_buffer(1, 1).persist(&dir).unwrap();

    // Finite and parseable, but overflows a Duration.
    for text in ["1e300", "-1.0", "inf", "NaN"] {
        std::fs::write(dir.join("time.txt"), text).unwrap();
        assert!(
            matches!(
                TrajectoryBuffer::restore(&dir),
                Err(Error::CorruptState(_))
            ),
            "expected CorruptState for time '{text}'"
        );
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn disagreeing_artifact_lengths_are_corrupt() {
    let dir = temp_dir();
    filled_buffer(2, 3).persist(&dir).unwrap();

    std::fs::write(dir.join("f_mins.json"), "[1.0,2.0]").unwrap();
    assert!(matches!(
        TrajectoryBuffer::restore(&dir),
        Err(Error::CorruptState(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn ragged_best_point_rows_are_corrupt() {
    let dir = temp_dir();
    filled_buffer(2, 2).persist(&dir).unwrap();

    std::fs::write(dir.join("x_bests.json"), "[[1.0,2.0],[3.0]]").unwrap();
    assert!(matches!(
        TrajectoryBuffer::restore(&dir),
        Err(Error::CorruptState(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_artifact_is_not_found() {
    let dir = temp_dir();
    filled_buffer(2, 2).persist(&dir).unwrap();

    std::fs::remove_file(dir.join("evaluations.json")).unwrap();
    assert!(matches!(
        TrajectoryBuffer::restore(&dir),
        Err(Error::NotFound(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn persist_into_missing_directory_is_not_found() {
    let mut missing = std::env::temp_dir();
    missing.push("orgmin_trajectory_test_does_not_exist");
    assert!(matches!(
        filled_buffer(1, 1).persist(&missing),
        Err(Error::NotFound(_))
    ));
}
