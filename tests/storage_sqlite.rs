//! SQLite storage integration tests.
//!
//! Run with: cargo test --test storage_sqlite
//!
//! Uses in-memory database by default, no external dependencies required.

use chrono::{DateTime, Duration, TimeZone, Utc};

use geotracker::config::{StorageConfig, UserEntry};
use geotracker::geo::Point;
use geotracker::interfaces::{AddRecordRequest, DistanceQuery, HistoryRepository};
use geotracker::storage::{connect, init_storage, SqliteHistoryRepository, IN_MEMORY};
use geotracker::DomainError;

async fn repository() -> SqliteHistoryRepository {
    let pool = connect(IN_MEMORY)
        .await
        .expect("Failed to connect to SQLite");
    let repo = SqliteHistoryRepository::new(pool);
    repo.init().await.expect("Failed to create schema");
    repo
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// Point `meters` north of `origin` along its meridian.
fn north_of(origin: Point, meters: f64) -> Point {
    let degrees = (meters / geotracker::geo::EARTH_RADIUS_METERS).to_degrees();
    Point::new(origin.longitude, origin.latitude + degrees)
}

fn all_time(user_id: i32) -> DistanceQuery {
    DistanceQuery {
        user_id,
        from: None,
        to: None,
    }
}

#[tokio::test]
async fn test_latitude_out_of_range_is_invalid_argument() {
    let repo = repository().await;
    let req = AddRecordRequest::new(1, Point::new(0.0, 181.0), Point::new(0.0, 0.0), t0());

    let err = repo.add_record(req).await.unwrap_err();

    assert!(matches!(err, DomainError::InvalidArgument(_)), "{err}");
    assert_eq!(repo.get_distance(all_time(1)).await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_distance_sums_segments() {
    let repo = repository().await;
    let start = Point::new(37.6, 55.7);
    let mid = north_of(start, 100.0);
    let end = north_of(mid, 250.0);

    repo.add_record(AddRecordRequest::new(1, start, mid, t0()))
        .await
        .unwrap();
    repo.add_record(AddRecordRequest::new(
        1,
        mid,
        end,
        t0() + Duration::minutes(1),
    ))
    .await
    .unwrap();

    let distance = repo.get_distance(all_time(1)).await.unwrap();

    assert!((distance - 350.0).abs() < 3.5, "{distance}");
}

#[tokio::test]
async fn test_no_records_is_zero() {
    let repo = repository().await;
    assert_eq!(repo.get_distance(all_time(42)).await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_window_bounds_are_inclusive() {
    let repo = repository().await;
    let origin = Point::new(0.0, 0.0);
    let segment = north_of(origin, 100.0);

    for minutes in [0, 10, 20] {
        repo.add_record(AddRecordRequest::new(
            1,
            origin,
            segment,
            t0() + Duration::minutes(minutes),
        ))
        .await
        .unwrap();
    }

    let window = |from: Option<i64>, to: Option<i64>| DistanceQuery {
        user_id: 1,
        from: from.map(|m| t0() + Duration::minutes(m)),
        to: to.map(|m| t0() + Duration::minutes(m)),
    };
    let segments = |d: f64| (d / 100.0).round() as i64;

    // Both bounds land exactly on stored timestamps.
    let d = repo.get_distance(window(Some(0), Some(20))).await.unwrap();
    assert_eq!(segments(d), 3);

    let d = repo.get_distance(window(Some(10), Some(10))).await.unwrap();
    assert_eq!(segments(d), 1);

    // One-sided windows.
    let d = repo.get_distance(window(Some(10), None)).await.unwrap();
    assert_eq!(segments(d), 2);

    let d = repo.get_distance(window(None, Some(10))).await.unwrap();
    assert_eq!(segments(d), 2);

    let d = repo.get_distance(window(Some(21), None)).await.unwrap();
    assert_eq!(d, 0.0);
}

#[tokio::test]
async fn test_sub_second_timestamps_compare_correctly() {
    let repo = repository().await;
    let origin = Point::new(0.0, 0.0);
    let at = t0() + Duration::microseconds(500);

    repo.add_record(AddRecordRequest::new(1, origin, north_of(origin, 100.0), at))
        .await
        .unwrap();

    let before = DistanceQuery {
        user_id: 1,
        from: None,
        to: Some(at - Duration::microseconds(1)),
    };
    let exact = DistanceQuery {
        user_id: 1,
        from: Some(at),
        to: Some(at),
    };

    assert_eq!(repo.get_distance(before).await.unwrap(), 0.0);
    assert!(repo.get_distance(exact).await.unwrap() > 0.0);
}

#[tokio::test]
async fn test_init_storage_seeds_users() {
    let config = StorageConfig {
        path: IN_MEMORY.to_string(),
    };
    let users = vec![UserEntry {
        id: 9,
        username: "walker".to_string(),
    }];

    let (_repository, directory) = init_storage(&config, &users).await.unwrap();

    assert_eq!(directory.resolve("walker").await.unwrap(), Some(9));
}

#[tokio::test]
async fn test_file_backed_storage_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("history.db");
    let config = StorageConfig {
        path: path.to_string_lossy().into_owned(),
    };
    let origin = Point::new(0.0, 0.0);

    {
        let (repository, _) = init_storage(&config, &[]).await.unwrap();
        repository
            .add_record(AddRecordRequest::new(7, origin, north_of(origin, 100.0), t0()))
            .await
            .unwrap();
    }

    let (repository, _) = init_storage(&config, &[]).await.unwrap();
    let d = repository.get_distance(all_time(7)).await.unwrap();
    assert!((d - 100.0).abs() < 1.0, "{d}");
}
