use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use graphrec_api::{
    db::InMemoryRatingStore,
    engine::DatasetPaths,
    routes::{create_router, AppState},
    services::{RecommendationOptions, Strategy},
};

const RATINGS_CSV: &str = "userId,movieId,rating,timestamp
1,1,5.0,964982703
1,2,4.0,964981247
2,2,4.5,964982224
2,3,4.0,964983815
3,1,4.0,964982931
3,2,5.0,964982400
3,3,4.5,964980868
4,4,2.0,964982176
4,5,1.5,964984041
";

const MOVIES_CSV: &str = "movieId,title,genres
1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy
2,Jumanji (1995),Adventure|Children|Fantasy
3,\"Grumpier Old Men, The (1995)\",Comedy|Romance
4,Waiting to Exhale (1995),Comedy|Drama|Romance
5,Father of the Bride Part II (1995),Comedy
";

fn dataset_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ratings.csv"), RATINGS_CSV).unwrap();
    std::fs::write(dir.path().join("movies.csv"), MOVIES_CSV).unwrap();
    dir
}

fn create_test_server(dir: &TempDir, strategy: Strategy) -> TestServer {
    let state = AppState::new(
        Arc::new(InMemoryRatingStore::new()),
        DatasetPaths::from_dir(dir.path()),
    )
    .with_recommendations(RecommendationOptions {
        strategy,
        ..RecommendationOptions::default()
    });
    TestServer::new(create_router(state)).unwrap()
}

async fn rate(server: &TestServer, movie_id: i64, title: &str, rating: i32) {
    server
        .post("/api/v1/ratings")
        .json(&json!({ "movie_id": movie_id, "title": title, "rating": rating }))
        .await
        .assert_status(StatusCode::CREATED);
}

fn movie_ids(movies: &[Value]) -> Vec<i64> {
    movies
        .iter()
        .map(|movie| movie["movie_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    let response = server.get("/health").await;
    let header = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_create_and_list_ratings() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "movie_id": 1, "title": "Toy Story (1995)", "rating": 5 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["movie_id"], 1);
    assert_eq!(created["rating"], 5);

    rate(&server, 2, "Jumanji (1995)", 3).await;

    let response = server.get("/api/v1/ratings").await;
    response.assert_status_ok();
    let ratings: Vec<Value> = response.json();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[0]["movie_id"], 2);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({ "movie_id": 1, "title": "Toy Story (1995)", "rating": 7 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("between 1 and 5"));

    let ratings: Vec<Value> = server.get("/api/v1/ratings").await.json();
    assert!(ratings.is_empty());
}

#[tokio::test]
async fn test_movies_listing_with_stats() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    rate(&server, 2, "Jumanji (1995)", 4).await;
    rate(&server, 2, "Jumanji (1995)", 5).await;

    let response = server.get("/api/v1/movies").add_query_param("limit", 3).await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();

    assert_eq!(movie_ids(&movies), vec![1, 2, 3]);
    assert_eq!(movies[1]["avg"], 4.5);
    assert_eq!(movies[1]["count"], 2);
    assert!(movies[0]["avg"].is_null());
    assert_eq!(movies[2]["title"], "Grumpier Old Men, The (1995)");
}

#[tokio::test]
async fn test_recommendations_without_ratings_are_empty() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    let response = server.get("/api/v1/recommendations").await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_random_walk_recommendations() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    rate(&server, 1, "Toy Story (1995)", 5).await;

    let response = server.get("/api/v1/recommendations").await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();

    assert_eq!(movie_ids(&movies), vec![2, 3]);
    assert_eq!(movies[0]["title"], "Jumanji (1995)");
    assert_eq!(movies[0]["year"], 1995);
    assert!(movies[0]["poster_url"].is_null());
}

#[tokio::test]
async fn test_neighbor_recommendations_are_deduplicated() {
    let dir = dataset_dir();
    let server = create_test_server(&dir, Strategy::Neighbors);

    rate(&server, 1, "Toy Story (1995)", 5).await;
    rate(&server, 3, "Grumpier Old Men, The (1995)", 4).await;
    rate(&server, 4, "Waiting to Exhale (1995)", 2).await;

    let response = server
        .get("/api/v1/recommendations")
        .add_query_param("top_k", 2)
        .await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();

    // Toy Story -> [2, 3], Grumpier Old Men -> [2, 1]; item 4 was never liked
    assert_eq!(movie_ids(&movies), vec![2, 3, 1]);
}

#[tokio::test]
async fn test_recommendations_without_dataset() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    rate(&server, 1, "Toy Story (1995)", 5).await;

    let response = server.get("/api/v1/recommendations").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"], "Data unavailable");
}

#[tokio::test]
async fn test_movies_listing_falls_back_without_dataset() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, Strategy::RandomWalk);

    let movies: Vec<Value> = server.get("/api/v1/movies").await.json();
    assert_eq!(movies.len(), 3);
    assert_eq!(movies[0]["title"], "The Shawshank Redemption");
}
