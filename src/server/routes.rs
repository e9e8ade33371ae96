//! API routes of the tsbench server

use std::sync::{Arc, Mutex};

use serde::{Serialize, Deserialize};
use warp::{Filter, Rejection, Reply};
use warp::filters::body::json;

use crate::TsBench;
use crate::bench::{BenchConfig, CleanupMode, Report, AggregatedHistory};
use crate::bench::config::parse_batch_sizes;
use crate::core::errors::BenchResult;

/// Overrides accepted by `GET /reports`
#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    /// Number of points per batch size
    pub points: Option<usize>,
    /// Comma-separated batch sizes
    pub batch_sizes: Option<String>,
    /// `drop-database` or `drop-measurement`
    pub cleanup: Option<String>,
}

/// Body of `POST /api/query`
#[derive(Debug, Deserialize)]
struct QueryRequest {
    /// Database to query
    database: String,
    /// Query to run
    query: String,
}

/// Generic API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Error message, if any
    pub error: Option<String>,
    /// Response data
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        ApiResponse { success: true, error: None, data: Some(data) }
    }

    fn err(error: impl ToString) -> Self {
        ApiResponse { success: false, error: Some(error.to_string()), data: None }
    }
}

/// Apply request overrides to the server's base configuration
pub fn apply_overrides(base: &BenchConfig, req: ReportRequest) -> BenchResult<BenchConfig> {
    let mut config = base.clone();

    if let Some(points) = req.points {
        config.points = points;
    }
    if let Some(sizes) = req.batch_sizes {
        config.batch_sizes = parse_batch_sizes(&sizes)?;
    }
    if let Some(cleanup) = req.cleanup {
        config.cleanup = cleanup.parse::<CleanupMode>()?;
    }

    config.validate()?;
    Ok(config)
}

/// Build the API routes
pub fn api_routes(
    tsbench: Arc<Mutex<TsBench>>,
    base: BenchConfig,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    // GET /reports/history
    let history_route = warp::path!("reports" / "history")
        .and(warp::get())
        .and(with_tsbench(tsbench.clone()))
        .and(with_config(base.clone()))
        .and_then(handle_history);

    // GET /reports?points=...&batch_sizes=...
    let report_route = warp::path!("reports")
        .and(warp::get())
        .and(warp::query::<ReportRequest>())
        .and(with_tsbench(tsbench.clone()))
        .and(with_config(base))
        .and_then(handle_report);

    // POST /api/query
    let query_route = warp::path!("api" / "query")
        .and(warp::post())
        .and(json::<QueryRequest>())
        .and(with_tsbench(tsbench))
        .and_then(handle_query);

    history_route.or(report_route).or(query_route)
}

fn with_tsbench(
    tsbench: Arc<Mutex<TsBench>>
) -> impl Filter<Extract = (Arc<Mutex<TsBench>>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || tsbench.clone())
}

fn with_config(
    config: BenchConfig
) -> impl Filter<Extract = (BenchConfig,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || config.clone())
}

/// Run `f` on the blocking pool once the store lock is free
///
/// Runs hold the lock for their whole duration, so waiting for it must
/// not tie up an async worker.
async fn with_store<T, F>(tsbench: Arc<Mutex<TsBench>>, f: F) -> Result<T, String>
where
    F: FnOnce(&mut TsBench) -> Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut bench = tsbench.lock().map_err(|_| "store lock poisoned".to_string())?;
        f(&mut *bench)
    })
    .await
    .map_err(|e| format!("store task failed: {}", e))?
}

fn respond<T>(outcome: Result<T, String>) -> ApiResponse<T> {
    match outcome {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::err(e),
    }
}

/// Handler for GET /reports
async fn handle_report(
    req: ReportRequest,
    tsbench: Arc<Mutex<TsBench>>,
    base: BenchConfig,
) -> Result<impl Reply, Rejection> {
    let config = match apply_overrides(&base, req) {
        Ok(config) => config,
        Err(e) => return Ok(warp::reply::json(&ApiResponse::<Report>::err(e))),
    };

    let outcome = with_store(tsbench, move |bench| {
        bench.run(config).map_err(|e| e.to_string())
    }).await;

    Ok(warp::reply::json(&respond(outcome)))
}

/// Handler for GET /reports/history
async fn handle_history(
    tsbench: Arc<Mutex<TsBench>>,
    base: BenchConfig,
) -> Result<impl Reply, Rejection> {
    let outcome = with_store(tsbench, move |bench| {
        bench.past_averages(&base.report_database).map_err(|e| e.to_string())
    }).await;

    let response: ApiResponse<Option<AggregatedHistory>> = respond(outcome);
    Ok(warp::reply::json(&response))
}

/// Handler for POST /api/query
async fn handle_query(
    req: QueryRequest,
    tsbench: Arc<Mutex<TsBench>>,
) -> Result<impl Reply, Rejection> {
    let outcome = with_store(tsbench, move |bench| {
        bench.query(&req.database, &req.query)
            .map(|records| records.iter().map(|r| r.to_json()).collect::<Vec<_>>())
            .map_err(|e| e.to_string())
    }).await;

    Ok(warp::reply::json(&respond(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        let tsbench = Arc::new(Mutex::new(TsBench::new_in_memory()));
        api_routes(tsbench, BenchConfig::default())
    }

    #[test]
    fn test_apply_overrides() {
        let req = ReportRequest {
            points: Some(50),
            batch_sizes: Some("1,10".to_string()),
            cleanup: Some("drop-measurement".to_string()),
        };

        let config = apply_overrides(&BenchConfig::default(), req).unwrap();
        assert_eq!(config.points, 50);
        assert_eq!(config.batch_sizes, vec![1, 10]);
        assert_eq!(config.cleanup, CleanupMode::DropMeasurement);
        assert_eq!(config.report_database, "reports");
    }

    #[test]
    fn test_apply_overrides_validates() {
        let req = ReportRequest { points: Some(0), ..ReportRequest::default() };
        assert!(apply_overrides(&BenchConfig::default(), req).is_err());

        let req = ReportRequest { cleanup: Some("nope".to_string()), ..ReportRequest::default() };
        assert!(apply_overrides(&BenchConfig::default(), req).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_report_route_runs_benchmark() {
        let filter = routes();

        let res = warp::test::request()
            .method("GET")
            .path("/reports?points=4&batch_sizes=1,2")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 200);

        let body: ApiResponse<Report> = serde_json::from_slice(res.body()).unwrap();
        assert!(body.success);
        let report = body.data.unwrap();
        assert_eq!(report.run.details.batch_sizes, vec![1, 2]);
        assert!(report.past_averages.is_none());

        let res = warp::test::request()
            .method("GET")
            .path("/reports/history")
            .reply(&filter)
            .await;
        let body: ApiResponse<Option<AggregatedHistory>> = serde_json::from_slice(res.body()).unwrap();
        assert!(body.success);
        // A single run is not enough history to average
        assert!(body.data.flatten().is_none());
    }

    #[tokio::test]
    async fn test_history_waits_for_lock_off_the_runtime() {
        let tsbench = Arc::new(Mutex::new(TsBench::new_in_memory()));
        let filter = api_routes(Arc::clone(&tsbench), BenchConfig::default());

        // Stands in for a benchmark holding the store
        let guard = tsbench.lock().unwrap();

        let request = warp::test::request()
            .method("GET")
            .path("/reports/history")
            .reply(&filter);
        let release = async move {
            tokio::task::yield_now().await;
            drop(guard);
        };

        // Only completes if the handler leaves the runtime thread free
        let (res, ()) = tokio::join!(request, release);

        let body: ApiResponse<Option<AggregatedHistory>> = serde_json::from_slice(res.body()).unwrap();
        assert!(body.success);
        assert!(body.data.flatten().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_report_route_rejects_bad_config() {
        let res = warp::test::request()
            .method("GET")
            .path("/reports?points=0")
            .reply(&routes())
            .await;

        let body: ApiResponse<Report> = serde_json::from_slice(res.body()).unwrap();
        assert!(!body.success);
        assert!(body.error.unwrap().contains("points"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_query_route() {
        let filter = routes();
        warp::test::request()
            .path("/reports?points=2&batch_sizes=1")
            .reply(&filter)
            .await;

        let res = warp::test::request()
            .method("POST")
            .path("/api/query")
            .json(&serde_json::json!({
                "database": "reports",
                "query": "SELECT * FROM \"reports\""
            }))
            .reply(&filter)
            .await;

        let body: ApiResponse<Vec<serde_json::Value>> = serde_json::from_slice(res.body()).unwrap();
        assert!(body.success);
        let rows = body.data.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["json_results"].is_string());
    }
}
