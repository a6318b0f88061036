mod common;

use std::time::Duration;

use dip_chart::{
    DipApiClient, HistoryProvider, ProviderError,
    models::{
        range::{RangeSelection, Timespan},
        request_params::ChartRequest,
    },
};

const CHART_BODY: &str = r#"{
    "symbol": "AAPL",
    "timespan": "minute",
    "bars": [
        {"t": 1000, "o": 1, "h": 2, "l": 0.5, "c": 50, "v": 10},
        {"t": 2000, "o": 1, "h": 2, "l": 0.5, "c": "51", "v": 10},
        {"t": 3000, "o": 1, "h": 2, "l": 0.5, "c": null, "v": 10}
    ]
}"#;

#[tokio::test]
async fn intraday_range_hits_intraday_endpoint() {
    let stub = common::spawn_http(|_, _| (200, CHART_BODY.to_string())).await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    let series = client
        .fetch_bars(ChartRequest::new("aapl", RangeSelection::Intraday))
        .await
        .unwrap();

    assert_eq!(series.symbol, "AAPL");
    assert_eq!(series.timespan, Timespan::Minute);
    let closes: Vec<f64> = series.bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![50.0, 51.0]);

    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec!["GET /chart/intraday/AAPL?lookback_minutes=390".to_string()]
    );
}

#[tokio::test]
async fn aggregate_ranges_hit_daily_endpoint() {
    let stub = common::spawn_http(|_, _| (200, r#"{"bars": []}"#.to_string())).await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    let week = client
        .fetch_bars(ChartRequest::new("msft", RangeSelection::Week))
        .await
        .unwrap();
    assert_eq!(week.symbol, "MSFT");
    assert_eq!(week.timespan, Timespan::Hour);
    assert!(week.bars.is_empty());

    let dip = ChartRequest::new("msft", RangeSelection::DipWindow).with_dip_window(90);
    client.fetch_bars(dip).await.unwrap();

    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            "GET /chart/daily/MSFT?lookback_days=7&timespan=hour&multiplier=1".to_string(),
            "GET /chart/daily/MSFT?lookback_days=90&timespan=day&multiplier=1".to_string(),
        ]
    );
}

#[tokio::test]
async fn direct_chart_endpoints() {
    let stub = common::spawn_http(|_, _| (200, CHART_BODY.to_string())).await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    let intraday = client.intraday_chart(" nvda", None).await.unwrap();
    assert_eq!(intraday.timespan, Timespan::Minute);
    assert_eq!(intraday.bars.len(), 2);

    let daily = client
        .daily_chart("nvda", 30, Timespan::Day, 1)
        .await
        .unwrap();
    assert_eq!(daily.timespan, Timespan::Day);

    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            "GET /chart/intraday/NVDA".to_string(),
            "GET /chart/daily/NVDA?lookback_days=30&timespan=day&multiplier=1".to_string(),
        ]
    );
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let stub = common::spawn_http(|_, _| (503, r#"{"detail": "down"}"#.to_string())).await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    let err = client.ticker("AAPL").await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 503 }));
    assert_eq!(err.to_string(), "Request failed (503)");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let stub = common::spawn_http(|_, _| (200, "<html>".to_string())).await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    let err = client
        .fetch_bars(ChartRequest::new("AAPL", RangeSelection::Month))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_backend_times_out() {
    let base = common::spawn_silent().await;
    let client = DipApiClient::new(&base)
        .unwrap()
        .with_timeouts(Duration::from_millis(100), Duration::from_millis(100));

    let started = std::time::Instant::now();
    let err = client.current_dips(10).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout { .. }), "got {err:?}");
    assert_eq!(err.to_string(), "Request timed out");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn dips_and_ticker_endpoints() {
    let stub = common::spawn_http(|_, target| {
        let body = if target.starts_with("/dips/current") {
            r#"{"asof": "2024-05-01", "windows": [5], "items": [{"symbol": "NVDA", "dip": -6.2}]}"#
        } else if target.starts_with("/dips") {
            r#"[{"symbol": "AMD", "date": "2024-05-01", "rule": "drop_5d", "value": -5.5}]"#
        } else {
            r#"{"symbol": "AAPL", "name": "Apple Inc.", "recent_signals": null}"#
        };
        (200, body.to_string())
    })
    .await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    let current = client.current_dips(25).await.unwrap();
    assert_eq!(current.items[0].symbol, "NVDA");
    assert_eq!(current.items[0].dip, Some(-6.2));

    let rows = client.dips("drop_5d", 5).await.unwrap();
    assert_eq!(rows[0].value, Some(-5.5));

    let detail = client.ticker("aapl").await.unwrap();
    assert_eq!(detail.display_name(), Some("Apple Inc."));
    assert!(detail.recent_signals.is_empty());

    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            "GET /dips/current?limit=25".to_string(),
            "GET /dips?rule=drop_5d&limit=5".to_string(),
            "GET /tickers/AAPL".to_string(),
        ]
    );
}

#[tokio::test]
async fn refresh_posts_with_days() {
    let stub = common::spawn_http(|method, _| {
        let status = if method == "POST" { 200 } else { 405 };
        (status, r#"{"status": "ok"}"#.to_string())
    })
    .await;
    let client = DipApiClient::new(&stub.base_url).unwrap();

    client.refresh(30).await.unwrap();
    assert_eq!(
        stub.requests.lock().unwrap().clone(),
        vec!["POST /refresh?days=30".to_string()]
    );
}
