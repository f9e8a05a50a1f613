/// Smoke-test for `BrowserRecordSource`.
///
/// Launches a headless Chromium, loads the live schedule for tomorrow
/// (Wyk → Dagebüll) and prints every parsed connection.
///
/// Run with:
///   cargo run --example browser_smoke --features browser
use ferry_client::BrowserRecordSource;
use ferry_core::QueryService;
use ferry_core::models::QueryConstraints;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let source = BrowserRecordSource::new().await?;
    let service = QueryService::new(source);

    let date = (chrono::Local::now().date_naive() + chrono::Days::new(1))
        .format("%Y-%m-%d")
        .to_string();
    let constraints = QueryConstraints {
        departure: "DEWYK".into(),
        arrival: "DEDAG".into(),
        dates: vec![date.clone()],
        ..QueryConstraints::default()
    };

    println!("Querying {date} …");
    let connections = service.query(&constraints).await?;

    for c in &connections {
        println!(
            "{} {} → {}  available={} only_persons={}",
            c.date, c.departure_time, c.arrival_time, c.available, c.only_persons
        );
    }
    println!("OK — {} connections", connections.len());
    Ok(())
}
