use anyhow::{Context, Result};
use clap::Parser;
use dip_chart::{
    ChartSession, DipApiClient, SessionUpdate,
    cli::{
        commands::{Cli, Commands},
        output::{chart_summary, dips_table, live_bar_line, ticker_report},
    },
    config::{ClientConfig, load_config_path},
    models::{
        range::{LabelMode, RangeSelection},
        request_params::ChartRequest,
    },
};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::from_env().context("failed to load configuration")?,
    };
    let client = DipApiClient::from_config(&config).context("failed to build API client")?;

    match cli.command {
        Commands::Chart {
            symbol,
            range,
            dip_window_days,
            watch,
        } => {
            let mut request = ChartRequest::new(&symbol, range);
            if let Some(days) = dip_window_days {
                request = request.with_dip_window(days);
            }
            run_chart(client, config.max_bars, request, watch).await?;
        }
        Commands::Dips { limit } => {
            let dips = client
                .current_dips(limit)
                .await
                .context("failed to load current dips")?;
            print!("{}", dips_table(&dips));
        }
        Commands::Ticker { symbol } => {
            let detail = client
                .ticker(&symbol)
                .await
                .with_context(|| format!("failed to load ticker {symbol}"))?;
            print!("{}", ticker_report(&detail));
        }
        Commands::Refresh { days } => {
            client
                .refresh(days)
                .await
                .context("backend refresh failed")?;
            println!("refresh complete ({days} days)");
        }
    }
    Ok(())
}

async fn run_chart(
    client: DipApiClient,
    max_bars: usize,
    request: ChartRequest,
    watch: bool,
) -> Result<()> {
    let mode = request.range.label_mode();
    let symbol = request.symbol.clone();
    let mut session = ChartSession::with_client(client, max_bars);
    session.select(request.clone());

    loop {
        let update = session
            .next_update()
            .await
            .context("chart session ended unexpectedly")?;
        match update {
            SessionUpdate::HistoryLoaded { .. } => break,
            SessionUpdate::HistoryFailed(message) => {
                anyhow::bail!("failed to load {symbol} {}: {message}", request.range)
            }
            _ => {}
        }
    }
    print!("{}", chart_summary(&symbol, session.store().bars(), mode));

    if !watch {
        return Ok(());
    }
    if !request.range.is_live() {
        eprintln!("live updates are only available for {}", RangeSelection::Intraday);
        return Ok(());
    }

    follow_live(&mut session, mode).await;
    session.close();
    Ok(())
}

async fn follow_live(session: &mut ChartSession, mode: LabelMode) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("stopped: received Ctrl+C");
                return;
            }
            update = session.next_update() => {
                match update {
                    Some(SessionUpdate::FeedOpened) => eprintln!("live feed connected"),
                    Some(SessionUpdate::LiveBars { applied }) if applied > 0 => {
                        if let Some(bar) = session.store().last() {
                            println!("{}", live_bar_line(bar, mode));
                        }
                    }
                    Some(SessionUpdate::FeedClosed(reason)) => {
                        println!("stopped: live feed closed ({reason:?})");
                        return;
                    }
                    None => return,
                    _ => {}
                }
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
