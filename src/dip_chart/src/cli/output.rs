//! Plain-text rendering of command results.

use std::fmt::Write as _;

use crate::{
    models::{
        bar::Bar,
        dips::{CurrentDips, TickerDetail},
        range::LabelMode,
    },
    render::{
        ChangeInfo, axis_labels,
        format::{format_percent, format_price, format_signed_points},
        labels::format_label,
    },
};

/// Symbol, bar count, last close, change and axis labels.
pub fn chart_summary(symbol: &str, bars: &[Bar], mode: LabelMode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{symbol}: {} bars", bars.len());
    let Some(last) = bars.last() else {
        out.push_str("No data yet\n");
        return out;
    };

    let _ = write!(
        out,
        "last {} at {}",
        format_price(Some(last.close)),
        format_label(last.timestamp, mode)
    );
    if let Some(change) = ChangeInfo::from_bars(bars) {
        let _ = write!(out, "  {}", change.text);
    }
    out.push('\n');

    let labels = axis_labels(bars, mode);
    if !labels.is_empty() {
        let _ = writeln!(out, "axis: {}", labels.join(" | "));
    }
    out
}

/// One line per live bar.
pub fn live_bar_line(bar: &Bar, mode: LabelMode) -> String {
    format!(
        "{}  {}  vol {}",
        format_label(bar.timestamp, mode),
        format_price(Some(bar.close)),
        bar.volume
    )
}

pub fn dips_table(dips: &CurrentDips) -> String {
    let mut out = String::new();
    if let Some(asof) = &dips.asof {
        let _ = writeln!(out, "as of {asof}");
    }
    if dips.items.is_empty() {
        out.push_str("No dips\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<8} {:<12} {:>9} {:>6} {:>10} {:>10}",
        "SYMBOL", "DATE", "DIP", "DAYS", "VS MKT", "VS SECTOR"
    );
    for item in &dips.items {
        let days = item.window_days.map_or_else(|| "-".to_string(), |d| d.to_string());
        let _ = writeln!(
            out,
            "{:<8} {:<12} {:>9} {:>6} {:>10} {:>10}",
            item.symbol,
            item.date,
            format_percent(item.dip),
            days,
            format_signed_points(item.relative_to_spy_pp),
            format_signed_points(item.relative_to_sector_pp),
        );
    }
    out
}

pub fn ticker_report(detail: &TickerDetail) -> String {
    let mut out = String::new();
    match detail.display_name() {
        Some(name) => {
            let _ = writeln!(out, "{} ({name})", detail.symbol);
        }
        None => {
            let _ = writeln!(out, "{}", detail.symbol);
        }
    }

    let close = detail.latest_price.as_ref().and_then(|p| p.close);
    let _ = writeln!(out, "latest close: {}", format_price(close));

    if !detail.recent_signals.is_empty() {
        out.push_str("signals:\n");
        for signal in &detail.recent_signals {
            let _ = writeln!(
                out,
                "  {} {} {}",
                signal.date,
                signal.rule,
                format_percent(signal.value)
            );
        }
    }
    if !detail.recent_alerts.is_empty() {
        out.push_str("alerts:\n");
        for alert in &detail.recent_alerts {
            let _ = writeln!(
                out,
                "  {} {} {}",
                alert.date,
                alert.rule,
                format_percent(alert.magnitude)
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::models::dips::{CurrentDip, PriceRow};

    use super::*;

    #[test]
    fn summary_with_and_without_bars() {
        assert_eq!(chart_summary("AAPL", &[], LabelMode::Time), "AAPL: 0 bars\nNo data yet\n");

        let bars = [
            Bar::new(1_709_562_600_000, 1.0, 1.0, 1.0, 50.0, 10.0),
            Bar::new(1_709_562_660_000, 1.0, 1.0, 1.0, 51.25, 10.0),
        ];
        let text = chart_summary("AAPL", &bars, LabelMode::Time);
        assert!(text.contains("last $51.25 at 09:31  +1.25 (+2.50%)"));
        assert!(text.contains("axis: 09:30 | 09:31"));
    }

    #[test]
    fn dips_table_formats_missing_values() {
        let dips = CurrentDips {
            asof: Some("2024-05-01".into()),
            windows: vec![5],
            items: vec![CurrentDip {
                symbol: "NVDA".into(),
                date: "2024-05-01".into(),
                dip: Some(-7.5),
                window_days: None,
                market_symbol: None,
                sector_symbol: None,
                relative_to_spy_pp: Some(-3.0),
                relative_to_sector_pp: None,
            }],
        };
        let table = dips_table(&dips);
        assert!(table.starts_with("as of 2024-05-01\n"));
        let row = table.lines().last().unwrap();
        assert!(row.starts_with("NVDA"));
        assert!(row.contains("-7.50%"));
        assert!(row.contains("-3.00pp"));
        assert!(row.trim_end().ends_with("n/a"));
    }

    #[test]
    fn ticker_report_without_name() {
        let detail = TickerDetail {
            symbol: "TSLA".into(),
            name: None,
            active: Some(true),
            latest_price: Some(PriceRow {
                symbol: "TSLA".into(),
                date: "2024-05-01".into(),
                open: None,
                high: None,
                low: None,
                close: Some(180.0),
                volume: None,
                source: None,
            }),
            recent_signals: vec![],
            recent_alerts: vec![],
        };
        assert_eq!(ticker_report(&detail), "TSLA\nlatest close: $180.00\n");
    }
}
