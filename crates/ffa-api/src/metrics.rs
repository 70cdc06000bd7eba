use std::fmt::Write;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use ffa_core::WorkerStats;

use crate::state::AppState;

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut out = String::with_capacity(2048);
    let stats = &state.stats;

    writeln!(out, "# TYPE ffa_active_monitors gauge").unwrap();
    writeln!(out, "# HELP ffa_active_monitors Monitors eligible for sweeps").unwrap();
    let active = state
        .store
        .active_monitors()
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    writeln!(out, "ffa_active_monitors {}", active).unwrap();

    writeln!(out, "# TYPE ffa_uptime_sweeps counter").unwrap();
    writeln!(out, "# HELP ffa_uptime_sweeps Completed uptime sweeps").unwrap();
    writeln!(out, "ffa_uptime_sweeps {}", WorkerStats::get(&stats.uptime_sweeps)).unwrap();

    writeln!(out, "# TYPE ffa_uptime_sweeps_skipped counter").unwrap();
    writeln!(
        out,
        "# HELP ffa_uptime_sweeps_skipped Sweep ticks skipped (overlap or store outage)"
    )
    .unwrap();
    writeln!(
        out,
        "ffa_uptime_sweeps_skipped {}",
        WorkerStats::get(&stats.uptime_sweeps_skipped)
    )
    .unwrap();

    writeln!(out, "# TYPE ffa_pings counter").unwrap();
    writeln!(out, "# HELP ffa_pings Recorded ping results by outcome").unwrap();
    writeln!(out, "ffa_pings{{outcome=\"up\"}} {}", WorkerStats::get(&stats.pings_up)).unwrap();
    writeln!(out, "ffa_pings{{outcome=\"down\"}} {}", WorkerStats::get(&stats.pings_down)).unwrap();

    writeln!(out, "# TYPE ffa_ssl_sweeps counter").unwrap();
    writeln!(out, "# HELP ffa_ssl_sweeps Completed SSL sweeps").unwrap();
    writeln!(out, "ffa_ssl_sweeps {}", WorkerStats::get(&stats.ssl_sweeps)).unwrap();

    writeln!(out, "# TYPE ffa_ssl_expiry_updates counter").unwrap();
    writeln!(out, "# HELP ffa_ssl_expiry_updates Certificate expiries recorded").unwrap();
    writeln!(out, "ffa_ssl_expiry_updates {}", WorkerStats::get(&stats.ssl_updates)).unwrap();

    writeln!(out, "# TYPE ffa_logs_accepted counter").unwrap();
    writeln!(out, "# HELP ffa_logs_accepted Log records acknowledged with 202").unwrap();
    writeln!(out, "ffa_logs_accepted {}", WorkerStats::get(&stats.logs_accepted)).unwrap();

    writeln!(out, "# TYPE ffa_logs_dropped counter").unwrap();
    writeln!(
        out,
        "# HELP ffa_logs_dropped Acknowledged log records whose write failed"
    )
    .unwrap();
    writeln!(out, "ffa_logs_dropped {}", WorkerStats::get(&stats.logs_dropped)).unwrap();

    writeln!(out, "# EOF").unwrap();

    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        out,
    )
}
