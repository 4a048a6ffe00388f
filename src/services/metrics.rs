use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec,
};
use sqlx::PgPool;
use tracing::{info, warn};

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref ROSTER_BRANCH_FAILURES: CounterVec = register_counter_vec!(
        "api_roster_branch_failures_total",
        "Mislukte fan-out branches per bron",
        &["branch"]
    ).unwrap();

    pub static ref STATUS_DECISIONS: CounterVec = register_counter_vec!(
        "api_status_decisions_total",
        "Goedkeuringsbeslissingen per uitkomst",
        &["decision"]
    ).unwrap();

    pub static ref COACH_ASSIGNMENTS: CounterVec = register_counter_vec!(
        "api_coach_assignments_total",
        "Coachtoewijzingen per actie",
        &["action"]
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref USERS_GAUGE: GaugeVec = register_gauge_vec!(
        "fitcoach_users_total",
        "Gebruikers per rol",
        &["role"]
    ).unwrap();

    pub static ref CLIENTS_GAUGE: GaugeVec = register_gauge_vec!(
        "fitcoach_clients_total",
        "Klanten per beoordelingsstatus",
        &["status"]
    ).unwrap();

    pub static ref ACTIVE_RELATIONSHIPS_GAUGE: Gauge = register_gauge!(
        "fitcoach_active_relationships_total",
        "Actieve coach-klant relaties"
    ).unwrap();

    pub static ref CHECKINS_GAUGE: GaugeVec = register_gauge_vec!(
        "fitcoach_checkins_7d_total",
        "Check-ins in de afgelopen zeven dagen per cadans",
        &["kind"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        // Initial collection on startup
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    // Users by role
    let user_counts: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(*)::BIGINT FROM users GROUP BY role")
            .fetch_all(pool)
            .await
            .unwrap_or_default();
    for (role, count) in user_counts {
        USERS_GAUGE.with_label_values(&[&role]).set(count as f64);
    }

    // Clients by review status
    let client_counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT p.client_status, COUNT(*)::BIGINT
         FROM profiles p
         JOIN users u ON u.id = p.user_id AND u.role = 'client'
         GROUP BY p.client_status",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();
    for (status, count) in client_counts {
        CLIENTS_GAUGE.with_label_values(&[&status]).set(count as f64);
    }

    // Active relationships
    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::BIGINT FROM coaching_relationships WHERE status = 'active'",
    )
    .fetch_one(pool)
    .await
    .unwrap_or(0);
    ACTIVE_RELATIONSHIPS_GAUGE.set(active as f64);

    // Check-ins over the trailing week, per cadence
    let weekly: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::BIGINT FROM weekly_checkins WHERE submitted_at >= NOW() - INTERVAL '7 days'",
    )
    .fetch_one(pool)
    .await
    .unwrap_or(0);
    CHECKINS_GAUGE.with_label_values(&["weekly"]).set(weekly as f64);

    let daily: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::BIGINT FROM daily_checkins WHERE logged_at >= NOW() - INTERVAL '7 days'",
    )
    .fetch_one(pool)
    .await
    .unwrap_or(0);
    CHECKINS_GAUGE.with_label_values(&["daily"]).set(daily as f64);

    info!("Metrics: roster gauges collected");
    Ok(())
}
