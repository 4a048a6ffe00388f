//! Demo practice seed script
//!
//! Fills the database with realistic Dutch-language coaching data:
//! - 1 admin, 2 coaches, a configurable number of clients
//! - Active coaching relationships, one historic reassignment, one paused row
//! - Weekly and daily check-ins for the past weeks with drifting weights
//! - Upcoming sessions inside and outside the dashboard window
//! - Program enrollments (one client deliberately left without a program)
//! - A handful of unread messages for the first coach
//!
//! Usage:
//!   DATABASE_URL=... JWT_SECRET=... ./seed-demo [--clients 6] [--reset]
//!
//! Prints ready-to-use bearer tokens for the admin and the first coach.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rand::Rng;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use uuid::Uuid;

use fitcoach_api::db;
use fitcoach_api::middleware::auth::issue_access_token;
use fitcoach_api::models::identity::Role;
use fitcoach_api::models::relationship::NewRelationship;
use fitcoach_api::stores::postgres::postgres_stores;

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed the fitcoach database with demo data")]
struct Args {
    /// Number of demo clients to create
    #[arg(long, default_value_t = 6)]
    clients: usize,

    /// Wipe existing rows before seeding
    #[arg(long)]
    reset: bool,
}

const CLIENT_NAMES: &[(&str, &str)] = &[
    ("Daan", "Bakker"),
    ("Lotte", "de Vries"),
    ("Sem", "Jansen"),
    ("Fleur", "van den Berg"),
    ("Thijs", "Smit"),
    ("Noor", "Mulder"),
    ("Bram", "de Jong"),
    ("Eva", "Vermeer"),
    ("Ruben", "Kuipers"),
    ("Sofie", "Hendriks"),
];

const PROGRAMS: &[&str] = &["12 weken vetverlies", "Krachtopbouw", "Onderhoud"];
const MOODS: &[&str] = &["energiek", "moe", "gemotiveerd", "gestrest"];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me".to_string());

    println!("=== Seed Demo Practice ===");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // 1. Optional clean slate
    if args.reset {
        println!("Wiping existing rows...");
        wipe(&pool).await?;
    }

    // 2. Staff
    println!("Inserting staff...");
    let admin_id = Uuid::new_v4();
    let coach_mark_id = Uuid::new_v4();
    let coach_sanne_id = Uuid::new_v4();

    let staff = [
        (admin_id, "hanneke@fitcoach.nl", "Hanneke", "de Boer", "admin"),
        (coach_mark_id, "mark@fitcoach.nl", "Mark", "van Dijk", "coach"),
        (coach_sanne_id, "sanne@fitcoach.nl", "Sanne", "Visser", "coach"),
    ];

    for (id, email, first, last, role) in &staff {
        insert_user(&pool, *id, email, role).await?;
        insert_profile(&pool, *id, first, last, "approved", None).await?;
    }

    // 3. Clients
    println!("Inserting {} clients...", args.clients);
    let mut client_ids = Vec::with_capacity(args.clients);
    for i in 0..args.clients {
        let (first, last) = CLIENT_NAMES[i % CLIENT_NAMES.len()];
        let id = Uuid::new_v4();
        let email = format!(
            "{}.{}{}@voorbeeld.nl",
            first.to_lowercase(),
            last.to_lowercase().replace(' ', ""),
            i / CLIENT_NAMES.len()
        );
        insert_user(&pool, id, &email, "client").await?;

        // Last client stays pending, the one before it gets rejected; the
        // rest are approved and will be assigned below.
        let status = if i + 1 == args.clients && args.clients > 2 {
            "pending"
        } else if i + 2 == args.clients && args.clients > 2 {
            "rejected"
        } else {
            "approved"
        };
        let reason = (status == "rejected").then_some("Afgewezen door coach");
        insert_profile(&pool, id, first, last, status, reason).await?;
        client_ids.push((id, status));
    }

    // 4. Relationships, through the same store the API uses
    println!("Linking clients to coaches...");
    let stores = postgres_stores(&pool, std::time::Duration::from_secs(5));
    let approved: Vec<Uuid> = client_ids
        .iter()
        .filter(|(_, status)| *status == "approved")
        .map(|(id, _)| *id)
        .collect();

    for (i, client_id) in approved.iter().enumerate() {
        let coach_id = if i % 2 == 0 { coach_mark_id } else { coach_sanne_id };
        stores
            .relationships
            .insert(NewRelationship {
                coach_id,
                client_id: *client_id,
                started_at: Utc::now() - Duration::weeks(6),
            })
            .await
            .context("Failed to insert relationship")?;
    }

    // Reassign the first client once so the ledger carries an ended row.
    if let Some(first_client) = approved.first() {
        stores
            .relationships
            .assign_active(coach_sanne_id, *first_client, Utc::now() - Duration::weeks(2))
            .await
            .context("Failed to reassign first client")?;
    }

    // One paused relationship for a rejected client, written raw because the
    // API never writes that status itself.
    if let Some((rejected_id, _)) = client_ids.iter().find(|(_, s)| *s == "rejected") {
        sqlx::query(
            "INSERT INTO coaching_relationships (coach_id, client_id, status, started_at)
             VALUES ($1, $2, 'paused', $3)",
        )
        .bind(coach_mark_id)
        .bind(rejected_id)
        .bind(Utc::now() - Duration::weeks(10))
        .execute(&pool)
        .await?;
    }

    // 5. Check-ins
    println!("Inserting check-ins...");
    let mut rng = rand::thread_rng();
    for client_id in &approved {
        let base_weight: f64 = rng.gen_range(62.0..95.0);

        // Weekly: one per week for the past five weeks, older ones reviewed.
        for week in 1..=5i64 {
            let feedback =
                (week >= 2).then_some("Goed bezig, houd dit vol!");
            sqlx::query(
                "INSERT INTO weekly_checkins (user_id, submitted_at, weight_kg, coach_feedback, notes)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(client_id)
            .bind(Utc::now() - Duration::weeks(week))
            .bind(base_weight + week as f64 * 0.3)
            .bind(feedback)
            .bind("Training ging goed deze week")
            .execute(&pool)
            .await?;
        }

        // Daily: the past ten days with a drifting weight.
        for day in 0..10i64 {
            let drift: f64 = rng.gen_range(-0.4..0.4);
            let mood = MOODS[rng.gen_range(0..MOODS.len())];
            sqlx::query(
                "INSERT INTO daily_checkins (user_id, logged_at, weight_kg, mood)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(client_id)
            .bind(Utc::now() - Duration::days(day) - Duration::hours(7))
            .bind(base_weight - day as f64 * 0.1 + drift)
            .bind(mood)
            .execute(&pool)
            .await?;
        }
    }

    // 6. Sessions
    println!("Inserting sessions...");
    let session_types = ["Krachttraining", "Voedingsconsult", "Intake"];
    for (i, client_id) in approved.iter().enumerate() {
        let coach_id = if i % 2 == 0 { coach_sanne_id } else { coach_mark_id };
        let session_type = session_types[i % session_types.len()];
        let mode = if i % 3 == 0 { "in_person" } else { "online" };

        // One inside the seven-day dashboard window, one beyond it.
        for (offset_days, status) in [(2i64, "scheduled"), (12, "scheduled")] {
            sqlx::query(
                "INSERT INTO sessions (coach_id, client_id, start_time, session_type, status, mode)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(coach_id)
            .bind(client_id)
            .bind(Utc::now() + Duration::days(offset_days) + Duration::hours(i as i64 % 5))
            .bind(session_type)
            .bind(status)
            .bind(mode)
            .execute(&pool)
            .await?;
        }
    }

    // A cancelled session that must never show up anywhere.
    if let Some(first_client) = approved.first() {
        sqlx::query(
            "INSERT INTO sessions (coach_id, client_id, start_time, session_type, status, mode)
             VALUES ($1, $2, $3, 'Krachttraining', 'cancelled', 'online')",
        )
        .bind(coach_sanne_id)
        .bind(first_client)
        .bind(Utc::now() + Duration::days(1))
        .execute(&pool)
        .await?;
    }

    // 7. Enrollments (skip the last approved client: "Geen programma")
    println!("Inserting enrollments...");
    for (i, client_id) in approved.iter().enumerate() {
        if i + 1 == approved.len() {
            continue;
        }
        sqlx::query(
            "INSERT INTO program_enrollments (client_id, program_name, status)
             VALUES ($1, $2, 'active')",
        )
        .bind(client_id)
        .bind(PROGRAMS[i % PROGRAMS.len()])
        .execute(&pool)
        .await?;
    }

    // 8. Unread messages for the first coach
    println!("Inserting messages...");
    for client_id in approved.iter().take(3) {
        sqlx::query(
            "INSERT INTO messages (sender_id, recipient_id, body)
             VALUES ($1, $2, 'Korte vraag over mijn schema voor volgende week')",
        )
        .bind(client_id)
        .bind(coach_mark_id)
        .execute(&pool)
        .await?;
    }

    // 9. Tokens for poking at the API by hand
    let admin_token = issue_access_token(admin_id, Role::Admin, &jwt_secret, 72)?;
    let coach_token = issue_access_token(coach_mark_id, Role::Coach, &jwt_secret, 72)?;

    println!();
    println!("=== Demo practice seeded successfully! ===");
    println!("  Staff    :");
    for (_, email, first, last, role) in &staff {
        println!("             {email} ({first} {last}, {role})");
    }
    println!("  Clients  : {} total", client_ids.len());
    println!("  Admin token : {admin_token}");
    println!("  Coach token : {coach_token}");

    Ok(())
}

async fn insert_user(pool: &PgPool, id: Uuid, email: &str, role: &str) -> Result<()> {
    sqlx::query("INSERT INTO users (id, email, role) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(email)
        .bind(role)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert user {email}"))?;
    Ok(())
}

async fn insert_profile(
    pool: &PgPool,
    user_id: Uuid,
    first: &str,
    last: &str,
    status: &str,
    reason: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO profiles (user_id, first_name, last_name, client_status, rejection_reason,
                               status_updated_at)
         VALUES ($1, $2, $3, $4, $5, NOW())",
    )
    .bind(user_id)
    .bind(first)
    .bind(last)
    .bind(status)
    .bind(reason)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert profile for {first} {last}"))?;
    Ok(())
}

async fn wipe(pool: &PgPool) -> Result<()> {
    for table in [
        "messages",
        "program_enrollments",
        "sessions",
        "daily_checkins",
        "weekly_checkins",
        "coaching_relationships",
        "profiles",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await
            .with_context(|| format!("Failed to wipe {table}"))?;
    }
    Ok(())
}
