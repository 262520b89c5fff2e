//! One-shot operator tool that rebuilds the student table with synthetic
//! records carrying `YYYY-NNNN` identifiers.
//!
//! Runs four linear steps and reports the failed step number on abort:
//! 1. connect to the database and sync the schema
//! 2. clear the student table
//! 3. verify the table is empty
//! 4. bulk-generate students across a fixed per-year distribution
//!
//! Steps 2-4 run inside a single transaction. Nothing is applied until the
//! operator types COMMIT at the final prompt; any other input rolls back.

use std::io::{BufRead, Write};

use anyhow::anyhow;
use rand::seq::IndexedRandom;
use sea_orm::*;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database;
use server::entity::{program, student};
use server::models::student::YEAR_LEVELS;
use server::seed;
use server::utils::student_id;

/// Students generated per admission year.
const DISTRIBUTION: &[(i32, i32)] = &[
    (2021, 50),
    (2022, 70),
    (2023, 80),
    (2024, 76),
    (2025, 70),
];

const FIRST_NAMES: &[&str] = &[
    "Maria", "Jose", "Juan", "Ana", "Carlo", "Sofia", "Miguel", "Isabel",
    "Rafael", "Elena", "Diego", "Lucia", "Marco", "Teresa", "Andres", "Clara",
    "Paolo", "Bianca", "Ramon", "Nina",
];

const LAST_NAMES: &[&str] = &[
    "Santos", "Reyes", "Cruz", "Bautista", "Garcia", "Mendoza", "Torres",
    "Flores", "Rivera", "Aquino", "Navarro", "Salazar", "Domingo", "Villanueva",
    "Castillo", "Ramos",
];

const GENDERS: &[&str] = &["Male", "Female", "Other"];

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    if let Err((step, e)) = run().await {
        eprintln!("Migration failed at step {step}: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), (u32, anyhow::Error)> {
    // Step 1: connect + schema sync.
    let config = AppConfig::load().map_err(|e| (1, e.into()))?;
    let db = database::init_db(&config.database.url)
        .await
        .map_err(|e| (1, e.into()))?;
    seed::ensure_constraints(&db)
        .await
        .map_err(|e| (1, e.into()))?;
    info!("Step 1/4: connected and synced schema");

    // The generator assigns every student a program, so at least one must
    // exist before anything destructive happens.
    let programs = program::Entity::find()
        .all(&db)
        .await
        .map_err(|e| (1, e.into()))?;
    if programs.is_empty() {
        return Err((1, anyhow!("no programs exist; create at least one first")));
    }

    let answer = prompt(
        "This will DELETE ALL students and regenerate them. Type MIGRATE to continue: ",
    )
    .map_err(|e| (2, e))?;
    if answer != "MIGRATE" {
        println!("Aborted, nothing changed.");
        return Ok(());
    }

    let txn = db.begin().await.map_err(|e| (2, e.into()))?;

    // Step 2: clear the student table.
    let deleted = student::Entity::delete_many()
        .exec(&txn)
        .await
        .map_err(|e| (2, e.into()))?
        .rows_affected;
    info!("Step 2/4: cleared {deleted} student rows");

    // Step 3: verify the clear took effect inside this transaction.
    let remaining = student::Entity::find()
        .count(&txn)
        .await
        .map_err(|e| (3, e.into()))?;
    if remaining != 0 {
        return Err((3, anyhow!("student table still holds {remaining} rows")));
    }
    info!("Step 3/4: verified student table is empty");

    // Step 4: generate the synthetic population.
    let mut rng = rand::rng();
    let mut generated = 0u32;
    for &(year, count) in DISTRIBUTION {
        let mut batch = Vec::with_capacity(count as usize);
        for sequence in 1..=count {
            batch.push(make_student(&mut rng, &programs, year, sequence).map_err(|e| (4, e))?);
        }
        student::Entity::insert_many(batch)
            .exec(&txn)
            .await
            .map_err(|e| (4, e.into()))?;
        generated += count as u32;
        info!("Step 4/4: generated {count} students for {year}");
    }
    info!("Step 4/4: generated {generated} students total");

    let answer = prompt("Type COMMIT to apply, anything else rolls back: ").map_err(|e| (4, e))?;
    if answer == "COMMIT" {
        txn.commit().await.map_err(|e| (4, e.into()))?;
        println!("Committed {generated} students.");
    } else {
        txn.rollback().await.map_err(|e| (4, e.into()))?;
        println!("Rolled back, nothing changed.");
    }

    Ok(())
}

fn pick<'a>(rng: &mut impl rand::Rng, pool: &[&'a str]) -> Result<&'a str, anyhow::Error> {
    pool.choose(rng)
        .copied()
        .ok_or_else(|| anyhow!("empty sample pool"))
}

fn make_student(
    rng: &mut impl rand::Rng,
    programs: &[program::Model],
    year: i32,
    sequence: i32,
) -> Result<student::ActiveModel, anyhow::Error> {
    let program = programs
        .choose(rng)
        .ok_or_else(|| anyhow!("empty program pool"))?;

    Ok(student::ActiveModel {
        id: Set(student_id::format_id(year, sequence)),
        firstname: Set(pick(rng, FIRST_NAMES)?.to_string()),
        lastname: Set(pick(rng, LAST_NAMES)?.to_string()),
        program_id: Set(Some(program.id)),
        year: Set(pick(rng, YEAR_LEVELS)?.to_string()),
        gender: Set(pick(rng, GENDERS)?.to_string()),
        profile_pic: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    })
}
