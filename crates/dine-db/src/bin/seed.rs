//! # Seed Data Generator
//!
//! Populates the database with paid bill history for analytics development.
//!
//! ## Usage
//! ```bash
//! # 30 days of history, 12 bills a day (default)
//! cargo run -p dine-db --bin seed
//!
//! # Custom window and volume
//! cargo run -p dine-db --bin seed -- --days 90 --per-day 40
//!
//! # Specify database path
//! cargo run -p dine-db --bin seed -- --db ./data/dine.db
//! ```
//!
//! ## Generated Bills
//! Each bill has:
//! - 1-4 menu lines with quantities 1-3
//! - Sequential bill number continuing after the highest existing one
//! - Discount on every fifth bill, tax from a small set of rates
//! - Payment method rotating through Cash, UPI, Card

use chrono::{Duration, Utc};
use dine_core::bill_number::{format_sequential, parse_suffix};
use dine_core::{compute_bill, BillCategory, LineItem, Money, Order, OrderStatus, PaymentMethod, TaxRate};
use dine_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// Menu used for generated orders: (name, price)
const MENU: &[(&str, i64)] = &[
    ("Masala Dosa", 120),
    ("Idli Sambar", 80),
    ("Paneer Tikka", 260),
    ("Veg Biryani", 220),
    ("Chicken Biryani", 280),
    ("Butter Naan", 45),
    ("Dal Makhani", 190),
    ("Gulab Jamun", 70),
    ("Masala Chai", 30),
    ("Cold Coffee", 110),
    ("Fresh Lime Soda", 60),
    ("Burger", 100),
    ("Coke", 40),
];

/// Tax rates in basis points
const TAX_RATES: &[u32] = &[0, 500, 1000, 1800];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 30;
    let mut per_day: usize = 12;
    let mut db_path = String::from("./dine_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(30);
                    i += 1;
                }
            }
            "--per-day" => {
                if i + 1 < args.len() {
                    per_day = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dine POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("      --days <N>       Days of history to generate (default: 30)");
                println!("      --per-day <N>    Paid bills per day (default: 12)");
                println!("  -d, --db <PATH>      Database file path (default: ./dine_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Dine POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("History:  {} days × {} bills", days, per_day);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut next_number = db
        .orders()
        .highest_bill_number()
        .await?
        .as_deref()
        .and_then(parse_suffix)
        .unwrap_or(0)
        + 1;

    println!("  First bill number: {}", format_sequential(next_number));
    println!();
    println!("Generating bills...");

    let start = std::time::Instant::now();
    let today = Utc::now();
    let mut generated = 0usize;

    for day in (0..days).rev() {
        for slot in 0..per_day {
            let seed = (day as usize) * 1000 + slot;
            let created_at = today - Duration::days(day) - Duration::minutes((slot * 37 % 600) as i64);
            let order = generate_bill(seed, format_sequential(next_number), created_at);

            if let Err(e) = db.orders().insert(&order).await {
                eprintln!("Failed to insert {:?}: {}", order.bill_number, e);
                continue;
            }

            next_number += 1;
            generated += 1;

            if generated % 100 == 0 {
                println!("  Generated {} bills...", generated);
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} bills in {:?}", generated, elapsed);

    let (paid, all) = db.reports().lifetime_counts().await?;
    println!("  Paid bills: {}  All orders: {}", paid, all);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one settled bill with deterministic contents.
fn generate_bill(seed: usize, bill_number: String, created_at: chrono::DateTime<Utc>) -> Order {
    let line_count = 1 + seed % 4;
    let items: Vec<LineItem> = (0..line_count)
        .map(|n| {
            let (name, price) = MENU[(seed * 7 + n * 3) % MENU.len()];
            let quantity = 1 + ((seed + n) % 3) as i64;
            LineItem::new(name, Money::from_units(price), quantity)
        })
        .collect();

    let subtotal: Money = items.iter().map(|item| item.total).sum();
    let discount = if seed % 5 == 0 {
        Money::from_units(subtotal.units() / 10)
    } else {
        Money::zero()
    };
    let tax_rate = TaxRate::from_bps(TAX_RATES[seed % TAX_RATES.len()]);
    let bill = compute_bill(subtotal, discount, tax_rate);

    let payment_method = PaymentMethod::ALL[seed % PaymentMethod::ALL.len()];
    let settled_at = created_at + Duration::minutes(20 + (seed % 40) as i64);

    Order {
        id: Uuid::new_v4().to_string(),
        bill_number: Some(bill_number),
        table_no: format!("T{}", 1 + seed % 12),
        items,
        subtotal,
        discount: bill.discount,
        tax_rate_bps: tax_rate.bps(),
        tax_amount: bill.tax_amount,
        total: bill.total,
        payment_method: Some(payment_method),
        status: OrderStatus::Paid,
        bill_category: if seed % 6 == 0 {
            BillCategory::Takeaway
        } else {
            BillCategory::DineIn
        },
        customer_name: None,
        customer_phone: None,
        kitchen_notes: None,
        created_at,
        updated_at: settled_at,
        version: 3,
    }
}
