use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use stayhub::{
    domain::{
        CancellationPolicy, Listing, ListingStatus, Promotion, User, UserRole, UserStatus,
    },
    repository::{
        ListingRepository, SqliteListingRepository, SqliteUserRepository, UserRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the database with demo users, listings, and promotions")]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:stayhub.db")]
    database_url: String,
    #[arg(long, default_value_t = 3)]
    hosts: usize,
    #[arg(long, default_value_t = 2)]
    listings_per_host: usize,
    #[arg(long, default_value_t = 5)]
    guests: usize,
}

fn new_user(role: UserRole, with_bank: bool) -> User {
    let now = Utc::now();
    let full_name: String = Name().fake();
    User {
        id: Uuid::new_v4(),
        email: FreeEmail().fake(),
        full_name: full_name.clone(),
        role,
        status: UserStatus::Active,
        bank_name: with_bank.then(|| "Vietcombank".to_string()),
        bank_account_number: with_bank
            .then(|| format!("{:010}", rand::thread_rng().gen_range(0u64..10_000_000_000))),
        bank_account_holder: with_bank.then(|| full_name.to_uppercase()),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let listing_repo = SqliteListingRepository::new(db_pool.clone());

    println!("👥 Creating users...");
    let admin = user_repo.create(new_user(UserRole::Admin, false)).await?;
    println!("  ✅ Created admin {} ({})", admin.full_name, admin.id);

    let mut rng = rand::thread_rng();

    for _ in 0..args.guests {
        user_repo.create(new_user(UserRole::Guest, false)).await?;
    }
    println!("  ✅ Created {} guests", args.guests);

    println!("🏠 Creating hosts and listings...");
    for _ in 0..args.hosts {
        let host = user_repo.create(new_user(UserRole::Host, true)).await?;
        for _ in 0..args.listings_per_host {
            let now = Utc::now();
            let title: String = CompanyName().fake();
            listing_repo
                .create(Listing {
                    id: Uuid::new_v4(),
                    host_id: host.id,
                    title: format!("{title} Homestay"),
                    status: ListingStatus::Approved,
                    // Nightly rates between 300k and 1.5M VND
                    base_price: rng.gen_range(300..=1500) * 1_000,
                    cleaning_fee: rng.gen_range(50..=200) * 1_000,
                    service_fee: rng.gen_range(0..=100) * 1_000,
                    tax_pct: 0.0,
                    cancellation_policy: CancellationPolicy::default(),
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }
    }
    println!(
        "  ✅ Created {} hosts with {} listings each",
        args.hosts, args.listings_per_host
    );

    println!("🎟️  Creating promotions...");
    listing_repo
        .create_promotion(Promotion {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            discount_pct: 10.0,
            active: true,
            expires_at: Some(Utc::now() + Duration::days(90)),
        })
        .await?;
    listing_repo
        .create_promotion(Promotion {
            id: Uuid::new_v4(),
            code: "EXPIRED5".to_string(),
            discount_pct: 5.0,
            active: true,
            expires_at: Some(Utc::now() - Duration::days(1)),
        })
        .await?;
    println!("  ✅ Created 2 promotions (WELCOME10, EXPIRED5)");

    println!("🎉 Seeding complete!");
    Ok(())
}
