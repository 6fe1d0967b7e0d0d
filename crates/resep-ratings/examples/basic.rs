//! Basic example: submit ratings and read the reconciled aggregate

use resep_ratings::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== resep-ratings Basic Example ===\n");

    // An origin carrying a pre-migration compound key
    let store = MemoryStore::with_entries([("recipe-42-rating-budi", "4")]);
    let repo = RatingRepository::new(store);

    // Fold the legacy schema into the per-user collection (runs once)
    let swept = repo.initialize()?;
    println!("migration sweep ran: {swept}");

    // Submit some ratings
    repo.set_user_rating("42", "alice", 5)?;
    repo.set_user_rating("42", "citra", 3)?;
    repo.set_legacy_rating("42", 4)?;

    // Read through the cache
    let aggregate = repo.aggregate("42");
    println!(
        "recipe 42: average {} from {} ratings",
        aggregate.average, aggregate.count
    );

    // A second read is a cache hit
    match repo.cached_aggregate("42") {
        CacheLookup::Hit(entry) => println!("cache hit, computed at {}", entry.computed_at),
        CacheLookup::Miss => println!("cache miss"),
    }

    Ok(())
}
