//! Observer example: decoupled views reacting to rating changes

use resep_ratings::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== resep-ratings Observer Example ===\n");

    let repo = RatingRepository::new(MemoryStore::new());
    repo.initialize()?;

    // A detail view that only cares about one recipe
    let detail = repo.subscribe("42", |change: &RatingChange| {
        println!(
            "[detail] recipe {} now {} ({} ratings)",
            change.recipe_id, change.average, change.count
        );
    });

    // A list view that re-renders on any change
    repo.subscribe_global(|change: &RatingChange| {
        println!("[list] something changed: recipe '{}'", change.recipe_id);
    });

    repo.set_user_rating("42", "alice", 5)?;
    repo.set_user_rating("42", "budi", 3)?;
    repo.set_user_rating("7", "alice", 4)?;

    // The detail view goes away; the list keeps watching
    repo.unsubscribe(detail);
    repo.set_user_rating("42", "citra", 4)?;

    Ok(())
}
