use nemo::{bindable, Environment, Options};
use serde::Deserialize;

#[derive(Debug, Default)]
struct AppSection {
    name: String,
    debug: bool,
}
bindable!(AppSection { name, debug });

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DatabaseSection {
    host: String,
    port: u16,
    name: String,
}

fn main() -> Result<(), nemo::Error> {
    let mut env = Environment::new(Vec::new());
    let report = env.start(
        Options::new()
            .with_search_paths(["demos/config"])
            .with_profiles(["dev"]),
    )?;
    println!(
        "loaded {} source(s), {} skipped, profiles: {}",
        report.loaded,
        report.skipped,
        env.active_profiles_string()
    );

    // Declared field table
    let mut app = AppSection::default();
    env.bind("app", &mut app)?;
    println!("App: {} (debug={})", app.name, app.debug);

    // Serde extraction of a subtree
    let database: DatabaseSection = env.extract("database")?;
    println!("Database: {database:?}");

    let pool = env.get_as::<u32>("database.pool.size")?.unwrap_or(1);
    println!("Pool size: {pool}");

    Ok(())
}
