//! Console harness for `datarepo_core`.
//!
//! # Responsibility
//! - Run the sample CRUD scenario against a configured store.
//! - Mix blocking and async calls on the same repository.

use clap::Parser;
use datarepo_core::{
    core_version, default_log_level, init_logging, AsyncRepository, ConnectionConfig, Filter,
    RepoResult, Repository, SampleEntity, SqliteRepository, DEFAULT_CONNECTION_NAME,
};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "datarepo", version, about = "Exercise the generic CRUD repository")]
struct Args {
    /// Connection string (`:memory:`, `sqlite://<path>` or a file path).
    #[arg(long, env = "DATAREPO_DEFAULT_CONNECTION", default_value = ":memory:")]
    database: String,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_deref() {
        if let Err(err) = init_logging(&args.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let config = ConnectionConfig::with_default(args.database);
    let repo = match SqliteRepository::<SampleEntity>::open(&config, DEFAULT_CONNECTION_NAME) {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!("failed to open store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run_scenario(&repo).await;
    let closed = repo.close();

    match outcome.and(closed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run_scenario(repo: &SqliteRepository<SampleEntity>) -> RepoResult<()> {
    println!("datarepo_core version={}", core_version());

    // Adding
    repo.add_all_async(vec![
        SampleEntity::new("Turtle"),
        SampleEntity::new("Fox"),
        SampleEntity::new("Cat"),
    ])
    .await?;

    println!("# of records : {}\n", repo.count()?);
    print_rows(&repo.get_all_async().await?);

    // Updating
    if let Some(mut fox) = repo.find_async(Filter::eq("name", "Fox".to_string())).await? {
        fox.name = "Dog".to_string();
        if let Some(key) = fox.id {
            repo.update(&fox, &key)?;
        }
    }

    // Deleting
    let deleted = match repo.get(&3)? {
        Some(third) => repo.delete_async(third).await?,
        None => 0,
    };
    println!("{deleted}\n");

    print_rows(&repo.get_all()?);
    Ok(())
}

fn print_rows(rows: &[SampleEntity]) {
    for row in rows {
        let id = row.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("{id} | {}", row.name);
    }
}
