use anyhow::Context;
use clap::{Parser, Subcommand};
use literalura_app::App;
use literalura_kernel::settings::Settings;
use serde::Serialize;

/// Book and author catalog backed by OpenLibrary search.
#[derive(Debug, Parser)]
#[command(name = "literalura", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Search OpenLibrary by title and store the first hit
    Search {
        /// Title to look up; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// List stored books, optionally in one language
    Books {
        /// Language code as stored, e.g. en or spa
        #[arg(long)]
        lang: Option<String>,
    },
    /// Show the five most searched books
    Top,
    /// List stored authors, optionally only those alive in a year
    Authors {
        #[arg(long, value_name = "YEAR")]
        alive: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load LiterAlura settings")?;
    literalura_telemetry::init(&settings.telemetry)?;

    let app = App::build(settings).await?;
    match cli.command {
        Command::Serve => app.serve().await,
        Command::Migrate => {
            let applied = app.migrate().await;
            app.db.close().await;
            print(&serde_json::json!({ "applied": applied? }))
        }
        query => {
            app.migrate().await?;
            let outcome = query_catalog(&app, query).await;
            app.db.close().await;
            outcome
        }
    }
}

/// Run one read or search command and print its result as JSON.
async fn query_catalog(app: &App, command: Command) -> anyhow::Result<()> {
    let catalog = &app.catalog;
    match command {
        Command::Serve | Command::Migrate => Ok(()),
        Command::Search { title } => print(&catalog.search(&title.join(" ")).await?),
        Command::Books { lang: Some(lang) } => print(&*catalog.books_by_language(&lang).await?),
        Command::Books { lang: None } => print(&*catalog.all_books().await?),
        Command::Top => print(&*catalog.top_books().await?),
        Command::Authors { alive: Some(year) } => print(&*catalog.authors_alive_in(year).await?),
        Command::Authors { alive: None } => print(&*catalog.all_authors().await?),
    }
}

fn print<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_joins_title_words() {
        let cli = Cli::try_parse_from(["literalura", "search", "The", "Hobbit"]).unwrap();
        match cli.command {
            Command::Search { title } => assert_eq!(title.join(" "), "The Hobbit"),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["literalura", "search"]).is_err());
    }

    #[test]
    fn listing_flags_parse() {
        let cli = Cli::try_parse_from(["literalura", "books", "--lang", "es"]).unwrap();
        assert!(matches!(cli.command, Command::Books { lang: Some(ref l) } if l == "es"));

        let cli = Cli::try_parse_from(["literalura", "authors", "--alive", "1850"]).unwrap();
        assert!(matches!(cli.command, Command::Authors { alive: Some(1850) }));

        assert!(Cli::try_parse_from(["literalura", "authors", "--alive", "soon"]).is_err());
    }
}
