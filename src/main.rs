use clap::Parser;
use simpledb::application::{ConfigService, Database};
use simpledb::cli::{format_name_list, format_sync, Cli, Commands, DataAction, FileAction};
use simpledb::domain::Entry;
use simpledb::error::{Result, SimpleDbError};
use simpledb::infrastructure::resolve_location;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let location = resolve_location(cli.location)?;

    match cli.command {
        Commands::Create { db } => {
            let database = Database::create(&location, &db)?;
            println!("Created database {} at {}", database.name(), database.root().display());
            Ok(())
        }
        Commands::Scan { path } => {
            let path = path.unwrap_or(location);
            let names = Database::scan(&path)?;
            print!("{}", format_name_list(&names, "No databases found\n"));
            Ok(())
        }
        Commands::List { db } => {
            let database = Database::connect(&location, &db)?;
            print!("{}", format_name_list(&database.entry_names(), "No entries\n"));
            Ok(())
        }
        Commands::Show { db, entry } => {
            let database = Database::connect(&location, &db)?;
            match entry {
                Some(name) => {
                    let entry = database.get(&name).ok_or_else(|| {
                        SimpleDbError::NotFound(format!("Entry \"{}\" not found", name.trim()))
                    })?;
                    println!("{}", entry);
                }
                None => println!("{}", database),
            }
            Ok(())
        }
        Commands::Add {
            db,
            entry,
            data,
            file,
        } => {
            let database = Database::connect(&location, &db)?;
            let new_entry = Entry::new(&entry)?.with_data(data)?.with_files(file);
            let name = new_entry.name().to_string();
            database.add(new_entry)?;

            if let Some(stored) = database.get(&name) {
                for path in stored.remote_files() {
                    println!("pending {}", path);
                }
            }
            println!("Added entry '{}'", name);
            Ok(())
        }
        Commands::Delete { db, entry } => {
            let database = Database::connect(&location, &db)?;
            database.delete(&entry)?;
            println!("Deleted entry '{}'", entry.trim());
            Ok(())
        }
        Commands::Rename {
            db,
            entry,
            new_name,
        } => {
            let database = Database::connect(&location, &db)?;
            database.rename(&entry, &new_name)?;
            println!("Renamed '{}' -> '{}'", entry.trim(), new_name.trim());
            Ok(())
        }
        Commands::Data { db, entry, action } => {
            let database = Database::connect(&location, &db)?;
            match action {
                DataAction::Add { lines } => database.upload_data(&entry, lines),
                DataAction::Remove { index } => database.remove_data(&entry, index),
                DataAction::Clear => database.clear_data(&entry),
            }
        }
        Commands::File { db, entry, action } => {
            let database = Database::connect(&location, &db)?;
            let sync = match action {
                FileAction::Add { paths } => database.upload_files(&entry, paths)?,
                FileAction::Remove { index } => database.remove_file(&entry, index)?,
                FileAction::Clear => database.clear_files(&entry)?,
            };
            print!("{}", format_sync(&sync));
            Ok(())
        }
        Commands::Log { db } => {
            let database = Database::connect(&location, &db)?;
            for line in database.read_log()? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Config {
            db,
            key,
            value,
            list,
        } => {
            let database = Database::connect(&location, &db)?;
            let service = ConfigService::new(database.root());

            if list {
                let config = service.list()?;
                println!("line_ending = {}", config.line_ending.name());
                println!("staged_writes = {}", config.staged_writes);
                Ok(())
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    println!("Set {} = {}", k, v);
                    Ok(())
                } else {
                    let val = service.get(&k)?;
                    println!("{}", val);
                    Ok(())
                }
            } else {
                println!("Usage: simpledb config <db> [--list | <key> [<value>]]");
                println!("Valid keys: line_ending, staged_writes");
                Ok(())
            }
        }
    }
}
