use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use library_lender::{
    BookUpdate, LibraryConfig, LibrarySystem, UserUpdate, export,
    report::{self, ReportFormatter},
    seed,
};

/// Command-line definitions
mod cli;

use cli::{BookCommand, Cli, Command, ReportCommand, UserCommand};

/// Install the stderr subscriber; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    drop(fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init());
}

/// Configuration from the file named on the command line, then `--data-dir`
fn load_config(cli: &Cli) -> Result<LibraryConfig> {
    let mut config = match &cli.config {
        Some(path) => LibraryConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => LibraryConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }
    Ok(config)
}

/// Entry point of the command-line interface
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let mut system = LibrarySystem::open(&config).context("failed to load library data")?;

    let mutated = run(&mut system, &config, cli.command)?;
    if mutated {
        system.save(&config).context("failed to save library data")?;
    }
    Ok(())
}

/// Execute one command; returns whether the store changed
fn run(system: &mut LibrarySystem, config: &LibraryConfig, command: Command) -> Result<bool> {
    match command {
        Command::Init => {
            let seeded = seed::seed_empty_collections(system.store_mut());
            if seeded.any() {
                println!("{}", "Sample data created.".green().bold());
            } else {
                println!("All collections already hold data; nothing seeded.");
            }
            Ok(seeded.any())
        }
        Command::Book(command) => run_book(system, command),
        Command::User(command) => run_user(system, command),
        Command::Borrow { user_id, book_id } => {
            let receipt = system.lending().borrow(user_id, book_id)?;
            println!(
                "{}",
                format!("Book '{}' borrowed successfully!", receipt.book_title).green().bold()
            );
            println!("Due Date: {}", receipt.due_date);
            println!("Request ID: {}", receipt.request_id);
            Ok(true)
        }
        Command::Return { request_id } => {
            let receipt = system.lending().return_book(request_id)?;
            println!(
                "{}",
                format!("Book '{}' returned successfully!", receipt.book_title).green().bold()
            );
            if receipt.days_overdue > 0 {
                println!("{}", format!("Book was {} days overdue", receipt.days_overdue).red());
                println!("{}", format!("Fine amount: ${}", receipt.fine).red().bold());
            }
            Ok(true)
        }
        Command::Renew { request_id } => {
            let receipt = system.lending().renew(request_id)?;
            println!("{}", "Book renewed successfully!".green().bold());
            println!("New due date: {}", receipt.due_date);
            println!("Renewals used: {}", receipt.renewals);
            Ok(true)
        }
        Command::Requests => {
            let lending = system.lending();
            print!("{}", ReportFormatter::requests_table(&lending.requests()));
            Ok(false)
        }
        Command::Overdue => {
            let today = system.today();
            let overdue: Vec<_> = system.lending().list_overdue(today).collect();
            println!("{}", "OVERDUE BOOKS".yellow().bold());
            print!("{}", ReportFormatter::overdue_list(&overdue));
            Ok(false)
        }
        Command::Report(command) => {
            run_report(system, command);
            Ok(false)
        }
        Command::Export { out } => {
            let dir = out.unwrap_or_else(|| config.export_dir().to_path_buf());
            let timestamp = chrono::Local::now().naive_local();
            let paths = export::export_csv(system.store(), &dir, timestamp)
                .context("failed to export data")?;
            println!("{}", "Data exported successfully!".green().bold());
            println!("Books: {}", paths.books.display());
            println!("Users: {}", paths.users.display());
            println!("Requests: {}", paths.requests.display());
            Ok(false)
        }
    }
}

/// Catalog commands
fn run_book(system: &mut LibrarySystem, command: BookCommand) -> Result<bool> {
    let mut catalog = system.catalog();
    match command {
        BookCommand::Add(fields) => {
            let book = catalog.add_book(fields.into())?;
            println!(
                "{}",
                format!("Book '{}' added successfully with ID: {}", book.title, book.id)
                    .green()
                    .bold()
            );
            Ok(true)
        }
        BookCommand::List => {
            print!("{}", ReportFormatter::books_table(&catalog.books()));
            Ok(false)
        }
        BookCommand::Search { term } => {
            let results = catalog.search(&term);
            println!("Found {} book(s):", results.len());
            print!("{}", ReportFormatter::books_table(&results));
            Ok(false)
        }
        BookCommand::Show { id } => {
            let availability = catalog.check_availability(id)?;
            print!("{}", ReportFormatter::availability(&availability));
            Ok(false)
        }
        BookCommand::Update { id, fields } => {
            let update = BookUpdate::from(fields);
            if update.is_empty() {
                bail!("nothing to update for book {id}: pass at least one field");
            }
            catalog.update_book(id, update)?;
            println!("{}", "Book updated successfully!".green().bold());
            Ok(true)
        }
        BookCommand::Delete { id } => {
            let removed = catalog.delete_book(id)?;
            println!(
                "{}",
                format!("Book '{}' deleted successfully!", removed.title).green().bold()
            );
            Ok(true)
        }
    }
}

/// Patron commands
fn run_user(system: &mut LibrarySystem, command: UserCommand) -> Result<bool> {
    let mut patrons = system.patrons();
    match command {
        UserCommand::Add(fields) => {
            let user = patrons.add_user(fields.into())?;
            println!(
                "{}",
                format!("User '{}' added successfully with ID: {}", user.name, user.id)
                    .green()
                    .bold()
            );
            Ok(true)
        }
        UserCommand::List => {
            print!("{}", ReportFormatter::users_table(&patrons.users()));
            Ok(false)
        }
        UserCommand::History { id } => {
            let history = patrons.history(id)?;
            print!("{}", ReportFormatter::history(&history));
            Ok(false)
        }
        UserCommand::Update { id, fields } => {
            let update = UserUpdate::from(fields);
            if update.is_empty() {
                bail!("nothing to update for user {id}: pass at least one field");
            }
            patrons.update_user(id, update)?;
            println!("{}", "User updated successfully!".green().bold());
            Ok(true)
        }
        UserCommand::Delete { id } => {
            let removed = patrons.delete_user(id)?;
            println!(
                "{}",
                format!("User '{}' deleted successfully!", removed.name).green().bold()
            );
            Ok(true)
        }
    }
}

/// Read-only reports
fn run_report(system: &mut LibrarySystem, command: ReportCommand) {
    match command {
        ReportCommand::Stats => {
            println!("{}", "LIBRARY STATISTICS".yellow().bold());
            print!("{}", ReportFormatter::statistics(&report::library_statistics(system.store())));
        }
        ReportCommand::Popular => {
            println!("{}", "MOST POPULAR BOOKS".yellow().bold());
            print!("{}", ReportFormatter::popularity_table(&system.lending().popularity_ranking()));
        }
        ReportCommand::Activity => {
            println!("{}", "USER ACTIVITY REPORT".yellow().bold());
            print!("{}", ReportFormatter::activity_table(&report::user_activity(system.store())));
        }
        ReportCommand::Overdue => {
            let today = system.today();
            let distribution = system.lending().overdue_distribution(today);
            println!("{}", "OVERDUE ANALYSIS".yellow().bold());
            print!("{}", ReportFormatter::distribution_table(&distribution));
        }
    }
}
