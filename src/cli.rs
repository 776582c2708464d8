use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use library_lender::{BookStatus, BookUpdate, Id, NewBook, NewUser, UserUpdate};

/// Command-line arguments for the library lending system
#[derive(Parser, Debug)]
#[command(name = "library-lender", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding books.json, users.json and requests.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fill empty collections with sample records
    Init,
    /// Manage the catalog
    #[command(subcommand)]
    Book(BookCommand),
    /// Manage patrons
    #[command(subcommand)]
    User(UserCommand),
    /// Lend a book to a user
    Borrow {
        /// Borrower
        user_id: Id,
        /// Book to lend
        book_id: Id,
    },
    /// Close an active request
    Return {
        /// Request to close
        request_id: Id,
    },
    /// Extend an active request by one renewal period
    Renew {
        /// Request to renew
        request_id: Id,
    },
    /// List every request
    Requests,
    /// List overdue loans
    Overdue,
    /// Print a report
    #[command(subcommand)]
    Report(ReportCommand),
    /// Write the collections as CSV files
    Export {
        /// Output directory, defaults to the configured export directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Catalog commands
#[derive(Subcommand, Debug)]
pub enum BookCommand {
    /// Add a book
    Add(BookFields),
    /// List every book
    List,
    /// Find books by title, author or ISBN
    Search {
        /// Text to look for, case-insensitive
        term: String,
    },
    /// Show one book's availability
    Show {
        /// Book to check
        id: Id,
    },
    /// Change some fields of a book
    Update {
        /// Book to change
        id: Id,
        /// Fields to overwrite
        #[command(flatten)]
        fields: BookUpdateArgs,
    },
    /// Remove a book that is not on loan
    Delete {
        /// Book to remove
        id: Id,
    },
}

/// Fields of a new book
#[derive(Args, Debug)]
pub struct BookFields {
    /// Title
    #[arg(long)]
    pub title: String,
    /// Author
    #[arg(long)]
    pub author: String,
    /// ISBN
    #[arg(long, default_value = "")]
    pub isbn: String,
    /// Category
    #[arg(long, default_value = "")]
    pub category: String,
    /// Publication year
    #[arg(long, default_value_t = 0)]
    pub year: u32,
}

impl From<BookFields> for NewBook {
    fn from(args: BookFields) -> Self {
        Self {
            title: args.title,
            author: args.author,
            isbn: args.isbn,
            category: args.category,
            year: args.year,
        }
    }
}

/// Book status as typed on the command line
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StatusArg {
    /// On the shelf
    Available,
    /// Out on loan
    Borrowed,
}

impl From<StatusArg> for BookStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Available => Self::Available,
            StatusArg::Borrowed => Self::Borrowed,
        }
    }
}

/// Optional book fields to overwrite
#[derive(Args, Debug, Default)]
pub struct BookUpdateArgs {
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New author
    #[arg(long)]
    pub author: Option<String>,
    /// New ISBN
    #[arg(long)]
    pub isbn: Option<String>,
    /// New category
    #[arg(long)]
    pub category: Option<String>,
    /// New publication year
    #[arg(long)]
    pub year: Option<u32>,
    /// New status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
}

impl From<BookUpdateArgs> for BookUpdate {
    fn from(args: BookUpdateArgs) -> Self {
        Self {
            title: args.title,
            author: args.author,
            isbn: args.isbn,
            category: args.category,
            year: args.year,
            status: args.status.map(BookStatus::from),
        }
    }
}

/// Patron commands
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a patron
    Add(UserFields),
    /// List every patron
    List,
    /// Show a patron's counters and current loans
    History {
        /// Patron to show
        id: Id,
    },
    /// Change some fields of a patron
    Update {
        /// Patron to change
        id: Id,
        /// Fields to overwrite
        #[command(flatten)]
        fields: UserUpdateArgs,
    },
    /// Remove a patron without loans
    Delete {
        /// Patron to remove
        id: Id,
    },
}

/// Fields of a new patron
#[derive(Args, Debug)]
pub struct UserFields {
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Email
    #[arg(long, default_value = "")]
    pub email: String,
    /// Phone
    #[arg(long, default_value = "")]
    pub phone: String,
    /// Address
    #[arg(long, default_value = "")]
    pub address: String,
}

impl From<UserFields> for NewUser {
    fn from(args: UserFields) -> Self {
        Self { name: args.name, email: args.email, phone: args.phone, address: args.address }
    }
}

/// Optional patron fields to overwrite
#[derive(Args, Debug, Default)]
pub struct UserUpdateArgs {
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New email
    #[arg(long)]
    pub email: Option<String>,
    /// New phone
    #[arg(long)]
    pub phone: Option<String>,
    /// New address
    #[arg(long)]
    pub address: Option<String>,
}

impl From<UserUpdateArgs> for UserUpdate {
    fn from(args: UserUpdateArgs) -> Self {
        Self { name: args.name, email: args.email, phone: args.phone, address: args.address }
    }
}

/// Report commands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ReportCommand {
    /// Library-wide counts and categories
    Stats,
    /// The ten most borrowed books
    Popular,
    /// Active and total borrowings per patron
    Activity,
    /// Overdue loans grouped by days late
    Overdue,
}
