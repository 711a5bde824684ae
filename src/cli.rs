//! Command-line front end.
//!
//! Each subcommand stands in for one screen of the booking site. Failures are
//! reported as short alerts; they never abort with a backtrace.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::api::auth::{FileStore, KeyringStore, TokenStore};
use crate::api::client::{ApiClient, RequestScope};
use crate::api::navigator::{Navigator, LOGIN_PATH};
use crate::api::types::{Booking, RegisterData, Tour, TourFilter, TravelRequest};
use crate::catalog::{TourQuery, ALL_CATEGORIES, CATEGORIES, DEFAULT_MAX_PRICE, DEFAULT_MIN_PRICE};
use crate::config::{Config, ConfigError, Settings, TokenStorage, API_URL_ENV};
use crate::error::{AppError, Result};
use crate::logging::LogOptions;
use crate::session::Session;

/// Browse and book tours from the terminal.
#[derive(Debug, Parser)]
#[command(name = "tourbook", version, about)]
pub struct Cli {
    /// Override the API base URL for this invocation.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        email: String,
        /// Read from standard input when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in.
    Register {
        username: String,
        email: String,
        /// Read from standard input when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the saved session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Browse the tour catalogue.
    #[command(subcommand)]
    Tours(TourCommand),
    /// Book a tour.
    Book {
        tour_id: i64,
        /// Travel date, e.g. 2026-06-01.
        date: String,
        #[arg(long, default_value_t = 1)]
        participants: u32,
    },
    /// List your bookings.
    Bookings,
    /// Cancel one of your bookings.
    Cancel { booking_id: i64 },
    /// Ask the operator to hold a spot on a tour.
    Request { tour_id: i64 },
    /// List your travel requests.
    Requests,
    /// Inspect or change the configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum TourCommand {
    /// List tours, narrowed locally.
    List(ListArgs),
    /// Popular tours.
    Popular,
    /// Hot deals.
    Hot,
    /// Show one tour in detail.
    Show { id: i64 },
    /// Search tours on the server.
    Search { query: String },
    /// Filter tours on the server.
    Filter(FilterArgs),
    /// List the known categories.
    Categories,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Free text matched against title and description.
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long, default_value = ALL_CATEGORIES)]
    pub category: String,
    #[arg(long, default_value_t = DEFAULT_MIN_PRICE)]
    pub min_price: f64,
    #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
    pub max_price: f64,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub min_price: Option<f64>,
    #[arg(long)]
    pub max_price: Option<f64>,
    #[arg(long)]
    pub min_duration: Option<u32>,
    #[arg(long)]
    pub max_duration: Option<u32>,
    /// Only hot deals.
    #[arg(long)]
    pub hot: bool,
}

impl From<FilterArgs> for TourFilter {
    fn from(args: FilterArgs) -> Self {
        TourFilter {
            location: args.location,
            category: args.category,
            min_price: args.min_price,
            max_price: args.max_price,
            min_duration: args.min_duration,
            max_duration: args.max_duration,
            hot: args.hot.then_some(true),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Save a new API base URL.
    SetUrl { url: String },
    /// Choose where the session token is kept.
    SetStorage {
        #[arg(value_parser = ["keyring", "file"])]
        storage: String,
    },
}

/// Navigator for the terminal: the login "screen" is a hint to sign in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        if path == LOGIN_PATH {
            eprintln!("Your session has ended. Run 'tourbook login' to sign in again.");
        } else {
            debug!(path, "Ignoring navigation");
        }
    }
}

/// Open the token store selected in the settings.
pub fn open_token_store(storage: TokenStorage) -> Result<Arc<dyn TokenStore>> {
    Ok(match storage {
        TokenStorage::Keyring => Arc::new(KeyringStore::new()),
        TokenStorage::File => Arc::new(FileStore::in_data_dir()?),
    })
}

/// Run one command to completion.
///
/// Ctrl-C cancels whatever request is in flight.
pub async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Command::Config(cmd) => return run_config(cmd, load_for_edit()?),
        other => other,
    };
    let config = Config::load()?;

    let mut settings = config.settings().clone();
    if let Some(url) = cli.api_url {
        settings.api_url = url;
        settings.validate()?;
    }

    let session = connect(&settings)?;

    let scope = RequestScope::new();
    let interrupt = scope.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    dispatch(&session.scoped(scope.token()), command).await
}

/// Build the client and session for `settings`.
pub fn connect(settings: &Settings) -> Result<Session> {
    let tokens = open_token_store(settings.token_storage)?;
    let client = ApiClient::from_settings(settings, tokens)?.with_navigator(Arc::new(TerminalNavigator));
    Ok(Session::init(client)?)
}

async fn dispatch(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            session.login(&email, &password).await?;
            println!("Signed in as {}", email);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            session
                .register(&RegisterData::new(&username, &email, &password))
                .await?;
            println!("Welcome, {}! You are signed in.", username);
        }
        Command::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        Command::Whoami => {
            if !session.is_authenticated() {
                println!("Not signed in");
            } else {
                let user = session.refresh_user().await?;
                println!("{}", user);
                if user.is_admin {
                    println!("role: admin");
                }
            }
        }
        Command::Tours(cmd) => run_tours(session, cmd).await?,
        Command::Book {
            tour_id,
            date,
            participants,
        } => {
            require_session(session)?;
            if participants == 0 {
                return Err(AppError::invalid_input("participants must be at least 1"));
            }
            let booking = session.bookings().create(tour_id, &date, participants).await?;
            println!("Booked:");
            print_booking(&booking);
        }
        Command::Bookings => {
            require_session(session)?;
            let bookings = session.bookings().mine().await?;
            if bookings.is_empty() {
                println!("No bookings yet");
            }
            for booking in &bookings {
                print_booking(booking);
            }
        }
        Command::Cancel { booking_id } => {
            require_session(session)?;
            let booking = session.bookings().cancel(booking_id).await?;
            print_booking(&booking);
        }
        Command::Request { tour_id } => {
            require_session(session)?;
            let request = session.requests().create(tour_id).await?;
            println!("Request sent:");
            println!("{}", format_request_line(&request));
        }
        Command::Requests => {
            require_session(session)?;
            let requests = session.requests().mine().await?;
            if requests.is_empty() {
                println!("No requests yet");
            }
            for request in &requests {
                println!("{}", format_request_line(request));
            }
        }
        Command::Config(_) => {
            return Err(AppError::invalid_input(
                "configuration commands run without a session",
            ))
        }
    }
    Ok(())
}

async fn run_tours(session: &Session, cmd: TourCommand) -> Result<()> {
    let tours = session.tours();
    match cmd {
        TourCommand::List(args) => {
            let all = tours.all().await?;
            let query = TourQuery::default()
                .search(&args.search)
                .category(&args.category)
                .price(args.min_price, args.max_price);
            print_tours(query.apply(&all));
        }
        TourCommand::Popular => print_tours(&tours.popular().await?),
        TourCommand::Hot => print_tours(&tours.hot().await?),
        TourCommand::Show { id } => print_tour_detail(&tours.get(id).await?),
        TourCommand::Search { query } => print_tours(&tours.search(&query).await?),
        TourCommand::Filter(args) => print_tours(&tours.filter(&args.into()).await?),
        TourCommand::Categories => {
            for category in CATEGORIES {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

/// Load the configuration for the `config` commands.
///
/// A broken file is reported but does not stop the commands that fix it.
fn load_for_edit() -> Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e @ (ConfigError::ParseError(_) | ConfigError::ValidationError(_))) => {
            eprintln!("Warning: {}", e);
            Ok(Config::recover()?)
        }
        Err(e) => Err(e.into()),
    }
}

fn run_config(cmd: ConfigCommand, mut config: Config) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let settings = config.settings();
            println!("file:          {}", config.path().display());
            println!("api_url:       {}", settings.api_url);
            if config.api_url_override().is_some() {
                println!("               (from {})", API_URL_ENV);
            }
            match settings.timeout() {
                Some(t) => println!("timeout:       {}s", t.as_secs()),
                None => println!("timeout:       none"),
            }
            println!("token_storage: {:?}", settings.token_storage);
            if let Some(filter) = &settings.log_filter {
                println!("log_filter:    {}", filter);
            }
            if let Ok(dir) = LogOptions::from_settings(settings).log_directory() {
                println!("logs:          {}", dir.display());
            }
        }
        ConfigCommand::SetUrl { url } => {
            config.update(|s| s.api_url = url);
            config.save()?;
            println!("Saved {}", config.path().display());
        }
        ConfigCommand::SetStorage { storage } => {
            let storage = match storage.as_str() {
                "file" => TokenStorage::File,
                _ => TokenStorage::Keyring,
            };
            config.update(|s| s.token_storage = storage);
            config.save()?;
            println!("Saved {}", config.path().display());
        }
    }
    Ok(())
}

fn require_session(session: &Session) -> Result<()> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::invalid_input(
            "You need to sign in first. Run 'tourbook login'.",
        ))
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(AppError::invalid_input("password cannot be empty"));
    }
    Ok(password)
}

fn format_tour_line(tour: &Tour) -> String {
    let mut line = format!(
        "#{:<4} {}  |  {} ₽  |  {} дн.  |  {:.1} ★",
        tour.id, tour.title, tour.price, tour.duration, tour.rating
    );
    if let Some(category) = &tour.category {
        line.push_str(&format!("  |  {}", category));
    }
    if tour.is_hot {
        line.push_str("  |  hot");
    }
    line
}

fn print_tours<'a>(tours: impl IntoIterator<Item = &'a Tour>) {
    let mut count = 0;
    for tour in tours {
        println!("{}", format_tour_line(tour));
        count += 1;
    }
    if count == 0 {
        println!("No tours match");
    }
}

fn print_tour_detail(tour: &Tour) {
    println!("{}", tour.title);
    println!();
    println!("{}", tour.description);
    println!();
    println!("price:    {} ₽", tour.price);
    println!("duration: {} дн.", tour.duration);
    println!("rating:   {:.1} ★", tour.rating);
    if let Some(location) = &tour.location {
        println!("location: {}", location);
    }
    if let Some(max) = tour.max_participants {
        println!("group:    up to {}", max);
    }
    if let Some(spots) = tour.available_spots {
        println!("spots:    {}", spots);
    }
    if !tour.available_dates.is_empty() {
        println!("dates:    {}", tour.available_dates.join(", "));
    }
}

fn format_booking_line(booking: &Booking) -> String {
    format!(
        "booking #{}  tour #{}  {}  x{}  {} ₽  [{}]",
        booking.id,
        booking.tour_id,
        booking.date,
        booking.participants,
        booking.total_price,
        booking.status
    )
}

fn format_request_line(request: &TravelRequest) -> String {
    format!(
        "request #{}  tour #{}  [{}]",
        request.id, request.tour_id, request.status
    )
}

fn print_booking(booking: &Booking) {
    println!("{}", format_booking_line(booking));
}
