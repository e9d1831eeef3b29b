use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rental_calendar::availability::{BookingForm, BookingWorkflow, DayStatus};
use rental_calendar::client::{PropertySource, RentalClient, SearchParams};
use rental_calendar::config::Config;
use rental_calendar::logging::setup_logging;
use rental_calendar::notify::LogNotifier;
use rental_calendar::session::SessionContext;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rental-calendar", version, about = "Manage temporary-rental availability")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List temporary-rental properties
    List,
    /// Show a property's calendar for one month
    Show {
        property: String,
        /// Month to show as YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
        /// Print the ranges as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Reserve a date range
    Reserve(BookingArgs),
    /// Mark a date range as occupied
    Occupy(BookingArgs),
    /// Mark a date range as available
    Free {
        property: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Delete a range by id; bookings revert to available
    DeleteRange { property: String, range_id: String },
    /// Toggle a single day between booked and not booked
    ToggleDay { property: String, date: NaiveDate },
}

#[derive(Args, Debug)]
struct BookingArgs {
    property: String,
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
    #[arg(long)]
    client: String,
    #[arg(long)]
    guests: u32,
    #[arg(long)]
    deposit: Option<f64>,
}

impl BookingArgs {
    fn form(&self) -> BookingForm {
        let form = BookingForm::dates(self.from, self.to).client(self.client.clone(), self.guests);
        match self.deposit {
            Some(deposit) => form.deposit(deposit),
            None => form,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    setup_logging(&config);

    let session = match &config.token {
        Some(token) => SessionContext::with_token(token.clone()),
        None => SessionContext::new(),
    };
    let client = Arc::new(RentalClient::new(&config, session.clone())?);

    if !session.is_authenticated() {
        if let (Some(email), Some(password)) = (&config.email, &config.password) {
            let user = client.login(email, password).await.context("Login failed")?;
            info!("Logged in as {} ({})", user.full_name(), user.role().display_name());
        }
    }

    match cli.command {
        Command::List => list(&client).await,
        Command::Show { property, month, json } => {
            let workflow = open(&client, &session, &property).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&workflow.store().ranges())?);
                return Ok(());
            }
            show(&workflow, month.as_deref())
        }
        Command::Reserve(args) => {
            let workflow = open(&client, &session, &args.property).await?;
            workflow.reserve(&mut args.form()).await?;
            show(&workflow, None)
        }
        Command::Occupy(args) => {
            let workflow = open(&client, &session, &args.property).await?;
            workflow.occupy(&mut args.form()).await?;
            show(&workflow, None)
        }
        Command::Free { property, from, to } => {
            let workflow = open(&client, &session, &property).await?;
            workflow.mark_available(&mut BookingForm::dates(from, to)).await?;
            show(&workflow, None)
        }
        Command::DeleteRange { property, range_id } => {
            let workflow = open(&client, &session, &property).await?;
            let removed = workflow.delete_range(&range_id).await?;
            println!(
                "Deleted {} → {} ({})",
                removed.start_date, removed.end_date, removed.status
            );
            Ok(())
        }
        Command::ToggleDay { property, date } => {
            let workflow = open(&client, &session, &property).await?;
            let flags = workflow.toggle_day(date).await?;
            println!("{date}: {:?}", flags.status());
            Ok(())
        }
    }
}

async fn list(client: &RentalClient) -> Result<()> {
    let properties = client.search(&SearchParams::temporary_rentals()).await?;

    for (i, property) in properties.iter().enumerate() {
        println!(
            "{}. {} ({} {}/noche)",
            i + 1,
            property.title,
            property.price_per_night,
            property.currency
        );
        if let Some(address) = &property.address {
            println!("   {address}");
        }
        println!(
            "   Capacidad: {} · Estadía mínima: {} noches · Check-in {} / Check-out {}",
            property.capacity, property.min_stay_nights, property.check_in_time, property.check_out_time
        );
        println!("   Estado: {}", property.status.label());
        println!("   ID: {}", property.id);
        println!();
    }
    info!("Listed {} properties", properties.len());
    Ok(())
}

async fn open(
    client: &Arc<RentalClient>,
    session: &SessionContext,
    property_id: &str,
) -> Result<BookingWorkflow<LogNotifier>> {
    let property = client
        .property(property_id)
        .await
        .with_context(|| format!("Failed to fetch property {property_id}"))?;

    let mut workflow = BookingWorkflow::new(client.clone(), session.clone(), LogNotifier);
    workflow.open(property).await?;
    Ok(workflow)
}

fn show(workflow: &BookingWorkflow<LogNotifier>, month: Option<&str>) -> Result<()> {
    let (year, month) = match month {
        Some(raw) => {
            let first = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
                .with_context(|| format!("Invalid month: {raw}"))?;
            (first.year(), first.month())
        }
        None => {
            let today = Utc::now().date_naive();
            (today.year(), today.month())
        }
    };

    let store = workflow.store();
    if let Some(property) = workflow.property() {
        println!("{} [{}]", property.title, store.status().label());
    }

    let days = store.month(year, month).context("Invalid month")?;
    println!("{year}-{month:02}");
    println!(" Mo Tu We Th Fr Sa Su");
    if let Some((first, _)) = days.first() {
        print!("{}", "   ".repeat(first.weekday().num_days_from_monday() as usize));
    }
    for (day, status) in &days {
        let mark = match status {
            DayStatus::Unset => ' ',
            DayStatus::Available => '+',
            DayStatus::Reserved => 'R',
            DayStatus::Occupied => 'X',
        };
        print!("{:>2}{}", day.day(), mark);
        if day.weekday().num_days_from_monday() == 6 {
            println!();
        }
    }
    println!();
    println!("(+ disponible, R reservado, X ocupado)");

    let bookings = store.bookings();
    if !bookings.is_empty() {
        println!();
        for booking in bookings {
            let client = if booking.client_name.is_empty() {
                "Sin nombre"
            } else {
                booking.client_name.as_str()
            };
            println!(
                "  {} → {} ({} días)  {} ({}, {} huéspedes, seña {})  id={}",
                booking.start_date,
                booking.end_date,
                booking.len_days(),
                client,
                booking.status,
                booking.guests,
                booking.deposit,
                booking.id
            );
        }
    }
    Ok(())
}
