use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use client_core::{
    categorize::Bucket,
    config::{load_settings_from, normalize_base_url},
    documents::{self, DocumentKind, DocumentUpload},
    forms::{LoginForm, NewDependentForm, PaymentCard, RegistrationForm},
    load_settings, BackendClient, BookingController, ConfirmationSnapshot, ControllerError,
    SessionBoard, SessionContext,
};
use shared::{
    domain::{CaregiverId, DependentId, Role, SessionId, SessionTransition, TransportId},
    protocol::SessionRecord,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "wecare", about = "WeCare childcare booking client")]
struct Cli {
    /// Settings file to read instead of `wecare.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured API base URL.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

impl Credentials {
    fn form(&self) -> LoginForm {
        LoginForm {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a parent, nanny or driver account.
    Register(RegisterArgs),
    /// List sessions grouped into upcoming, active and closed.
    Sessions {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Register a child under the signed-in parent.
    AddChild {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        age: String,
    },
    /// Book a child-sitting session.
    Book(BookArgs),
    /// Mark an assigned session as started.
    Activate {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        session: i64,
    },
    /// Mark an assigned session as finished.
    Complete {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        session: i64,
    },
    /// Upload the four background-check documents.
    Upload(UploadArgs),
    /// Check card details before paying for a session.
    Pay {
        #[arg(long)]
        card_number: String,
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        cvv: String,
    },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "")]
    phone1: String,
    #[arg(long, default_value = "")]
    phone2: String,
    #[arg(long, default_value = "")]
    house_number: String,
    #[arg(long, default_value = "")]
    street_name: String,
    #[arg(long, default_value = "")]
    postal_code: String,
    #[arg(long, default_value = "parent")]
    role: Role,
}

#[derive(Args, Debug)]
struct BookArgs {
    #[command(flatten)]
    credentials: Credentials,
    /// Child id; repeat for several children.
    #[arg(long = "child", required = true)]
    children: Vec<i64>,
    /// Session date as YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,
    /// Start time as HH:MM.
    #[arg(long, value_parser = parse_time)]
    start: NaiveTime,
    /// End time as HH:MM.
    #[arg(long, value_parser = parse_time)]
    end: NaiveTime,
    #[arg(long)]
    nanny: i64,
    #[arg(long)]
    driver: Option<i64>,
    #[arg(long)]
    amount: String,
    /// Submit without asking for confirmation.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct UploadArgs {
    #[command(flatten)]
    credentials: Credentials,
    /// Document as KIND=PATH, e.g. `police-clearance=scan.pdf`. Repeat for
    /// reference, police clearance, driver test and drivers license.
    #[arg(long = "document", value_parser = parse_document, required = true)]
    documents: Vec<(DocumentKind, PathBuf)>,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got '{raw}': {e}"))
}

fn parse_document(raw: &str) -> Result<(DocumentKind, PathBuf), String> {
    let (kind, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=PATH, got '{raw}'"))?;
    let kind = DocumentKind::parse(kind).ok_or_else(|| {
        let known: Vec<_> = DocumentKind::REQUIRED.iter().map(|k| k.label()).collect();
        format!("unknown document kind '{kind}', expected one of: {}", known.join(", "))
    })?;
    if path.trim().is_empty() {
        return Err(format!("missing file path for {}", kind.label()));
    }
    Ok((kind, PathBuf::from(path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,client_core=info".into()),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = match cli.config.as_deref() {
        Some(path) => load_settings_from(path)?,
        None => load_settings()?,
    };
    if let Some(url) = cli.api_base_url.as_deref() {
        settings.api_base_url = normalize_base_url(url)?;
    }
    info!(api_base_url = %settings.api_base_url, "cli: using backend");
    let client = BackendClient::new(&settings)?;

    match cli.command {
        Command::Register(args) => register(&client, args).await,
        Command::Sessions { credentials } => list_sessions(&client, &credentials).await,
        Command::AddChild {
            credentials,
            name,
            surname,
            age,
        } => {
            let context = sign_in(&client, &credentials).await?;
            let form = NewDependentForm {
                first_name: name,
                surname,
                age,
            };
            let child = client.create_dependent(&context, &form).await?;
            println!("Added {} (id {})", child.first_name, child.id);
            Ok(())
        }
        Command::Book(args) => book(client, args).await,
        Command::Activate {
            credentials,
            session,
        } => transition(&client, &credentials, session, SessionTransition::Activate).await,
        Command::Complete {
            credentials,
            session,
        } => transition(&client, &credentials, session, SessionTransition::Complete).await,
        Command::Upload(args) => upload(&client, args).await,
        Command::Pay {
            card_number,
            expiry,
            cvv,
        } => {
            let card = PaymentCard {
                card_number,
                expiry,
                cvv,
            };
            card.validate()?;
            println!("Card {} accepted.", card.masked());
            Ok(())
        }
    }
}

async fn sign_in(client: &BackendClient, credentials: &Credentials) -> Result<SessionContext> {
    let context = client.login(&credentials.form()).await?;
    println!("{}", context.welcome_message());
    Ok(context)
}

async fn register(client: &BackendClient, args: RegisterArgs) -> Result<()> {
    let form = RegistrationForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: args.password,
        phone1: args.phone1,
        phone2: args.phone2,
        house_number: args.house_number,
        street_name: args.street_name,
        postal_code: args.postal_code,
        role: args.role,
    };
    client.register(&form).await?;
    println!("Registration successful. You can now log in.");
    Ok(())
}

async fn list_sessions(client: &BackendClient, credentials: &Credentials) -> Result<()> {
    let context = sign_in(client, credentials).await?;
    let mut board = SessionBoard::new();
    let ticket = board.begin_refresh();
    let sessions = client.list_sessions(&context).await?;
    board.apply(ticket, sessions);

    let buckets = board.buckets();
    if buckets.is_empty() {
        println!("No sessions yet.");
    }
    for bucket in [Bucket::Upcoming, Bucket::Active, Bucket::Closed] {
        let sessions = buckets.bucket(bucket);
        if sessions.is_empty() {
            continue;
        }
        println!("{} ({})", bucket.label(), sessions.len());
        for session in sessions {
            println!("  {}", session_line(session));
        }
    }
    if buckets.unclassified > 0 {
        warn!(
            count = buckets.unclassified,
            "cli: sessions with unrecognised status were not listed"
        );
    }
    Ok(())
}

fn session_line(session: &SessionRecord) -> String {
    let time = |t: Option<NaiveTime>| {
        t.map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    };
    let mut line = format!(
        "#{} {} {} - {} [{}]",
        session.id,
        session.date,
        time(session.start_time),
        time(session.end_time),
        session.status.as_str()
    );
    if !session.participants.is_empty() {
        line.push_str(&format!(" {}", session.participants.join(", ")));
    }
    line
}

async fn transition(
    client: &BackendClient,
    credentials: &Credentials,
    session: i64,
    transition: SessionTransition,
) -> Result<()> {
    let context = sign_in(client, credentials).await?;
    client
        .transition_session(&context, SessionId(session), transition)
        .await?;
    println!("Session #{session}: {} accepted.", transition.path_segment());
    Ok(())
}

async fn upload(client: &BackendClient, args: UploadArgs) -> Result<()> {
    let context = sign_in(client, &args.credentials).await?;
    let mut uploads = Vec::with_capacity(args.documents.len());
    for (kind, path) in &args.documents {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        uploads.push(DocumentUpload::new(*kind, file_name(path), bytes));
    }
    let check = documents::submit_background_check(client, &context, &uploads).await?;
    println!("All documents uploaded (background check #{check}).");
    println!("They will be reviewed by an administrator.");
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

async fn book(client: BackendClient, args: BookArgs) -> Result<()> {
    let context = sign_in(&client, &args.credentials).await?;
    let mut controller = BookingController::open(Arc::new(client), context).await?;
    if controller.reference().caregivers_unavailable {
        warn!("cli: nanny list unavailable, names will show as unknown");
    }
    if controller.reference().transport_unavailable {
        warn!("cli: driver list unavailable, names will show as unknown");
    }

    let draft = controller.edit()?;
    for child in &args.children {
        draft.toggle_dependent(DependentId(*child));
    }
    draft.date = Some(args.date);
    draft.start_time = Some(args.start);
    draft.end_time = Some(args.end);
    draft.caregiver_id = Some(CaregiverId(args.nanny));
    draft.transport_id = args.driver.map(TransportId);
    draft.payment_amount = args.amount.clone();

    let snapshot = controller.request_confirmation()?;
    print_snapshot(&snapshot);
    if !args.yes && !ask("Confirm booking?")? {
        controller.cancel()?;
        println!("Booking not submitted.");
        return Ok(());
    }

    let mut outcome = controller.confirm().await;
    loop {
        match outcome {
            Ok(confirmation) => {
                println!(
                    "Session #{} booked with {}.",
                    confirmation.session_id, confirmation.caregiver_name
                );
                if let Some(driver) = confirmation.transport_name {
                    println!("Transport: {driver}");
                }
                return Ok(());
            }
            Err(ControllerError::Submission(err)) if err.is_retryable() => {
                eprintln!("Booking failed: {err}");
                if !ask("Retry the same booking?")? {
                    bail!("booking was not submitted");
                }
                outcome = controller.retry().await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn print_snapshot(snapshot: &ConfirmationSnapshot) {
    println!("Booking summary");
    println!("  Date:      {}", snapshot.date.format("%Y-%m-%d"));
    println!("  Time:      {}", snapshot.time_range());
    println!("  Children:  {}", snapshot.dependents_line());
    println!("  Nanny:     {}", snapshot.caregiver_name);
    println!("  Transport: {}", snapshot.transport_line());
    println!("  Amount:    {}", snapshot.amount);
}

fn ask(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_argument_accepts_loose_kind_names() {
        let (kind, path) = parse_document("police-clearance=scans/clearance.pdf").expect("parsed");
        assert_eq!(kind, DocumentKind::PoliceClearance);
        assert_eq!(path, PathBuf::from("scans/clearance.pdf"));
        assert!(parse_document("passport=id.pdf").is_err());
        assert!(parse_document("reference").is_err());
        assert!(parse_document("reference=").is_err());
    }
}
