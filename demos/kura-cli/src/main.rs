//! Command-line client for the Kura portal.
//!
//! Every invocation restores the session from the token file, runs one
//! command and prints whatever notices the session raised along the way.
//!
//! ```text
//! kura login 12345678901 s3cret
//! kura list --district Merkez --order sira-no
//! kura open /admin
//! kura logout
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use kura::prelude::*;
use kura::protocol::Notification;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "kura", about = "Aile hekimliği kura portalı istemcisi")]
struct Cli {
    /// Backend origin. Falls back to KURA_API_URL, then to the loopback default.
    #[arg(long, env = "KURA_API_URL")]
    api_url: Option<String>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with a national id, phone number or e-mail.
    Login { identifier: String, password: String },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    Logout,
    /// Show the signed-in profile, re-fetched from the server.
    Profile,
    /// Change profile fields; unset flags are left alone.
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        university: Option<String>,
    },
    /// Show the session phase.
    Status,
    /// Run the route guard for a path.
    Open { path: String },
    /// The lottery list.
    List {
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_enum, default_value_t = Order::HizmetPuani)]
        order: Order,
    },
    Districts,
    EmptyPositions {
        #[arg(long)]
        district: Option<String>,
    },
    Rank,
    Stats,
    Preferences,
    /// Decide on a lottery row.
    Prefer {
        kura_id: String,
        #[arg(value_enum)]
        decision: Decision,
    },
    /// Apply for an empty position.
    Apply { position_id: String },
    /// Submit the lottery application form, pre-filled from the profile.
    /// Requires a verified phone.
    Submit {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        birth_date: Option<String>,
        #[arg(long)]
        birth_place: Option<String>,
        #[arg(long)]
        registry_number: Option<String>,
        #[arg(long)]
        university: Option<String>,
        #[arg(long)]
        certificate: Option<String>,
        /// Preferred districts, comma separated.
        #[arg(long, value_delimiter = ',')]
        districts: Vec<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Submitted application forms, newest first.
    Applications,
    Notifications,
    MarkRead { id: String },
    Health,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Order {
    HizmetPuani,
    SiraNo,
    Ad,
}

impl From<Order> for KuraOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::HizmetPuani => KuraOrder::ServicePoints,
            Order::SiraNo => KuraOrder::RankNumber,
            Order::Ad => KuraOrder::Name,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Decision {
    Kabul,
    Red,
    Pas,
}

impl From<Decision> for PreferenceStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Kabul => PreferenceStatus::Accept,
            Decision::Red => PreferenceStatus::Reject,
            Decision::Pas => PreferenceStatus::Pass,
        }
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A terminal has no views; navigation is reported instead.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        eprintln!("-> {path}");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let mut config = PortalConfig::from_env();
    if let Some(url) = cli.api_url {
        config.client = config.client.with_api_url(url);
    }

    let portal = match Portal::from_config(&config, TerminalNavigator) {
        Ok(portal) => portal,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    let mut notices = portal.session().subscribe();
    portal.start().await;

    let result = run(&portal, cli.command).await;
    print_notices(&mut notices);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(
    portal: &Portal<PortalTokenStore, TerminalNavigator>,
    command: Command,
) -> Result<(), KuraError> {
    let session = portal.session();
    let api = portal.api();

    match command {
        Command::Login { identifier, password } => {
            let user = session.login(&identifier, &password).await?;
            print_json(&user)?;
        }
        Command::Register {
            national_id,
            phone,
            email,
            password,
            first_name,
            last_name,
        } => {
            let request = RegisterRequest {
                national_id,
                phone,
                email,
                password,
                first_name,
                last_name,
            };
            let user = session.register(&request).await?;
            print_json(&user)?;
        }
        Command::Logout => session.logout().await,
        Command::Profile => {
            let user = session.refresh_profile().await?.ok_or(KuraError::SignedOut)?;
            print_json(&user)?;
        }
        Command::UpdateProfile {
            first_name,
            last_name,
            title,
            university,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                title,
                university,
                ..ProfileUpdate::default()
            };
            let user = session.update_profile(&update).await?;
            print_json(&user)?;
        }
        Command::Status => {
            let snapshot = session.snapshot().await;
            println!("{}", session.phase().await);
            if let Some(user) = snapshot.user {
                let name = user.display_name().unwrap_or_else(|| user.id.to_string());
                println!("{name} ({})", user.role);
            }
        }
        Command::Open { path } => {
            let (route, decision) = portal.open(&path).await;
            println!("{route}: {decision:?}");
        }
        Command::List { district, title, order } => {
            let filter = KuraFilter { district, title, order: order.into() };
            print_json(&api.kura_list(&filter).await?)?;
        }
        Command::Districts => {
            for district in api.districts().await? {
                println!("{district}");
            }
        }
        Command::EmptyPositions { district } => {
            print_json(&api.empty_positions(district.as_deref()).await?)?;
        }
        Command::Rank => match api.my_rank().await? {
            Some(rank) => println!(
                "{}. sıra, {:.2} puan, {}",
                rank.rank,
                rank.service_points,
                rank.district.as_deref().unwrap_or("-")
            ),
            None => println!("Kura kaydı bulunamadı"),
        },
        Command::Stats => {
            let stats = api.statistics().await?;
            println!("pozisyon: {}", stats.total_positions);
            println!("boş: {}", stats.empty_positions);
            println!("ilçe: {}", stats.district_count);
            match stats.fill_rate_percent() {
                Some(rate) => println!("doluluk: %{rate:.2}"),
                None => println!("doluluk: -"),
            }
        }
        Command::Preferences => print_json(&api.my_preferences().await?)?,
        Command::Prefer { kura_id, decision } => {
            let ack = api.submit_preference(&kura_id, decision.into()).await?;
            print_ack(ack.success, ack.message.as_deref());
        }
        Command::Apply { position_id } => {
            let ack = api.apply_empty_position(&position_id).await?;
            print_ack(ack.success, ack.message.as_deref());
        }
        Command::Submit {
            title,
            birth_date,
            birth_place,
            registry_number,
            university,
            certificate,
            districts,
            note,
        } => {
            let user = session.snapshot().await.user.ok_or(KuraError::SignedOut)?;
            let mut form = ApplicationFormRequest::from_user(&user);
            if let Some(title) = title {
                form.title = title;
            }
            form.birth_date = birth_date.or(form.birth_date);
            form.birth_place = birth_place.or(form.birth_place);
            form.registry_number = registry_number.or(form.registry_number);
            form.university = university.or(form.university);
            form.orientation_certificate = certificate.or(form.orientation_certificate);
            form.preferred_districts = districts
                .into_iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
            form.note = note;

            let missing = form.missing_fields();
            if !missing.is_empty() {
                eprintln!("eksik alanlar: {}", missing.join(", "));
            }
            let response = portal.submit_application(&form).await?;
            print_ack(response.success, response.pdf_path.as_deref());
        }
        Command::Applications => {
            for application in api.my_applications().await? {
                println!(
                    "[{}] {} {}",
                    application.id,
                    application.status,
                    application.pdf_path.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Notifications => {
            for notification in api.notifications().await? {
                print_notification(&notification);
            }
        }
        Command::MarkRead { id } => {
            let ack = api.mark_notification_read(&RecordId::from(id.as_str())).await?;
            print_ack(ack.success, ack.message.as_deref());
        }
        Command::Health => {
            let healthy = api.health().await;
            println!("{}", if healthy { "ok" } else { "unreachable" });
            if !healthy {
                return Err(TransportError::Status { status: 503, message: None }.into());
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_json(value: &impl serde::Serialize) -> Result<(), KuraError> {
    let text = serde_json::to_string_pretty(value).map_err(ProtocolError::Encode)?;
    println!("{text}");
    Ok(())
}

fn print_ack(success: bool, message: Option<&str>) {
    match (success, message) {
        (_, Some(message)) => println!("{message}"),
        (true, None) => println!("ok"),
        (false, None) => println!("failed"),
    }
}

fn print_notification(notification: &Notification) {
    let marker = if notification.read { ' ' } else { '*' };
    println!("{marker} [{}] {}: {}", notification.id, notification.title, notification.message);
}

fn print_notices(rx: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        eprintln!("{notice}");
    }
}
