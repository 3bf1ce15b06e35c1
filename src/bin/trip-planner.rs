use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trip_planner::guard::{GuardDecision, Route};
use trip_planner::model::Itinerary;
use trip_planner::notify::Outcome;
use trip_planner::session::{Identity, RegisterForm};
use trip_planner::views::{account, ActivityField, DashboardView, DetailView, Field, Filter, FormController};
use trip_planner::TripPlanner;
use trip_planner_upload::ImageFile;

#[derive(Parser, Debug)]
#[clap(name = "trip-planner", version)]
#[clap(about = "Plan trips: itineraries, activities and cover images", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Where the signed-in session is kept. Overrides TRIP_PLANNER_SESSION_FILE.
    #[clap(long)]
    session_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account
    Register {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
        #[clap(long)]
        confirm_password: String,
    },
    /// Sign in
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List itineraries
    List {
        /// Matches title, destination or any activity title
        #[clap(long, default_value = "")]
        search: String,
        /// all, favorites, or a trip type (adventure, leisure, work, family, other)
        #[clap(long, default_value = "all")]
        filter: String,
    },
    /// Show one itinerary
    Show { id: String },
    /// Create an itinerary
    Create(ItineraryArgs),
    /// Open an itinerary in the form (submitting creates a new one)
    Edit {
        id: String,
        #[clap(flatten)]
        fields: ItineraryArgs,
    },
    /// Toggle the favorite flag
    Favorite { id: String },
    /// Delete an itinerary
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ItineraryArgs {
    #[clap(long, default_value = "")]
    title: String,
    #[clap(long, default_value = "")]
    destination: String,
    /// YYYY-MM-DD
    #[clap(long, default_value = "")]
    start: String,
    /// YYYY-MM-DD
    #[clap(long, default_value = "")]
    end: String,
    #[clap(long, default_value = "leisure")]
    trip_type: String,
    #[clap(long, default_value = "")]
    description: String,
    /// "title;date;location;notes", repeatable
    #[clap(long = "activity")]
    activities: Vec<String>,
    /// Local image uploaded as the cover
    #[clap(long)]
    cover: Option<PathBuf>,
}

impl Commands {
    fn route(&self) -> Route {
        match self {
            Commands::Register { .. } => Route::Register,
            Commands::Login { .. } => Route::Login,
            Commands::Create(_) => Route::CreateItinerary,
            Commands::Edit { id, .. } => Route::EditItinerary(id.clone()),
            Commands::Show { id } => Route::ItineraryDetail(id.clone()),
            Commands::Logout
            | Commands::Whoami
            | Commands::List { .. }
            | Commands::Favorite { .. }
            | Commands::Delete { .. } => Route::Dashboard,
        }
    }
}

fn report(outcome: &Outcome) {
    if let Some(notification) = &outcome.notification {
        if outcome.is_error() {
            eprintln!("{}", notification);
        } else {
            println!("{}", notification);
        }
    }
    if let Some(route) = &outcome.redirect {
        println!("-> {}", route);
    }
}

fn finish(outcome: Outcome) -> anyhow::Result<()> {
    report(&outcome);
    if outcome.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_itinerary(itinerary: &Itinerary) {
    let star = if itinerary.is_favorite { " *" } else { "" };
    println!("{}{} [{}]", itinerary.title, star, itinerary.id);
    println!("  {} | {} | {}", itinerary.destination, itinerary.date_range(), itinerary.trip_type);
    if !itinerary.description.is_empty() {
        println!("  {}", itinerary.description);
    }
    if let Some(url) = itinerary.cover_image_url() {
        println!("  cover: {}", url);
    }
    for (position, activity) in itinerary.activities.iter().enumerate() {
        let mut line = format!("  {}. {}", position + 1, activity.display_title());
        if let Some(date) = activity.date {
            line.push_str(&format!(" ({})", date));
        }
        if let Some(location) = &activity.location {
            line.push_str(&format!(" @ {}", location));
        }
        println!("{}", line);
        if let Some(notes) = &activity.notes {
            println!("     {}", notes);
        }
    }
}

fn confirm_delete(itinerary: &Itinerary) -> bool {
    print!("Delete this itinerary? \"{}\" [y/N] ", itinerary.title);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

async fn fill_form(
    planner: &TripPlanner,
    form: &mut FormController,
    args: ItineraryArgs,
) -> anyhow::Result<Option<Outcome>> {
    let draft = form.draft_mut();
    draft.set_field(Field::Title, args.title);
    draft.set_field(Field::Destination, args.destination);
    draft.set_field(Field::StartDate, args.start);
    draft.set_field(Field::EndDate, args.end);
    draft.set_field(Field::TripType, args.trip_type);
    draft.set_field(Field::Description, args.description);

    for (index, packed) in args.activities.iter().enumerate() {
        if index > 0 {
            draft.add_activity();
        }
        let fields = [
            ActivityField::Title,
            ActivityField::Date,
            ActivityField::Location,
            ActivityField::Notes,
        ];
        for (field, value) in fields.into_iter().zip(packed.splitn(4, ';')) {
            draft.set_activity_field(index, field, value.trim())?;
        }
    }

    if let Some(path) = args.cover {
        let file = ImageFile::from_path(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let outcome = form.upload_cover(planner.uploader()?.as_ref(), file).await;
        report(&outcome);
        if outcome.is_error() {
            return Ok(Some(outcome));
        }
    }
    Ok(None)
}

async fn signed_in(planner: &TripPlanner, route: Route) -> anyhow::Result<Identity> {
    match planner.navigate(route).await {
        GuardDecision::Render(_) => Ok(planner.identity()?),
        GuardDecision::Redirect(target) => {
            bail!("not signed in, run `trip-planner login` first ({})", target)
        }
        GuardDecision::Loading => bail!("session is still loading"),
    }
}

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = trip_planner::config::PlannerConfig::from_env()?;
    if let Some(path) = cli.session_file {
        config = config.with_session_file(path);
    }
    let planner = TripPlanner::new(config)?;
    let route = cli.command.route();

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            planner.navigate(route).await;
            let form = RegisterForm {
                name,
                email,
                password,
                confirm_password,
            };
            finish(account::register(planner.session(), planner.store().as_ref(), &form).await)
        }
        Commands::Login { email, password } => {
            planner.navigate(route).await;
            finish(account::login(planner.session(), &email, &password).await)
        }
        Commands::Logout => {
            signed_in(&planner, route).await?;
            finish(account::logout(planner.session()).await)
        }
        Commands::Whoami => {
            let identity = signed_in(&planner, route).await?;
            println!("{} ({})", identity.label(), identity.uid);
            Ok(())
        }
        Commands::List { search, filter } => {
            let owner = signed_in(&planner, route).await?;
            let filter: Filter = filter.parse()?;
            let mut dashboard = DashboardView::new(planner.repository(), owner);
            let outcome = dashboard.load().await;
            if outcome.is_error() {
                return finish(outcome);
            }
            dashboard.set_search(search);
            dashboard.set_filter(filter);

            if let Some(message) = dashboard.empty_message() {
                println!("{}", message);
            }
            for card in dashboard.cards() {
                let star = if card.is_favorite { " *" } else { "" };
                println!("{}{} [{}]", card.title, star, card.id);
                println!("  {} | {} | {}", card.destination, card.dates, card.trip_type);
                for title in &card.activities {
                    println!("  - {}", title);
                }
                if let Some(more) = card.more_label() {
                    println!("  {}", more);
                }
            }
            Ok(())
        }
        Commands::Show { id } => {
            let owner = signed_in(&planner, route).await?;
            match DetailView::open(planner.repository(), owner, &id).await {
                Ok(view) => {
                    print_itinerary(view.itinerary());
                    Ok(())
                }
                Err(outcome) => finish(outcome),
            }
        }
        Commands::Create(args) => {
            let owner = signed_in(&planner, route).await?;
            let mut form = FormController::new();
            if let Some(failed) = fill_form(&planner, &mut form, args).await? {
                return finish(failed);
            }
            finish(form.submit(&owner, &planner.repository()).await)
        }
        Commands::Edit { id, fields } => {
            let owner = signed_in(&planner, route).await?;
            let mut form = FormController::for_edit(&id);
            if let Some(failed) = fill_form(&planner, &mut form, fields).await? {
                return finish(failed);
            }
            finish(form.submit(&owner, &planner.repository()).await)
        }
        Commands::Favorite { id } => {
            let owner = signed_in(&planner, route).await?;
            let mut dashboard = DashboardView::new(planner.repository(), owner);
            let outcome = dashboard.load().await;
            if outcome.is_error() {
                return finish(outcome);
            }
            finish(dashboard.toggle_favorite(&id).await)
        }
        Commands::Delete { id, yes } => {
            let owner = signed_in(&planner, route).await?;
            let mut dashboard = DashboardView::new(planner.repository(), owner);
            let outcome = dashboard.load().await;
            if outcome.is_error() {
                return finish(outcome);
            }
            finish(dashboard.delete(&id, |it| yes || confirm_delete(it)).await)
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
