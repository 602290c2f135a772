use anyhow::{Context, Result, bail};
use brew_core::{
    BrewTimeline, BrewhouseConfig, CalculatedRecipe, IbuMethod, Recipe, UnitSystem, display_duration,
    parse_duration,
};
use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// IBU method flag mirrors brew-core (derive for Clap).
#[derive(Copy, Clone, Debug, ValueEnum)]
enum IbuFlag {
    Tinseth,
    Rager,
}

impl From<IbuFlag> for IbuMethod {
    fn from(m: IbuFlag) -> Self {
        match m {
            IbuFlag::Tinseth => IbuMethod::Tinseth,
            IbuFlag::Rager => IbuMethod::Rager,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "brew-cli",
    about = "Calculate, scale and schedule homebrew beer recipes.",
    version
)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
struct RecipeArgs {
    /// Recipe JSON file
    recipe: PathBuf,

    /// Override the recipe's bitterness formula
    #[arg(long, value_enum)]
    ibu_method: Option<IbuFlag>,

    /// Save the effective recipe (after overrides) to a JSON file
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show gravity, colour, bitterness, alcohol and cost
    Calc {
        #[command(flatten)]
        common: RecipeArgs,

        /// Print the metrics as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the brew-day and fermentation schedule
    Timeline {
        #[command(flatten)]
        common: RecipeArgs,

        /// Use pounds, gallons and °F in the instructions
        #[arg(long)]
        imperial: bool,

        /// Start time HH:MM (optional); prints wall-clock times when set
        #[arg(long)]
        start: Option<String>,

        /// Primary fermentation, e.g. "2w" or "10d" (bare numbers are days)
        #[arg(long)]
        primary: Option<String>,

        /// Secondary fermentation, e.g. "1w"
        #[arg(long)]
        secondary: Option<String>,

        /// Bottle conditioning, e.g. "3w"
        #[arg(long)]
        aging: Option<String>,

        /// Brewhouse profile JSON (room temperature, burner energy, mash heat loss)
        #[arg(long)]
        brewhouse: Option<PathBuf>,
    },
    /// Rescale to a new batch and boil size, keeping bitterness constant
    Scale {
        #[command(flatten)]
        common: RecipeArgs,

        /// New batch size in liters
        #[arg(long)]
        batch: f64,

        /// New boil size in liters
        #[arg(long)]
        boil: f64,

        /// Write the scaled recipe here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score how complete the recipe is
    Grade {
        #[command(flatten)]
        common: RecipeArgs,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_recipe(common: &RecipeArgs) -> Result<Recipe> {
    let txt = fs::read_to_string(&common.recipe)
        .with_context(|| format!("Failed to read recipe: {}", common.recipe.display()))?;
    let mut recipe =
        Recipe::from_json(&txt).with_context(|| format!("Invalid recipe JSON: {}", common.recipe.display()))?;
    if let Some(method) = common.ibu_method {
        recipe.ibu_method = method.into();
    }
    debug!(name = %recipe.name, path = %common.recipe.display(), "loaded recipe");
    Ok(recipe)
}

fn write_recipe(recipe: &Recipe, path: &Path) -> Result<()> {
    fs::write(path, recipe.to_json_pretty()?).with_context(|| format!("Failed to save recipe: {}", path.display()))
}

fn save_if_requested(recipe: &Recipe, common: &RecipeArgs) -> Result<()> {
    if let Some(path) = &common.save {
        write_recipe(recipe, path)?;
        eprintln!("Recipe saved to {}", path.display());
    }
    Ok(())
}

/// Days from a duration flag; "2w 3d" style or a bare number of days.
fn parse_days(value: &str) -> Result<f64> {
    let days = match value.trim().parse::<f64>() {
        Ok(d) => d,
        Err(_) => parse_duration(value) / 1440.0,
    };
    if days < 0.0 || !days.is_finite() {
        bail!("Invalid duration '{value}'");
    }
    Ok(days)
}

fn fmt_kg(kg: f64) -> String {
    if kg < 1.0 {
        format!("{:.0} g", kg * 1000.0)
    } else {
        format!("{kg:.2} kg")
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::new(n).add_attribute(Attribute::Bold)).collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_metrics(calc: &CalculatedRecipe<'_>) {
    let recipe = calc.recipe();
    let m = calc.metrics();

    let mut table = new_table();
    table.set_header(header(&["Metric", "Value", "Notes"]));
    table.add_row(vec![
        Cell::new("Original gravity"),
        Cell::new(format!("{:.3}", m.og)),
        Cell::new(format!("{:.1} °P", m.og_plato)),
    ]);
    table.add_row(vec![
        Cell::new("Final gravity"),
        Cell::new(format!("{:.3}", m.fg)),
        Cell::new(format!("{:.1} °P", m.fg_plato)),
    ]);
    table.add_row(vec![
        Cell::new("Colour"),
        Cell::new(format!("{:.1} SRM", m.color)),
        Cell::new(m.color_name()),
    ]);
    table.add_row(vec![
        Cell::new("Bitterness"),
        Cell::new(format!("{:.1} IBU", m.ibu)),
        Cell::new(format!("{} | BU:GU {:.2}", recipe.ibu_method, m.bu_to_gu)),
    ]);
    table.add_row(vec![
        Cell::new("Alcohol"),
        Cell::new(format!("{:.1}% ABV", m.abv)),
        Cell::new(format!("{:.1}% ABW", m.abw)),
    ]);
    table.add_row(vec![
        Cell::new("Calories"),
        Cell::new(format!("{:.0}", m.calories)),
        Cell::new(format!("per {:.0} ml serving", recipe.serving_size * 1000.0)),
    ]);
    table.add_row(vec![
        Cell::new("Priming"),
        Cell::new(fmt_kg(m.priming_corn_sugar)),
        Cell::new(format!(
            "corn sugar | or {} table sugar, {} honey, {} DME",
            fmt_kg(m.priming_sugar),
            fmt_kg(m.priming_honey),
            fmt_kg(m.priming_dme)
        )),
    ]);
    table.add_row(vec![
        Cell::new("Price"),
        Cell::new(format!("{:.2}", m.price)),
        Cell::new(format!("about {} bottles", recipe.bottle_count())),
    ]);

    println!("\n=== {} ===", recipe.name);
    println!("{table}");
}

fn parse_start(start: Option<&str>) -> Result<Option<NaiveDateTime>> {
    let Some(hhmm) = start else {
        return Ok(None);
    };
    let time = NaiveTime::parse_from_str(hhmm, "%H:%M").with_context(|| format!("Invalid start time '{hhmm}'"))?;
    Ok(Some(Local::now().date_naive().and_time(time)))
}

fn print_timeline(timeline: &BrewTimeline, start: Option<NaiveDateTime>) {
    let mut table = new_table();
    if start.is_some() {
        table.set_header(header(&["Elapsed", "When", "Step"]));
    } else {
        table.set_header(header(&["Elapsed", "Step"]));
    }

    for event in &timeline.events {
        let mut row = vec![Cell::new(display_duration(event.minutes, Some(2)))];
        if let Some(st) = start {
            let at = st + chrono::Duration::minutes(event.minutes.round() as i64);
            row.push(Cell::new(at.format("%a %d %b %H:%M")));
        }
        row.push(Cell::new(&event.instruction));
        table.add_row(row);
    }

    println!("\n=== Timeline ===");
    println!("{table}");
    println!(
        "- Boil:    {} → {}",
        display_duration(timeline.boil_start_time, Some(2)),
        display_duration(timeline.boil_end_time, Some(2))
    );
    println!("- Brew day: {}", display_duration(timeline.brew_day_duration, Some(2)));
    println!("- Total:    {}", display_duration(timeline.total_duration(), Some(2)));
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Calc { common, json } => {
            let recipe = load_recipe(&common)?;
            save_if_requested(&recipe, &common)?;
            let calc = recipe.calculate()?;
            if json {
                println!("{}", serde_json::to_string_pretty(calc.metrics())?);
            } else {
                print_metrics(&calc);
            }
        }
        Command::Timeline {
            common,
            imperial,
            start,
            primary,
            secondary,
            aging,
            brewhouse,
        } => {
            let mut recipe = load_recipe(&common)?;
            // CLI durations win over the recipe file
            if let Some(d) = primary.as_deref() {
                recipe.primary_days = parse_days(d)?;
            }
            if let Some(d) = secondary.as_deref() {
                recipe.secondary_days = parse_days(d)?;
            }
            if let Some(d) = aging.as_deref() {
                recipe.aging_days = parse_days(d)?;
            }
            save_if_requested(&recipe, &common)?;

            let config = match &brewhouse {
                Some(path) => {
                    let txt = fs::read_to_string(path)
                        .with_context(|| format!("Failed to read brewhouse profile: {}", path.display()))?;
                    serde_json::from_str::<BrewhouseConfig>(&txt)
                        .with_context(|| format!("Invalid brewhouse profile JSON: {}", path.display()))?
                }
                None => BrewhouseConfig::default(),
            };
            let units = if imperial { UnitSystem::Imperial } else { UnitSystem::Metric };
            let start = parse_start(start.as_deref())?;

            let calc = recipe.calculate()?;
            print_timeline(&calc.timeline_with(units, &config), start);
        }
        Command::Scale { common, batch, boil, out } => {
            let mut recipe = load_recipe(&common)?;
            let (old_batch, old_ibu) = (recipe.batch_size, recipe.calculate()?.metrics().ibu);
            recipe.scale(batch, boil)?;
            let new_ibu = recipe.calculate()?.metrics().ibu;
            save_if_requested(&recipe, &common)?;

            let summary = format!("Scaled {old_batch} l → {batch} l: {old_ibu:.1} IBU → {new_ibu:.1} IBU");
            match &out {
                Some(path) => {
                    write_recipe(&recipe, path)?;
                    println!("{summary}");
                    println!("Recipe saved to {}", path.display());
                }
                None => {
                    eprintln!("{summary}");
                    println!("{}", recipe.to_json_pretty()?);
                }
            }
        }
        Command::Grade { common } => {
            let recipe = load_recipe(&common)?;
            save_if_requested(&recipe, &common)?;
            println!("{}: grade {:.1} / 8.0", recipe.name, recipe.grade());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
