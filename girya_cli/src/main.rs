use clap::{Args, Parser, Subcommand};
use girya_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "girya")]
#[command(about = "Kettlebell training decision engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seed for deterministic exercise selection
    #[arg(long, global = true)]
    seed: Option<u64>,
}

/// Daily check-in answers; anything missing is asked for interactively
///
/// Check-in flags may be repeated; the last occurrence wins.
#[derive(Args)]
struct CheckIn {
    /// How you feel today (bad, ok, great)
    #[arg(long, overrides_with = "feeling")]
    feeling: Option<String>,

    /// Last night's sleep (bad, good)
    #[arg(long, overrides_with = "sleep")]
    sleep: Option<String>,

    /// Any pain right now (none, present)
    #[arg(long, overrides_with = "pain")]
    pain: Option<String>,

    /// Minutes available (20-30, 30-45, 45-60)
    #[arg(long, overrides_with = "time")]
    time: Option<String>,

    /// Equipment context (home, minimal, bodyweight)
    #[arg(long, overrides_with = "equipment")]
    equipment: Option<String>,

    /// Force the priority bucket for this session (squat, pull, hinge, push)
    #[arg(long, overrides_with = "focus")]
    focus: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan today's session from the daily check-in (default)
    Plan {
        #[command(flatten)]
        check_in: CheckIn,

        /// Show the session without logging it
        #[arg(long, conflicts_with_all = ["no_prompt", "auto_complete"])]
        preview: bool,

        /// Log the session and exit without prompting
        #[arg(long)]
        no_prompt: bool,

        /// Complete the session immediately with the given feedback (good, not_good)
        #[arg(long, value_name = "FEEDBACK", conflicts_with = "no_prompt")]
        auto_complete: Option<String>,
    },

    /// Replace the newest pending session with a fresh roll
    Reroll {
        #[command(flatten)]
        check_in: CheckIn,

        /// Recompute day type and priority instead of preserving them
        #[arg(long)]
        fresh: bool,
    },

    /// Swap one exercise in a pending session for an alternative
    Swap {
        /// Exercise id to replace
        #[arg(long)]
        exercise: String,

        /// Session id (defaults to the newest pending session)
        #[arg(long)]
        session: Option<String>,

        /// Equipment context for the replacement (defaults to the session's)
        #[arg(long)]
        equipment: Option<String>,
    },

    /// Complete a session and fold it into state
    Complete {
        /// How the session felt (good, not_good)
        feedback: String,

        /// Session id (defaults to the newest pending session)
        #[arg(long)]
        session: Option<String>,
    },

    /// Show persistent user state
    State,

    /// Show or change engine settings
    Settings {
        /// Week emphasis (A, B)
        #[arg(long)]
        week_mode: Option<String>,

        /// Power cadence (weekly, fortnightly)
        #[arg(long)]
        power_frequency: Option<String>,

        /// Let hard/medium days through an active cooldown (true, false)
        #[arg(long)]
        cooldown_override: Option<bool>,
    },

    /// Show or update strength benchmarks
    Benchmarks {
        /// Available bell weights in kg, comma separated (e.g. 16,24,32)
        #[arg(long)]
        bells: Option<String>,

        /// Press benchmark bell (kg)
        #[arg(long)]
        press_bell: Option<u32>,

        /// Press benchmark reps
        #[arg(long)]
        press_reps: Option<u32>,

        /// Max strict pushups
        #[arg(long)]
        pushup_max: Option<u32>,

        /// Max strict pullups
        #[arg(long)]
        pullup_max: Option<u32>,

        /// Hinge benchmark bell (kg)
        #[arg(long)]
        hinge_bell: Option<u32>,

        /// Hinge benchmark reps
        #[arg(long)]
        hinge_reps: Option<u32>,

        /// Front squat benchmark bells in kg, comma separated
        #[arg(long)]
        front_squat_bells: Option<String>,

        /// Front squat benchmark reps
        #[arg(long)]
        front_squat_reps: Option<u32>,
    },

    /// List recent completed sessions
    History {
        /// Maximum entries to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Roll up WAL sessions to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    girya_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let service = match cli.data_dir {
        Some(dir) => Service::with_data_dir(&config, dir),
        None => Service::new(&config),
    };

    // The built-in library is code, so a validation failure is a build
    // problem; surface it before any command runs
    let errors = get_default_library().validate();
    if !errors.is_empty() {
        eprintln!("Library validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::LibraryValidation("Invalid library".into()));
    }

    match cli.command {
        Some(Commands::Plan {
            check_in,
            preview,
            no_prompt,
            auto_complete,
        }) => cmd_plan(&service, check_in, preview, no_prompt, auto_complete, cli.seed),
        Some(Commands::Reroll { check_in, fresh }) => {
            cmd_reroll(&service, check_in, fresh, cli.seed)
        }
        Some(Commands::Swap {
            exercise,
            session,
            equipment,
        }) => cmd_swap(&service, &exercise, session, equipment, cli.seed),
        Some(Commands::Complete { feedback, session }) => {
            cmd_complete(&service, &feedback, session)
        }
        Some(Commands::State) => cmd_state(&service),
        Some(Commands::Settings {
            week_mode,
            power_frequency,
            cooldown_override,
        }) => cmd_settings(&service, week_mode, power_frequency, cooldown_override),
        Some(Commands::Benchmarks {
            bells,
            press_bell,
            press_reps,
            pushup_max,
            pullup_max,
            hinge_bell,
            hinge_reps,
            front_squat_bells,
            front_squat_reps,
        }) => cmd_benchmarks(
            &service,
            BenchmarkFlags {
                bells,
                press_bell,
                press_reps,
                pushup_max,
                pullup_max,
                hinge_bell,
                hinge_reps,
                front_squat_bells,
                front_squat_reps,
            },
        ),
        Some(Commands::History { limit }) => cmd_history(&service, limit),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&service, cleanup),
        None => {
            // Default to "plan" with an interactive check-in
            let check_in = CheckIn {
                feeling: None,
                sleep: None,
                pain: None,
                time: None,
                equipment: None,
                focus: None,
            };
            cmd_plan(&service, check_in, false, false, None, cli.seed)
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_plan(
    service: &Service,
    check_in: CheckIn,
    preview: bool,
    no_prompt: bool,
    auto_complete: Option<String>,
    seed: Option<u64>,
) -> Result<()> {
    let auto_feedback = auto_complete
        .as_deref()
        .map(|s| s.parse::<Feedback>())
        .transpose()?;
    let questionnaire = resolve_questionnaire(&check_in)?;
    let mut rng = make_rng(seed);

    if preview {
        let generated = service.preview(&questionnaire, &mut rng)?;
        display_session(&generated.session);
        println!("\n[Preview - session not logged]");
        return Ok(());
    }

    let mut generated = service.generate(&questionnaire, &mut rng)?;

    loop {
        display_session(&generated.session);
        if generated.decision.triggered {
            println!("  Note: real trigger reported, easy day enforced and cooldown armed\n");
        }

        let action = if let Some(feedback) = auto_feedback {
            PlanAction::Complete(feedback)
        } else if no_prompt {
            PlanAction::Keep
        } else {
            prompt_plan_action()?
        };

        match action {
            PlanAction::Keep => {
                println!("\n✓ Session saved.");
                println!(
                    "  Complete it with: girya complete good --session {}",
                    generated.session.id
                );
                break;
            }
            PlanAction::Complete(feedback) => {
                let (_, state) = service.complete(generated.session.id, feedback)?;
                println!("\n✓ Session completed ({})", feedback);
                println!("  Next priority: {}", state.next_priority_bucket);
                if state.cooldown_counter > 0 {
                    println!(
                        "  Cooldown: {} easy session(s) ahead",
                        state.cooldown_counter
                    );
                }
                break;
            }
            PlanAction::Reroll => {
                generated = service.reroll(&questionnaire, true, true, &mut rng)?;
                println!("\nRerolled.\n");
                continue;
            }
        }
    }

    Ok(())
}

fn cmd_reroll(service: &Service, check_in: CheckIn, fresh: bool, seed: Option<u64>) -> Result<()> {
    let questionnaire = resolve_questionnaire(&check_in)?;
    let mut rng = make_rng(seed);

    let generated = service.reroll(&questionnaire, !fresh, !fresh, &mut rng)?;
    display_session(&generated.session);
    println!("\n✓ Session saved.");
    println!(
        "  Complete it with: girya complete good --session {}",
        generated.session.id
    );

    Ok(())
}

fn cmd_swap(
    service: &Service,
    exercise: &str,
    session: Option<String>,
    equipment: Option<String>,
    seed: Option<u64>,
) -> Result<()> {
    let equipment = equipment
        .as_deref()
        .map(|s| s.parse::<Equipment>())
        .transpose()?;
    let session_id = resolve_session_id(service, session)?;
    let mut rng = make_rng(seed);

    let (updated, replacement) = service.swap(session_id, exercise, equipment, &mut rng)?;

    println!("✓ Swapped {} for {}", exercise, replacement.name);
    display_session(&updated);

    Ok(())
}

fn cmd_complete(service: &Service, feedback: &str, session: Option<String>) -> Result<()> {
    let feedback: Feedback = feedback.parse()?;
    let session_id = resolve_session_id(service, session)?;

    let (record, state) = service.complete(session_id, feedback)?;

    println!("✓ Completed session {}", record.id);
    println!("  Feedback: {}", feedback);
    println!("  Next priority: {}", state.next_priority_bucket);
    if state.cooldown_counter > 0 {
        println!(
            "  Cooldown: {} easy session(s) ahead",
            state.cooldown_counter
        );
    }

    Ok(())
}

fn cmd_state(service: &Service) -> Result<()> {
    let state = service.state()?;

    println!("╭─────────────────────────────────────────╮");
    println!("│  USER STATE");
    println!("╰─────────────────────────────────────────╯");
    println!("  Next priority:     {}", state.next_priority_bucket);
    println!(
        "  Week mode:         {} (since {})",
        state.week_mode,
        state.week_mode_last_changed.format("%Y-%m-%d")
    );
    println!("  Cooldown:          {} session(s)", state.cooldown_counter);
    println!("  Cooldown override: {}", state.cooldown_override);
    println!("  Power frequency:   {}", state.power_frequency);
    match state.power_last_used {
        Some(at) => println!("  Power last used:   {}", at.format("%Y-%m-%d")),
        None => println!("  Power last used:   never"),
    }
    println!("  Last day was hard: {}", state.last_hard_day);
    if state.last_session_exercises.is_empty() {
        println!("  Last session:      none yet");
    } else {
        println!(
            "  Last session:      {}",
            state.last_session_exercises.join(", ")
        );
    }

    Ok(())
}

fn cmd_settings(
    service: &Service,
    week_mode: Option<String>,
    power_frequency: Option<String>,
    cooldown_override: Option<bool>,
) -> Result<()> {
    if week_mode.is_none() && power_frequency.is_none() && cooldown_override.is_none() {
        let state = service.state()?;
        println!("Settings:");
        println!("  week_mode:         {}", state.week_mode);
        println!("  power_frequency:   {}", state.power_frequency);
        println!("  cooldown_override: {}", state.cooldown_override);
        return Ok(());
    }

    let update = SettingsUpdate {
        week_mode: week_mode.as_deref().map(|s| s.parse()).transpose()?,
        power_frequency: power_frequency.as_deref().map(|s| s.parse()).transpose()?,
        cooldown_override,
    };
    let state = service.update_settings(&update)?;

    println!("✓ Settings updated");
    println!("  week_mode:         {}", state.week_mode);
    println!("  power_frequency:   {}", state.power_frequency);
    println!("  cooldown_override: {}", state.cooldown_override);

    Ok(())
}

struct BenchmarkFlags {
    bells: Option<String>,
    press_bell: Option<u32>,
    press_reps: Option<u32>,
    pushup_max: Option<u32>,
    pullup_max: Option<u32>,
    hinge_bell: Option<u32>,
    hinge_reps: Option<u32>,
    front_squat_bells: Option<String>,
    front_squat_reps: Option<u32>,
}

impl BenchmarkFlags {
    fn is_empty(&self) -> bool {
        self.bells.is_none()
            && self.press_bell.is_none()
            && self.press_reps.is_none()
            && self.pushup_max.is_none()
            && self.pullup_max.is_none()
            && self.hinge_bell.is_none()
            && self.hinge_reps.is_none()
            && self.front_squat_bells.is_none()
            && self.front_squat_reps.is_none()
    }
}

fn cmd_benchmarks(service: &Service, flags: BenchmarkFlags) -> Result<()> {
    let mut benchmarks = service.benchmarks()?;

    if flags.is_empty() {
        display_benchmarks(&benchmarks);
        return Ok(());
    }

    if let Some(ref bells) = flags.bells {
        benchmarks.available_bells_kg = parse_weights(bells)?;
    }
    if let Some(ref bells) = flags.front_squat_bells {
        benchmarks.front_squat_bells_kg = Some(parse_weights(bells)?);
    }
    if flags.press_bell.is_some() {
        benchmarks.press_bell_kg = flags.press_bell;
    }
    if flags.press_reps.is_some() {
        benchmarks.press_reps = flags.press_reps;
    }
    if flags.pushup_max.is_some() {
        benchmarks.pushup_max = flags.pushup_max;
    }
    if flags.pullup_max.is_some() {
        benchmarks.pullup_max = flags.pullup_max;
    }
    if flags.hinge_bell.is_some() {
        benchmarks.hinge_bell_kg = flags.hinge_bell;
    }
    if flags.hinge_reps.is_some() {
        benchmarks.hinge_reps = flags.hinge_reps;
    }
    if flags.front_squat_reps.is_some() {
        benchmarks.front_squat_reps = flags.front_squat_reps;
    }

    service.save_benchmarks(&benchmarks)?;
    println!("✓ Benchmarks updated");
    display_benchmarks(&benchmarks);

    Ok(())
}

fn cmd_history(service: &Service, limit: usize) -> Result<()> {
    let entries = service.history(limit)?;

    if entries.is_empty() {
        println!("No completed sessions yet.");
        return Ok(());
    }

    println!("Recent sessions:");
    for entry in &entries {
        let when = entry.completed_at.unwrap_or(entry.timestamp);
        let feedback = entry
            .feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "  {}  {:<6} {:<5} priority  {} exercise(s)  felt {}",
            when.format("%Y-%m-%d %H:%M"),
            entry.day_type.to_string(),
            entry.priority_bucket.to_string(),
            entry.exercise_ids.len(),
            feedback
        );
    }

    Ok(())
}

fn cmd_rollup(service: &Service, cleanup: bool) -> Result<()> {
    if !service.wal_path().exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let (count, cleaned) = service.rollup(cleanup)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", service.csv_path().display());

    if cleaned > 0 {
        println!("✓ Cleaned up {} processed WAL files", cleaned);
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn resolve_session_id(service: &Service, explicit: Option<String>) -> Result<Uuid> {
    match explicit {
        Some(raw) => Uuid::parse_str(raw.trim())
            .map_err(|e| Error::Validation(format!("invalid session id '{}': {}", raw, e))),
        None => service
            .latest_pending()?
            .map(|s| s.id)
            .ok_or_else(|| Error::Validation("no pending session; run 'girya plan' first".into())),
    }
}

fn parse_weights(input: &str) -> Result<Vec<u32>> {
    input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| Error::Validation(format!("invalid bell weight '{}': {}", part, e)))
        })
        .collect()
}

/// Build the questionnaire from flags, prompting for whatever is missing
fn resolve_questionnaire(check_in: &CheckIn) -> Result<Questionnaire> {
    let feeling = match check_in.feeling.as_deref() {
        Some(s) => s.parse()?,
        None => prompt_parse("How do you feel today?", "bad/ok/great", "ok")?,
    };
    let sleep = match check_in.sleep.as_deref() {
        Some(s) => s.parse()?,
        None => prompt_parse("How was your sleep?", "bad/good", "good")?,
    };
    let pain = match check_in.pain.as_deref() {
        Some(s) => s.parse()?,
        None => prompt_parse("Any pain right now?", "none/present", "none")?,
    };
    let time_available = match check_in.time.as_deref() {
        Some(s) => s.parse()?,
        None => prompt_parse("Minutes available?", "20-30/30-45/45-60", "30-45")?,
    };
    let equipment = match check_in.equipment.as_deref() {
        Some(s) => s.parse()?,
        None => prompt_parse("Equipment today?", "home/minimal/bodyweight", "home")?,
    };
    let override_bucket = check_in
        .focus
        .as_deref()
        .map(|s| s.parse::<Bucket>())
        .transpose()?;

    Ok(Questionnaire {
        feeling,
        sleep,
        pain,
        time_available,
        equipment,
        override_bucket,
    })
}

fn prompt_parse<T>(question: &str, options: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    loop {
        print!("  {} [{}] ({}): ", question, options, default);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let trimmed = input.trim();
        let candidate = if trimmed.is_empty() { default } else { trimmed };

        match candidate.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => println!("  {}", e),
        }
    }
}

enum PlanAction {
    Keep,
    Complete(Feedback),
    Reroll,
}

fn prompt_plan_action() -> Result<PlanAction> {
    println!("─────────────────────────────────────────");
    println!("Press Enter to keep this session for later");
    println!("  'c' + Enter to complete it (felt good)");
    println!("  'n' + Enter to complete it (not good)");
    println!("  'r' + Enter to reroll");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let action = match input.trim().to_lowercase().as_str() {
        "c" => PlanAction::Complete(Feedback::Good),
        "n" => PlanAction::Complete(Feedback::NotGood),
        "r" => PlanAction::Reroll,
        _ => PlanAction::Keep,
    };

    Ok(action)
}

fn display_session(session: &Session) {
    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  {} DAY · {} PRIORITY",
        session.day_type.to_string().to_uppercase(),
        session.priority_bucket.to_string().to_uppercase()
    );
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Session {} · {} min · {} · week {}",
        session.id, session.time_slot, session.equipment, session.week_mode
    );
    println!();

    for (i, exercise) in session.exercises.iter().enumerate() {
        let note = exercise
            .note
            .as_ref()
            .map(|n| format!("  [{}]", n))
            .unwrap_or_default();
        println!("  {}. {}{}", i + 1, exercise.name, note);
        println!("     {} · {}", exercise.protocol, exercise.load_level);
        println!(
            "     {} sets x {} {} · rest {}",
            exercise.sets,
            exercise.volume.value(),
            exercise.volume.label(),
            exercise.rest
        );
        if let Some(ref tempo) = exercise.tempo {
            println!("     Tempo: {}", tempo);
        }
        println!("     {}", exercise.description);
        println!();
    }
}

fn display_benchmarks(benchmarks: &Benchmarks) {
    let fmt_opt = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
    let fmt_list = |v: &[u32]| {
        v.iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("Benchmarks:");
    println!(
        "  Available bells:   {} kg",
        fmt_list(&benchmarks.available_bells_kg)
    );
    println!(
        "  Press:             {} kg x {}",
        fmt_opt(benchmarks.press_bell_kg),
        fmt_opt(benchmarks.press_reps)
    );
    println!("  Pushup max:        {}", fmt_opt(benchmarks.pushup_max));
    println!("  Pullup max:        {}", fmt_opt(benchmarks.pullup_max));
    println!(
        "  Hinge:             {} kg x {}",
        fmt_opt(benchmarks.hinge_bell_kg),
        fmt_opt(benchmarks.hinge_reps)
    );
    match benchmarks.front_squat_bells_kg {
        Some(ref bells) => println!(
            "  Front squat:       {} kg x {}",
            fmt_list(bells),
            fmt_opt(benchmarks.front_squat_reps)
        ),
        None => println!(
            "  Front squat:       - x {}",
            fmt_opt(benchmarks.front_squat_reps)
        ),
    }
}
