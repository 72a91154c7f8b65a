//! Ember CLI - daily engagement, streaks, and achievements.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use ember_core::{Notification, NotificationKind, Time, UserId};
use ember_engagement::{BasicEngagementManager, EngagementError, EngagementManager};
use ember_engine::{CategoryCounters, EngineError};
use ember_storage::{JsonStore, Store};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Daily engagement streaks and achievements", long_about = None)]
struct Cli {
    /// User to operate on
    #[arg(long, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

/// Progress tallies the app would normally supply.
#[derive(Args, Default)]
struct CounterArgs {
    /// Completed meditations
    #[arg(long, default_value = "0")]
    meditations: u32,

    /// Journal entries written
    #[arg(long, default_value = "0")]
    journal_entries: u32,

    /// Community interactions
    #[arg(long, default_value = "0")]
    community: u32,
}

impl From<CounterArgs> for CategoryCounters {
    fn from(args: CounterArgs) -> Self {
        Self {
            meditations: args.meditations,
            journal_entries: args.journal_entries,
            community_interactions: args.community,
            special: 0,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record today's check-in
    CheckIn {
        #[command(flatten)]
        counters: CounterArgs,
    },
    /// Override the streak start date (YYYY-MM-DD)
    SetStart {
        /// First day of the streak
        date: String,
    },
    /// Show level, XP, and streak
    Status,
    /// Show today's task checklist
    Tasks,
    /// Toggle a task's completion
    Toggle {
        /// Task ID (see `tasks`)
        id: String,
    },
    /// Evaluate and list achievements
    Achievements {
        #[command(flatten)]
        counters: CounterArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let user = UserId::new(cli.user);
    let now: Time = Utc::now();

    let store = JsonStore::new(".ember").await?;
    let manager = BasicEngagementManager::new(store);

    match cli.command {
        Commands::CheckIn { counters } => {
            let outcome = manager.check_in(&user, now, counters.into()).await?;
            render(&outcome.notifications);
            println!(
                "Level {} | {} XP | {} day streak",
                outcome.level, outcome.profile.xp, outcome.profile.streak_days
            );
        }
        Commands::SetStart { date } => {
            let Some(start) = parse_day(&date) else {
                render(&[validation(format!("'{}' is not a valid date", date), now)]);
                return Ok(());
            };
            match manager.set_streak_start(&user, start, now).await {
                Ok(outcome) => {
                    println!(
                        "Streak start updated: now on a {} day streak.",
                        outcome.profile.streak_days
                    );
                }
                Err(EngagementError::Validation(EngineError::InvalidDate(message))) => {
                    render(&[validation(message, now)]);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Status => {
            let outcome = manager.status(&user, now).await?;
            println!("User: {}", outcome.profile.id);
            println!("  Level: {}", outcome.level);
            println!("  XP: {}", outcome.profile.xp);
            println!("  Progress to next level: {:.0}%", outcome.level_progress.min(100.0));
            println!("  Streak: {} days", outcome.profile.streak_days);
            match outcome.profile.last_check_in {
                Some(t) => println!("  Last check-in: {}", t.date_naive()),
                None => println!("  Last check-in: never"),
            }
        }
        Commands::Tasks => {
            let outcome = manager.daily_tasks(&user, now).await?;
            println!(
                "Daily tasks ({:.0}% complete)",
                outcome.tasks.completion_percent()
            );
            for task in &outcome.tasks.tasks {
                let mark = if task.completed { "x" } else { " " };
                println!("  [{}] {} - {}", mark, task.id, task.title);
            }
        }
        Commands::Toggle { id } => match manager.toggle_task(&user, &id, now).await {
            Ok(outcome) => {
                render(&outcome.notifications);
                println!(
                    "{:.0}% of today's tasks complete.",
                    outcome.tasks.completion_percent()
                );
            }
            Err(EngagementError::Validation(EngineError::TaskNotFound(id))) => {
                render(&[validation(format!("no task named '{}'", id), now)]);
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Achievements { counters } => {
            let outcome = manager
                .evaluate_achievements(&user, now, counters.into())
                .await?;
            render(&outcome.notifications);

            let store = manager.store();
            let store = store.lock().await;
            let set = match store.load_achievements(&user).await? {
                Some(set) => set,
                None => ember_core::catalog::default_achievements(),
            };
            println!("Achievements ({} XP earned)", set.unlocked_xp());
            for a in &set.achievements {
                if a.unlocked {
                    println!("  [unlocked] {} (+{} XP)", a.title, a.xp);
                } else {
                    println!("  [{}/{}] {} - {}", a.progress, a.requirement, a.title, a.description);
                }
            }
        }
    }

    Ok(())
}

/// Parse a YYYY-MM-DD day into a UTC midnight timestamp.
fn parse_day(s: &str) -> Option<Time> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn validation(message: String, now: Time) -> Notification {
    Notification::new(NotificationKind::ValidationError { message }, now)
}

/// Render notification events as terminal lines.
fn render(notifications: &[Notification]) {
    use ember_core::CheckInStatus;

    for notification in notifications {
        match &notification.kind {
            NotificationKind::CheckIn {
                status,
                streak_days,
            } => match status {
                CheckInStatus::AlreadyCheckedIn => {
                    println!("You've already checked in today. Come back tomorrow!");
                }
                CheckInStatus::Continued => {
                    println!("Streak updated! You're now on a {} day streak.", streak_days);
                }
                CheckInStatus::Reset => {
                    println!("New streak started. Day 1 - keep going!");
                }
            },
            NotificationKind::AchievementUnlocked { achievement } => {
                println!(
                    "Achievement unlocked: {} (+{} XP) - {}",
                    achievement.title, achievement.xp, achievement.description
                );
            }
            NotificationKind::TasksCompleted => {
                println!("Daily tasks completed! Great job finishing everything today.");
            }
            NotificationKind::ValidationError { message } => {
                println!("Error: {}", message);
            }
        }
    }
}
