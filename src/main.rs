use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::PathBuf;
use todostore::{
    Config, NewTask, Priority, SortKey, SortOrder, Task, TaskDraft, TaskPatch, TaskQuery, TaskStore, validate_task,
};

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - to-do list with persistent local storage")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/todostore/config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage location, overriding the config
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List tasks, newest first unless sorted
    List {
        /// Only tasks not yet done
        #[arg(long, conflicts_with = "done")]
        pending: bool,
        /// Only completed tasks
        #[arg(long)]
        done: bool,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// createdAt, updatedAt, priority, title, description, category, completed
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: String,
    },

    /// Show one task
    Show { id: String },

    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Flip a task between done and pending
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Delete all tasks, or only completed ones
    Clear {
        #[arg(long)]
        completed: bool,
    },

    /// Search title, description and category
    Search { query: String },

    /// Show counts and completion rate
    Stats,

    /// Write all tasks as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load tasks from an export file
    Import {
        file: PathBuf,
        /// Keep existing tasks and add only unseen ids
        #[arg(long)]
        merge: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.storage.path = Some(path);
    }

    // Open store
    let mut store = TaskStore::from_config(&config)?;
    run(&mut store, cli.command)?;
    store.close()
}

fn run(store: &mut TaskStore, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            title,
            description,
            priority,
            category,
        } => {
            check(&TaskDraft {
                title: Some(title.as_str()),
                description: description.as_deref(),
                priority: priority.as_deref(),
            })?;
            let task = store.add_task(NewTask {
                title,
                description,
                priority: parse_priority(priority.as_deref())?,
                category,
            });
            println!("Added {}", task.id);
        }
        Commands::List {
            pending,
            done,
            priority,
            category,
            sort,
            order,
        } => {
            let mut query = TaskQuery::new();
            if pending || done {
                query = query.completed(done);
            }
            if let Some(priority) = parse_priority(priority.as_deref())? {
                query = query.priority(priority);
            }
            if let Some(category) = category {
                query = query.category(category);
            }
            if let Some(sort) = sort {
                query = query.sort(sort.parse::<SortKey>()?, order.parse::<SortOrder>()?);
            }
            print_tasks(&store.query(&query));
        }
        Commands::Show { id } => {
            let task = store.get_task(&id).ok_or_else(|| not_found(&id))?;
            print_detail(&task);
        }
        Commands::Edit {
            id,
            title,
            description,
            priority,
            category,
        } => {
            let existing = store.get_task(&id).ok_or_else(|| not_found(&id))?;
            check(&TaskDraft {
                title: Some(title.as_deref().unwrap_or(&existing.title)),
                description: description.as_deref(),
                priority: priority.as_deref(),
            })?;
            let patch = TaskPatch {
                title,
                description,
                priority: parse_priority(priority.as_deref())?,
                category,
                completed: None,
            };
            if patch.is_empty() {
                return Err(eyre!("Nothing to change"));
            }
            let task = store.update_task(&id, patch).ok_or_else(|| not_found(&id))?;
            print_detail(&task);
        }
        Commands::Toggle { id } => {
            let task = store.toggle_task(&id).ok_or_else(|| not_found(&id))?;
            print_tasks(std::slice::from_ref(&task));
        }
        Commands::Delete { id } => {
            if !store.delete_task(&id) {
                return Err(not_found(&id));
            }
            println!("Deleted {}", id);
        }
        Commands::Clear { completed } => {
            let before = store.len();
            if completed {
                store.clear_completed();
            } else {
                store.clear_all_tasks();
            }
            println!("Removed {} task(s)", before - store.len());
        }
        Commands::Search { query } => {
            print_tasks(&store.search_tasks(&query));
        }
        Commands::Stats => {
            let stats = store.get_stats();
            println!("{:>10} {}", "TOTAL".bold(), stats.total);
            println!("{:>10} {}", "PENDING".bold(), stats.pending);
            println!("{:>10} {}", "DONE".bold(), stats.completed);
            println!("{:>10} {}%", "RATE".bold(), stats.completion_rate);
            println!();
            println!("{}", "Pending by priority".bold());
            for priority in Priority::ALL.iter().rev() {
                println!("  {:<8} {}", paint(*priority), stats.priorities.get(*priority));
            }
            println!("{}", "By category".bold());
            for (category, count) in &stats.categories {
                println!("  {:<12} {}", category, count);
            }
        }
        Commands::Export { output } => {
            let json = store.export_tasks().to_json_pretty()?;
            match output {
                Some(path) => {
                    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Exported {} task(s) to {}", store.len(), path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Import { file, merge } => {
            let json = fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let before = store.len();
            if !store.import_json(&json, merge) {
                return Err(eyre!("Import failed: {} is not a valid task export", file.display()));
            }
            if merge {
                println!("Merged {} new task(s)", store.len() - before);
            } else {
                println!("Imported {} task(s)", store.len());
            }
        }
    }

    if store.is_dirty() {
        return Err(eyre!("Changes could not be saved to storage"));
    }
    Ok(())
}

fn check(draft: &TaskDraft<'_>) -> Result<()> {
    let validation = validate_task(draft);
    if validation.is_valid {
        Ok(())
    } else {
        Err(eyre!("{}", validation.errors.join("; ")))
    }
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>> {
    raw.map(str::parse::<Priority>).transpose()
}

fn not_found(id: &str) -> eyre::Report {
    eyre!("No task with id {}", id)
}

fn paint(priority: Priority) -> ColoredString {
    let label = priority.as_str().to_uppercase();
    match priority {
        Priority::High => label.black().on_red(),
        Priority::Medium => label.black().on_yellow(),
        Priority::Low => label.black().on_green(),
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{}", "No tasks".dimmed());
        return;
    }
    for task in tasks {
        let check = if task.completed { "[x]" } else { "[ ]" };
        let title = if task.completed {
            task.title.strikethrough().dimmed()
        } else {
            task.title.bold()
        };
        println!("{} {} {:<8} {} ({})", check, task.id.dimmed(), paint(task.priority), title, task.category);
    }
}

fn print_detail(task: &Task) {
    println!("{:>12} {}", "id".bold(), task.id);
    println!("{:>12} {}", "title".bold(), task.title);
    if !task.description.is_empty() {
        println!("{:>12} {}", "description".bold(), task.description);
    }
    println!("{:>12} {}", "priority".bold(), paint(task.priority));
    println!("{:>12} {}", "category".bold(), task.category);
    println!("{:>12} {}", "completed".bold(), task.completed);
    println!("{:>12} {}", "created".bold(), task.created_at.to_rfc3339());
    println!("{:>12} {}", "updated".bold(), task.updated_at.to_rfc3339());
}
