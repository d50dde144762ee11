use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mothercore_core::commands::mothercore_root;
use mothercore_core::services::MemoryItem;
use mothercore_core::MotherCore;

#[derive(Parser)]
#[command(
    name = "mothercore",
    version,
    about = "One-shot front end for the MotherCore deliberation core"
)]
struct Cli {
    /// Data directory (defaults to $MOTHERCORE_ROOT, then ./.mothercore)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run one dialogue turn
    Say {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Propose a reversible-first plan for a goal
    Plan {
        #[arg(required = true, num_args = 1..)]
        goal: Vec<String>,
    },
    /// Run the oversight gate on a previously proposed plan
    Approve {
        plan_id: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Search memory by token overlap
    Mem {
        query: String,
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Store a reusable fact as a semantic memory
    Remember {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value_t = 0.5)]
        importance: f64,
    },
    /// Show the newest memories
    Recent {
        #[arg(short, long, default_value_t = 5)]
        k: usize,
    },
    /// List registered skills
    Skills,
    /// Show the active constitution in priority order
    Constitution,
    Pause,
    Resume,
    /// Graceful, value-neutral shutdown
    Shutdown,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root.clone().unwrap_or_else(mothercore_root);
    tracing::debug!(root = %root.display(), "opening core");
    let mut core = MotherCore::open(&root)
        .with_context(|| format!("opening MotherCore at {}", root.display()))?;

    match cli.cmd {
        Cmd::Say { text } => say(&mut core, &text.join(" "), cli.json),
        Cmd::Plan { goal } => plan(&mut core, &goal.join(" "), cli.json),
        Cmd::Approve { plan_id, token } => approve(&mut core, &plan_id, token.as_deref(), cli.json),
        Cmd::Mem { query, k, tags } => mem(&core, &query, k, &tags, cli.json),
        Cmd::Remember { text, tags, importance } => {
            let id = core.remember_fact(&text.join(" "), tags, importance)?;
            println!("Stored semantic memory {id}");
            Ok(())
        }
        Cmd::Recent { k } => {
            let items = core.memory().recent(k)?;
            print_items("Recent memories:", &items, cli.json)
        }
        Cmd::Skills => {
            for name in core.skills().list() {
                println!("{name}");
            }
            Ok(())
        }
        Cmd::Constitution => {
            let cons = core.guardian().constitution();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(cons)?);
                return Ok(());
            }
            for p in &cons.principles {
                let rank = cons.priority_of(&p.id).unwrap_or_default() + 1;
                println!("{rank}. [{}] {} (weight={})", p.id, p.text, p.weight);
            }
            let t = &cons.risk_thresholds;
            println!(
                "thresholds: LOW={} MEDIUM={} HIGH={} BLOCK={}; oversight at >= {}",
                t.low, t.medium, t.high, t.block, cons.oversight_required_above
            );
            Ok(())
        }
        Cmd::Pause => {
            println!("{}", core.pause()?);
            Ok(())
        }
        Cmd::Resume => {
            println!("{}", core.resume()?);
            Ok(())
        }
        Cmd::Shutdown => {
            println!("{}", core.shutdown()?);
            Ok(())
        }
    }
}

fn say(core: &mut MotherCore, text: &str, json: bool) -> Result<()> {
    let reply = core.act(text)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }
    println!("{}>", core.name());
    println!("{}", reply.text);
    if reply.risk.level.is_blocking() {
        println!("\n[Boundary] I’m not proceeding further on this path. Let’s reframe safely.");
    }
    Ok(())
}

fn plan(core: &mut MotherCore, goal: &str, json: bool) -> Result<()> {
    let plan = core.propose_plan(goal)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    println!("Proposed plan {} for goal: {}", plan.id, plan.goal);
    println!(
        "Risk: {} ({:.2})  factors=[{}]",
        plan.risk.level,
        plan.risk.score,
        plan.risk.factors.join(", ")
    );
    for (i, st) in plan.steps.iter().enumerate() {
        println!(
            "  {}. {} | reversible={} | oversight={}",
            i + 1,
            st.description,
            st.reversible,
            st.oversight_needed
        );
    }
    if core.requires_oversight(&plan) {
        println!("Approval needs an oversight token: mothercore approve {} --token <T>", plan.id);
    }
    Ok(())
}

fn approve(core: &mut MotherCore, plan_id: &str, token: Option<&str>, json: bool) -> Result<()> {
    let plan = core.load_plan(plan_id)?;
    let plan = core.approve_plan(plan, token)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("Plan {} approved={}", plan.id, plan.approved);
    }
    Ok(())
}

fn mem(core: &MotherCore, query: &str, k: Option<usize>, tags: &[String], json: bool) -> Result<()> {
    let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
    let hits = match k {
        Some(k) => core.memory().search(query, k, &tags)?,
        None => core.recall(query, &tags)?,
    };
    print_items("Memory hits:", &hits, json)
}

fn print_items(title: &str, items: &[&MemoryItem], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }
    println!("{title}");
    for m in items {
        let head: String = m.content.chars().take(100).collect();
        let tags: Vec<&str> = m.tags.iter().map(String::as_str).collect();
        println!(
            "  - [{}] {}…  (tags=[{}], imp={})",
            m.kind,
            head,
            tags.join(", "),
            m.importance
        );
    }
    Ok(())
}
